use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use skyfare_core::booking::BookingError;
use skyfare_core::contact::ContactError;
use skyfare_core::{FieldErrors, StoreError};

#[derive(Debug)]
pub enum ApiError {
    Authentication(String),
    Authorization(String),
    Validation(FieldErrors),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.push(field, message);
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Authentication(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": msg }),
            ),
            ApiError::Authorization(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Please correct the errors below.", "errors": errors.0 }),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("Not found".to_string()),
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Backend(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::FlightNotFound => ApiError::NotFound("Flight not found".to_string()),
            BookingError::Validation(errors) => ApiError::Validation(errors),
            BookingError::Store(e) => e.into(),
        }
    }
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Validation(errors) => ApiError::Validation(errors),
            ContactError::Store(e) => e.into(),
        }
    }
}
