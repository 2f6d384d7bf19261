use axum::{
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use skyfare_core::models::{
    Airport, Booking, ContactSubmission, NewAirport, NewFlight, Passenger,
};
use skyfare_core::repository::BookingFilter;
use skyfare_core::{FieldErrors, StoreError};

use crate::auth::require_admin;
use crate::error::ApiError;
use crate::flights::FlightView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SearchParams {
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlightListParams {
    origin: Option<String>,
    destination: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BookingListParams {
    flight_id: Option<Uuid>,
    user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct SubmissionListParams {
    is_resolved: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ResolvePatch {
    is_resolved: bool,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/airports/", get(list_airports).post(create_airport))
        .route("/admin/flights/", get(list_flights).post(create_flight))
        .route("/admin/passengers/", get(list_passengers))
        .route("/admin/bookings/", get(list_bookings))
        .route("/admin/contact-submissions/", get(list_submissions))
        .route(
            "/admin/contact-submissions/{id}/",
            patch(resolve_submission),
        )
        .route_layer(from_fn_with_state(state, require_admin))
}

async fn list_airports(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Airport>>, ApiError> {
    Ok(Json(
        state
            .flights
            .list_airports(params.search.as_deref())
            .await?,
    ))
}

async fn create_airport(
    State(state): State<AppState>,
    Json(req): Json<NewAirport>,
) -> Result<Json<Airport>, ApiError> {
    if req.code.trim().is_empty() {
        return Err(ApiError::field("code", "This field is required."));
    }
    let airport = state
        .flights
        .create_airport(&NewAirport {
            code: req.code.trim().to_uppercase(),
            ..req
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                ApiError::field("code", "An airport with that code already exists.")
            }
            other => other.into(),
        })?;
    Ok(Json(airport))
}

async fn list_flights(
    State(state): State<AppState>,
    Query(params): Query<FlightListParams>,
) -> Result<Json<Vec<FlightView>>, ApiError> {
    let flights = state
        .flights
        .list_flights(params.origin.as_deref(), params.destination.as_deref())
        .await?;
    Ok(Json(
        flights
            .iter()
            .map(|f| FlightView::from_flight(f, &state.company.currency))
            .collect(),
    ))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<NewFlight>,
) -> Result<Json<FlightView>, ApiError> {
    let mut errors = FieldErrors::new();
    if req.number.trim().is_empty() {
        errors.push("number", "This field is required.");
    }
    if req.arrival_time <= req.departure_time {
        errors.push("arrival_time", "Arrival must be after departure.");
    }
    if req.price_cents < 0 {
        errors.push("price_cents", "Price must not be negative.");
    }
    if req.seat_capacity < 0 {
        errors.push("seat_capacity", "Seat capacity must not be negative.");
    }
    errors.into_result().map_err(ApiError::Validation)?;

    let flight = state.flights.create_flight(&req).await.map_err(|e| match e {
        StoreError::NotFound => ApiError::field("origin_code", "Unknown airport code."),
        other => other.into(),
    })?;
    Ok(Json(FlightView::from_flight(
        &flight,
        &state.company.currency,
    )))
}

async fn list_passengers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Passenger>>, ApiError> {
    Ok(Json(
        state
            .bookings
            .list_passengers(params.search.as_deref())
            .await?,
    ))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let filter = BookingFilter {
        flight_id: params.flight_id,
        user_id: params.user_id,
    };
    Ok(Json(state.bookings.list_bookings(&filter).await?))
}

async fn list_submissions(
    State(state): State<AppState>,
    Query(params): Query<SubmissionListParams>,
) -> Result<Json<Vec<ContactSubmission>>, ApiError> {
    Ok(Json(
        state.contacts.list_submissions(params.is_resolved).await?,
    ))
}

async fn resolve_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ResolvePatch>,
) -> Result<Json<ContactSubmission>, ApiError> {
    let submission = state
        .contacts
        .set_resolved(id, body.is_resolved)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("Submission not found".to_string()),
            other => other.into(),
        })?;
    Ok(Json(submission))
}
