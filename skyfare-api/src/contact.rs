use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use skyfare_core::contact::{submit_contact, ContactRequest};
use skyfare_notify::{send_contact_notification, ContactNotification};

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contact/", get(contact_info).post(submit))
        .route("/contact/success/", get(contact_success))
}

async fn contact_info(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "company": state.company.name,
        "address": state.company.address,
        "support_email": state.company.support_email,
        "support_phone": state.company.support_phone,
    }))
}

async fn submit(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let submission = submit_contact(state.contacts.as_ref(), &req, Utc::now()).await?;

    // The submission is stored; the support email is best-effort and its
    // outcome is not reflected in the response.
    let notification = ContactNotification {
        sender_name: submission.name.clone(),
        sender_email: submission.email.clone(),
        subject: submission.subject.clone(),
        message: submission.message.clone(),
    };
    send_contact_notification(
        state.mailer.as_ref(),
        &state.company.support_email,
        &notification,
    )
    .await;

    Ok(Json(json!({
        "submission_id": submission.id,
        "detail": format!(
            "Thank you {}! Your message has been sent successfully. We will get back to you within 2 hours.",
            submission.name
        ),
    })))
}

async fn contact_success() -> Json<serde_json::Value> {
    Json(json!({ "detail": "Your message has been sent successfully." }))
}
