use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyfare_core::booking::{available_seats, place_booking, BookingRequest, PlacedBooking};
use skyfare_core::invoice::InvoiceContext;
use skyfare_notify::send_booking_confirmation;

use crate::auth::{require_user, Claims};
use crate::error::ApiError;
use crate::flights::FlightView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct BookingForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    seats: i32,
}

#[derive(Debug, Serialize)]
struct BookingFormContext {
    flight: FlightView,
    available_seats: u32,
    prefill_name: String,
    prefill_email: String,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: Uuid,
    flight_number: String,
    seats: i32,
    passenger_email: String,
    detail: String,
}

#[derive(Debug, Serialize)]
struct BookingSuccessView {
    booking_id: Uuid,
    flight: FlightView,
    passenger_name: String,
    passenger_email: String,
    seats: i32,
    total_cents: i64,
    currency: String,
    booked_at: DateTime<Utc>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/flight/{id}/book/", get(booking_form).post(book_flight))
        .route("/booking/{id}/resend/", post(resend_confirmation))
        .route_layer(from_fn_with_state(state, require_user));

    Router::new()
        .route("/booking/{id}/success/", get(booking_success))
        .merge(protected)
}

/// Booking form context: the flight, its live availability, and prefill
/// values taken from the authenticated account.
async fn booking_form(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BookingFormContext>, ApiError> {
    let flight = state
        .flights
        .get_flight(flight_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Flight not found".to_string()))?;
    let booked = state.bookings.seats_booked(flight.id).await?;

    let user = state.users.get_user(claims.sub).await?;
    let prefill_name = user
        .as_ref()
        .map(|u| u.full_name())
        .unwrap_or_else(|| claims.username.clone());

    Ok(Json(BookingFormContext {
        flight: FlightView::from_flight(&flight, &state.company.currency),
        available_seats: available_seats(flight.seat_capacity, booked),
        prefill_name,
        prefill_email: claims.email.clone(),
    }))
}

async fn book_flight(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<BookingForm>,
) -> Result<Json<BookingResponse>, ApiError> {
    // Blank fields fall back to the account's details, as the form prefills
    // them from the logged-in user.
    let user = state.users.get_user(claims.sub).await?;
    let name = if form.name.trim().is_empty() {
        user.as_ref()
            .map(|u| u.full_name())
            .unwrap_or_else(|| claims.username.clone())
    } else {
        form.name
    };
    let email = if form.email.trim().is_empty() {
        claims.email.clone()
    } else {
        form.email
    };

    let request = BookingRequest {
        name,
        email,
        seats: form.seats,
    };
    let placed = place_booking(
        state.flights.as_ref(),
        state.bookings.as_ref(),
        flight_id,
        &request,
        Some(claims.sub),
    )
    .await?;

    // The reservation is committed; a failed send is logged, never surfaced.
    let ctx = InvoiceContext::from_booking(&placed, &state.company);
    send_booking_confirmation(state.mailer.as_ref(), &ctx).await;

    Ok(Json(BookingResponse {
        booking_id: placed.booking.id,
        flight_number: placed.flight.number,
        seats: placed.booking.seats,
        passenger_email: placed.passenger.email,
        detail: "Your booking has been confirmed!".to_string(),
    }))
}

/// Loads the records behind a booking id, for success display and resends.
async fn load_placed(state: &AppState, booking_id: Uuid) -> Result<PlacedBooking, ApiError> {
    let booking = state
        .bookings
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Booking not found".to_string()))?;
    let flight = state
        .flights
        .get_flight(booking.flight_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Flight not found".to_string()))?;
    let passenger = state
        .bookings
        .get_passenger(booking.passenger_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Passenger not found".to_string()))?;
    Ok(PlacedBooking {
        booking,
        passenger,
        flight,
    })
}

async fn booking_success(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingSuccessView>, ApiError> {
    let placed = load_placed(&state, booking_id).await?;
    Ok(Json(BookingSuccessView {
        booking_id: placed.booking.id,
        flight: FlightView::from_flight(&placed.flight, &state.company.currency),
        passenger_name: placed.passenger.name,
        passenger_email: placed.passenger.email,
        seats: placed.booking.seats,
        total_cents: placed.flight.price_cents * i64::from(placed.booking.seats),
        currency: state.company.currency.clone(),
        booked_at: placed.booking.booked_at,
    }))
}

async fn resend_confirmation(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let placed = load_placed(&state, booking_id).await?;

    if let Some(owner) = placed.booking.user_id {
        if owner != claims.sub && !claims.is_admin() {
            return Err(ApiError::Authorization(
                "You don't have permission to resend this booking email.".to_string(),
            ));
        }
    }

    let ctx = InvoiceContext::from_booking(&placed, &state.company);
    send_booking_confirmation(state.mailer.as_ref(), &ctx).await;

    Ok(Json(serde_json::json!({
        "detail": format!("Confirmation email resent to {}.", placed.passenger.email)
    })))
}
