use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Booking, Flight, Passenger};
use crate::repository::{BookingStore, FlightStore, StoreError};
use crate::validate::{is_valid_email, FieldErrors};

/// Remaining capacity derived from the ledger at read time. Clamped at zero
/// in case the ledger sum ever exceeds capacity.
pub fn available_seats(capacity: i32, booked: i64) -> u32 {
    let remaining = i64::from(capacity) - booked;
    u32::try_from(remaining).unwrap_or(0)
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub seats: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("flight not found")]
    FlightNotFound,

    #[error("booking validation failed: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A committed reservation together with the records the confirmation email
/// is built from.
#[derive(Debug, Clone)]
pub struct PlacedBooking {
    pub booking: Booking,
    pub passenger: Passenger,
    pub flight: Flight,
}

fn validate_request(req: &BookingRequest) -> Result<(), BookingError> {
    let mut errors = FieldErrors::new();
    if req.name.trim().is_empty() {
        errors.push("name", "This field is required.");
    }
    if !is_valid_email(&req.email) {
        errors.push("email", "Enter a valid email address.");
    }
    if req.seats < 1 {
        errors.push("seats", "Book at least 1 seat.");
    }
    errors.into_result().map_err(BookingError::Validation)
}

/// Reserve seats on a flight.
///
/// The availability recheck happens here, immediately before the insert, and
/// is authoritative over whatever count the caller showed the user earlier.
/// The passenger and booking records commit as one unit, but the recheck and
/// that commit are still two separate store operations with nothing
/// serializing them against a concurrent booking on the same flight; see
/// DESIGN.md.
pub async fn place_booking(
    flights: &dyn FlightStore,
    ledger: &dyn BookingStore,
    flight_id: Uuid,
    req: &BookingRequest,
    user_id: Option<Uuid>,
) -> Result<PlacedBooking, BookingError> {
    let flight = flights
        .get_flight(flight_id)
        .await?
        .ok_or(BookingError::FlightNotFound)?;

    validate_request(req)?;

    let booked = ledger.seats_booked(flight.id).await?;
    let remaining = available_seats(flight.seat_capacity, booked);
    if req.seats as u32 > remaining {
        let mut errors = FieldErrors::new();
        errors.push("seats", format!("Only {remaining} seat(s) remaining."));
        return Err(BookingError::Validation(errors));
    }

    let (passenger, booking) = ledger
        .reserve(flight.id, req.name.trim(), req.email.trim(), user_id, req.seats)
        .await?;

    tracing::info!(
        booking_id = %booking.id,
        flight = %flight.number,
        seats = booking.seats,
        "booking committed"
    );

    Ok(PlacedBooking {
        booking,
        passenger,
        flight,
    })
}
