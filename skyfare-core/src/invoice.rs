use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::booking::PlacedBooking;
use crate::CompanyInfo;

/// Everything the invoice PDF and the confirmation email need, flattened out
/// of the booking, flight, passenger and company records. Billing fields are
/// optional; absent values drop their line from the rendered invoice.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceContext {
    pub booking_id: Uuid,
    pub passenger_name: String,
    pub passenger_email: String,

    pub flight_number: String,
    pub origin_code: String,
    pub destination_code: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub booked_at: DateTime<Utc>,

    pub unit_price_cents: Option<i64>,
    pub seats: Option<i32>,
    pub total_cents: Option<i64>,
    pub currency: String,

    pub company_name: String,
    pub company_address: String,
    pub support_email: String,
    pub support_phone: String,
}

impl InvoiceContext {
    pub fn from_booking(placed: &PlacedBooking, company: &CompanyInfo) -> Self {
        let seats = placed.booking.seats;
        let unit_price = placed.flight.price_cents;
        Self {
            booking_id: placed.booking.id,
            passenger_name: placed.passenger.name.clone(),
            passenger_email: placed.passenger.email.clone(),
            flight_number: placed.flight.number.clone(),
            origin_code: placed.flight.origin.code.clone(),
            destination_code: placed.flight.destination.code.clone(),
            departure_time: placed.flight.departure_time,
            arrival_time: placed.flight.arrival_time,
            booked_at: placed.booking.booked_at,
            unit_price_cents: Some(unit_price),
            seats: Some(seats),
            total_cents: Some(unit_price * i64::from(seats)),
            currency: company.currency.clone(),
            company_name: company.name.clone(),
            company_address: company.address.clone(),
            support_email: company.support_email.clone(),
            support_phone: company.support_phone.clone(),
        }
    }
}
