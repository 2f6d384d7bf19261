use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyfare_core::booking::available_seats;
use skyfare_core::models::Flight;
use skyfare_core::search::FlightQuery;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FlightListParams {
    origin: Option<String>,
    destination: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AirportView {
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct FlightView {
    pub id: Uuid,
    pub number: String,
    pub origin: AirportView,
    pub destination: AirportView,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_cents: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct FlightDetailView {
    #[serde(flatten)]
    pub flight: FlightView,
    pub seat_capacity: i32,
    pub available_seats: u32,
}

impl FlightView {
    pub fn from_flight(flight: &Flight, currency: &str) -> Self {
        let airport = |a: &skyfare_core::models::Airport| AirportView {
            code: a.code.clone(),
            name: a.name.clone(),
            city: a.city.clone(),
            country: a.country.clone(),
        };
        Self {
            id: flight.id,
            number: flight.number.clone(),
            origin: airport(&flight.origin),
            destination: airport(&flight.destination),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            price_cents: flight.price_cents,
            currency: currency.to_string(),
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights/", get(flight_list))
        .route("/flight/{id}/", get(flight_detail))
}

/// Blank query params mean "no filter", matching form submissions that leave
/// a field empty.
fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn flight_list(
    State(state): State<AppState>,
    Query(params): Query<FlightListParams>,
) -> Result<Json<Vec<FlightView>>, ApiError> {
    let date = match non_blank(params.date) {
        Some(raw) => Some(
            raw.parse::<NaiveDate>()
                .map_err(|_| ApiError::field("date", "Enter a valid date (YYYY-MM-DD)."))?,
        ),
        None => None,
    };

    let query = FlightQuery {
        origin: non_blank(params.origin),
        destination: non_blank(params.destination),
        date,
    };

    let flights = state.flights.search_flights(&query, Utc::now()).await?;
    Ok(Json(
        flights
            .iter()
            .map(|f| FlightView::from_flight(f, &state.company.currency))
            .collect(),
    ))
}

async fn flight_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlightDetailView>, ApiError> {
    let flight = state
        .flights
        .get_flight(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Flight not found".to_string()))?;

    let booked = state.bookings.seats_booked(flight.id).await?;
    Ok(Json(FlightDetailView {
        flight: FlightView::from_flight(&flight, &state.company.currency),
        seat_capacity: flight.seat_capacity,
        available_seats: available_seats(flight.seat_capacity, booked),
    }))
}
