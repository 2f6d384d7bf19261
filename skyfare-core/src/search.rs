use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::Flight;

/// Catalog search filters. All optional, AND-combined.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

impl FlightQuery {
    fn matches(&self, flight: &Flight) -> bool {
        if let Some(origin) = &self.origin {
            if !flight.origin.code.eq_ignore_ascii_case(origin.trim()) {
                return false;
            }
        }
        if let Some(destination) = &self.destination {
            if !flight
                .destination
                .code
                .eq_ignore_ascii_case(destination.trim())
            {
                return false;
            }
        }
        if let Some(date) = self.date {
            if flight.departure_time.date_naive() != date {
                return false;
            }
        }
        true
    }
}

/// Apply the catalog search contract to an in-memory flight list: drop
/// flights that already departed relative to `now`, apply the optional
/// filters, sort ascending by departure time.
pub fn filter_flights(flights: Vec<Flight>, query: &FlightQuery, now: DateTime<Utc>) -> Vec<Flight> {
    let mut matches: Vec<Flight> = flights
        .into_iter()
        .filter(|f| f.departure_time >= now && query.matches(f))
        .collect();
    matches.sort_by_key(|f| f.departure_time);
    matches
}
