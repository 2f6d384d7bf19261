use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Airport, Booking, ContactSubmission, Flight, NewAirport, NewFlight, Passenger, UserAccount,
};
use crate::search::FlightQuery;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Admin-side booking listing filter. Both fields optional, AND-combined.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub flight_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Airport directory + flight catalog.
#[async_trait]
pub trait FlightStore: Send + Sync {
    async fn get_flight(&self, id: Uuid) -> StoreResult<Option<Flight>>;

    /// Catalog search: optional filters, departed flights excluded relative
    /// to `now`, ascending by departure time.
    async fn search_flights(&self, query: &FlightQuery, now: DateTime<Utc>)
        -> StoreResult<Vec<Flight>>;

    /// Admin listing: no departed-flight cut-off, same optional route filter.
    async fn list_flights(
        &self,
        origin: Option<&str>,
        destination: Option<&str>,
    ) -> StoreResult<Vec<Flight>>;

    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight>;

    async fn get_airport_by_code(&self, code: &str) -> StoreResult<Option<Airport>>;
    async fn list_airports(&self, search: Option<&str>) -> StoreResult<Vec<Airport>>;
    async fn create_airport(&self, airport: &NewAirport) -> StoreResult<Airport>;
}

/// The booking ledger plus the passenger registry it writes to.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Sum of seats already booked on a flight. The availability recheck
    /// reads this immediately before inserting.
    async fn seats_booked(&self, flight_id: Uuid) -> StoreResult<i64>;

    /// Get-or-create the passenger keyed on email and insert the booking as
    /// one atomic unit; a failure keeps neither record. An existing passenger
    /// keeps its id and first-seen name.
    async fn reserve(
        &self,
        flight_id: Uuid,
        name: &str,
        email: &str,
        user_id: Option<Uuid>,
        seats: i32,
    ) -> StoreResult<(Passenger, Booking)>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;
    async fn get_passenger(&self, id: Uuid) -> StoreResult<Option<Passenger>>;

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>>;
    async fn list_passengers(&self, search: Option<&str>) -> StoreResult<Vec<Passenger>>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_submission(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
        submitted_at: DateTime<Utc>,
    ) -> StoreResult<ContactSubmission>;

    async fn list_submissions(&self, resolved: Option<bool>) -> StoreResult<Vec<ContactSubmission>>;

    /// Toggle the resolved flag; `NotFound` when the id does not resolve.
    async fn set_resolved(&self, id: Uuid, resolved: bool) -> StoreResult<ContactSubmission>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Conflict` when the username is already taken.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> StoreResult<UserAccount>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserAccount>>;
}
