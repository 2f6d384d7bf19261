//! HashMap-backed implementation of the storage traits, used by unit and
//! API tests in place of Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    Airport, Booking, ContactSubmission, Flight, NewAirport, NewFlight, Passenger, UserAccount,
};
use crate::repository::{
    BookingFilter, BookingStore, ContactStore, FlightStore, StoreError, StoreResult, UserStore,
};
use crate::search::{filter_flights, FlightQuery};

#[derive(Default)]
struct Inner {
    airports: HashMap<Uuid, Airport>,
    flights: HashMap<Uuid, Flight>,
    passengers: HashMap<Uuid, Passenger>,
    bookings: Vec<Booking>,
    submissions: HashMap<Uuid, ContactSubmission>,
    users: HashMap<Uuid, UserAccount>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlightStore for MemoryStore {
    async fn get_flight(&self, id: Uuid) -> StoreResult<Option<Flight>> {
        Ok(self.inner.lock().await.flights.get(&id).cloned())
    }

    async fn search_flights(
        &self,
        query: &FlightQuery,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Flight>> {
        let flights: Vec<Flight> = self.inner.lock().await.flights.values().cloned().collect();
        Ok(filter_flights(flights, query, now))
    }

    async fn list_flights(
        &self,
        origin: Option<&str>,
        destination: Option<&str>,
    ) -> StoreResult<Vec<Flight>> {
        let inner = self.inner.lock().await;
        let mut flights: Vec<Flight> = inner
            .flights
            .values()
            .filter(|f| {
                origin.is_none_or(|o| f.origin.code.eq_ignore_ascii_case(o))
                    && destination.is_none_or(|d| f.destination.code.eq_ignore_ascii_case(d))
            })
            .cloned()
            .collect();
        flights.sort_by_key(|f| f.departure_time);
        Ok(flights)
    }

    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight> {
        let mut inner = self.inner.lock().await;
        let find = |code: &str| {
            inner
                .airports
                .values()
                .find(|a| a.code.eq_ignore_ascii_case(code))
                .cloned()
        };
        let origin = find(&flight.origin_code).ok_or(StoreError::NotFound)?;
        let destination = find(&flight.destination_code).ok_or(StoreError::NotFound)?;

        let created = Flight {
            id: Uuid::new_v4(),
            number: flight.number.clone(),
            origin,
            destination,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            price_cents: flight.price_cents,
            seat_capacity: flight.seat_capacity,
        };
        inner.flights.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_airport_by_code(&self, code: &str) -> StoreResult<Option<Airport>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .airports
            .values()
            .find(|a| a.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn list_airports(&self, search: Option<&str>) -> StoreResult<Vec<Airport>> {
        let inner = self.inner.lock().await;
        let needle = search.map(str::to_lowercase);
        let mut airports: Vec<Airport> = inner
            .airports
            .values()
            .filter(|a| {
                needle.as_deref().is_none_or(|n| {
                    a.code.to_lowercase().contains(n)
                        || a.city.to_lowercase().contains(n)
                        || a.country.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        airports.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(airports)
    }

    async fn create_airport(&self, airport: &NewAirport) -> StoreResult<Airport> {
        let mut inner = self.inner.lock().await;
        if inner
            .airports
            .values()
            .any(|a| a.code.eq_ignore_ascii_case(&airport.code))
        {
            return Err(StoreError::Conflict(format!(
                "airport code {} already exists",
                airport.code
            )));
        }
        let created = Airport {
            id: Uuid::new_v4(),
            code: airport.code.clone(),
            name: airport.name.clone(),
            city: airport.city.clone(),
            country: airport.country.clone(),
        };
        inner.airports.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn seats_booked(&self, flight_id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.flight_id == flight_id)
            .map(|b| i64::from(b.seats))
            .sum())
    }

    async fn reserve(
        &self,
        flight_id: Uuid,
        name: &str,
        email: &str,
        user_id: Option<Uuid>,
        seats: i32,
    ) -> StoreResult<(Passenger, Booking)> {
        // Both records land under one lock, so a reservation is all-or-nothing
        // here just as it is inside the Postgres transaction.
        let mut inner = self.inner.lock().await;
        let passenger = match inner
            .passengers
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
        {
            Some(existing) => existing.clone(),
            None => {
                let created = Passenger {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    email: email.to_string(),
                };
                inner.passengers.insert(created.id, created.clone());
                created
            }
        };
        let booking = Booking {
            id: Uuid::new_v4(),
            flight_id,
            passenger_id: passenger.id,
            user_id,
            seats,
            booked_at: Utc::now(),
        };
        inner.bookings.push(booking.clone());
        Ok((passenger, booking))
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let inner = self.inner.lock().await;
        Ok(inner.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn get_passenger(&self, id: Uuid) -> StoreResult<Option<Passenger>> {
        Ok(self.inner.lock().await.passengers.get(&id).cloned())
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let inner = self.inner.lock().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| {
                filter.flight_id.is_none_or(|f| b.flight_id == f)
                    && filter.user_id.is_none_or(|u| b.user_id == Some(u))
            })
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }

    async fn list_passengers(&self, search: Option<&str>) -> StoreResult<Vec<Passenger>> {
        let inner = self.inner.lock().await;
        let needle = search.map(str::to_lowercase);
        let mut passengers: Vec<Passenger> = inner
            .passengers
            .values()
            .filter(|p| {
                needle.as_deref().is_none_or(|n| {
                    p.name.to_lowercase().contains(n) || p.email.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        passengers.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(passengers)
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert_submission(
        &self,
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
        submitted_at: DateTime<Utc>,
    ) -> StoreResult<ContactSubmission> {
        let mut inner = self.inner.lock().await;
        let submission = ContactSubmission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            submitted_at,
            is_resolved: false,
        };
        inner.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn list_submissions(&self, resolved: Option<bool>) -> StoreResult<Vec<ContactSubmission>> {
        let inner = self.inner.lock().await;
        let mut submissions: Vec<ContactSubmission> = inner
            .submissions
            .values()
            .filter(|s| resolved.is_none_or(|r| s.is_resolved == r))
            .cloned()
            .collect();
        // Newest first, matching the admin listing.
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }

    async fn set_resolved(&self, id: Uuid, resolved: bool) -> StoreResult<ContactSubmission> {
        let mut inner = self.inner.lock().await;
        let submission = inner.submissions.get_mut(&id).ok_or(StoreError::NotFound)?;
        submission.is_resolved = resolved;
        Ok(submission.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> StoreResult<UserAccount> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.username == username) {
            return Err(StoreError::Conflict(format!(
                "username {username} already exists"
            )));
        }
        let user = UserAccount {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            password_hash: password_hash.to_string(),
            is_staff: false,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }
}

impl MemoryStore {
    /// Test helper: promote a user to staff.
    pub async fn set_staff(&self, id: Uuid, is_staff: bool) {
        if let Some(user) = self.inner.lock().await.users.get_mut(&id) {
            user.is_staff = is_staff;
        }
    }
}
