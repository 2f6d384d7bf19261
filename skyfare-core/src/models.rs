use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Static reference entry seeded administratively; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

/// A scheduled flight. Capacity is fixed at creation; remaining seats are
/// always derived from the booking ledger, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub number: String,
    pub origin: Airport,
    pub destination: Airport,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_cents: i64,
    pub seat_capacity: i32,
}

/// Deduplicated by email: one record per address, reused across bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub passenger_id: Uuid,
    pub user_id: Option<Uuid>,
    pub seats: i32,
    pub booked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
    pub is_resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Display name falling back to the username, as shown on booking forms.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// New-flight payload used by the admin seeding endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFlight {
    pub number: String,
    pub origin_code: String,
    pub destination_code: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_cents: i64,
    pub seat_capacity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAirport {
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}
