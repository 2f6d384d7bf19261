use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use skyfare_core::models::{Booking, Passenger};
use skyfare_core::repository::{BookingFilter, BookingStore, StoreResult};

use crate::map_db_err;

pub struct PgBookingStore {
    pub pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: Uuid,
    name: String,
    email: String,
}

impl From<PassengerRow> for Passenger {
    fn from(row: PassengerRow) -> Self {
        Passenger {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    flight_id: Uuid,
    passenger_id: Uuid,
    user_id: Option<Uuid>,
    seats: i32,
    booked_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            flight_id: row.flight_id,
            passenger_id: row.passenger_id,
            user_id: row.user_id,
            seats: row.seats,
            booked_at: row.booked_at,
        }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn seats_booked(&self, flight_id: Uuid) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(seats), 0) FROM bookings WHERE flight_id = $1",
        )
        .bind(flight_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)
    }

    async fn reserve(
        &self,
        flight_id: Uuid,
        name: &str,
        email: &str,
        user_id: Option<Uuid>,
        seats: i32,
    ) -> StoreResult<(Passenger, Booking)> {
        // One transaction: a failed booking insert rolls the passenger
        // get-or-create back with it. The no-op name update on conflict keeps
        // the first-seen name while still returning the existing row.
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let passenger = sqlx::query_as::<_, PassengerRow>(
            r#"
            INSERT INTO passengers (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET name = passengers.name
            RETURNING id, name, email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        let booking = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (id, flight_id, passenger_id, user_id, seats, booked_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING id, flight_id, passenger_id, user_id, seats, booked_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(flight_id)
        .bind(passenger.id)
        .bind(user_id)
        .bind(seats)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok((Passenger::from(passenger), Booking::from(booking)))
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, flight_id, passenger_id, user_id, seats, booked_at FROM bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(Booking::from))
    }

    async fn get_passenger(&self, id: Uuid) -> StoreResult<Option<Passenger>> {
        let row = sqlx::query_as::<_, PassengerRow>(
            "SELECT id, name, email FROM passengers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(Passenger::from))
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, flight_id, passenger_id, user_id, seats, booked_at FROM bookings
            WHERE ($1::uuid IS NULL OR flight_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY booked_at DESC
            "#,
        )
        .bind(filter.flight_id)
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn list_passengers(&self, search: Option<&str>) -> StoreResult<Vec<Passenger>> {
        let rows = sqlx::query_as::<_, PassengerRow>(
            r#"
            SELECT id, name, email FROM passengers
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%'
                   OR email ILIKE '%' || $1 || '%')
            ORDER BY email ASC
            "#,
        )
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Passenger::from).collect())
    }
}
