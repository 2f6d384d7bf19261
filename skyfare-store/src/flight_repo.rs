use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use skyfare_core::models::{Airport, Flight, NewAirport, NewFlight};
use skyfare_core::repository::{FlightStore, StoreError, StoreResult};
use skyfare_core::search::FlightQuery;

use crate::map_db_err;

pub struct PgFlightStore {
    pub pool: PgPool,
}

impl PgFlightStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct FlightRow {
    id: Uuid,
    number: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    price_cents: i64,
    seat_capacity: i32,
    origin_id: Uuid,
    origin_code: String,
    origin_name: String,
    origin_city: String,
    origin_country: String,
    destination_id: Uuid,
    destination_code: String,
    destination_name: String,
    destination_city: String,
    destination_country: String,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            number: row.number,
            origin: Airport {
                id: row.origin_id,
                code: row.origin_code,
                name: row.origin_name,
                city: row.origin_city,
                country: row.origin_country,
            },
            destination: Airport {
                id: row.destination_id,
                code: row.destination_code,
                name: row.destination_name,
                city: row.destination_city,
                country: row.destination_country,
            },
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            price_cents: row.price_cents,
            seat_capacity: row.seat_capacity,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AirportRow {
    id: Uuid,
    code: String,
    name: String,
    city: String,
    country: String,
}

impl From<AirportRow> for Airport {
    fn from(row: AirportRow) -> Self {
        Airport {
            id: row.id,
            code: row.code,
            name: row.name,
            city: row.city,
            country: row.country,
        }
    }
}

const FLIGHT_SELECT: &str = r#"
SELECT
    f.id, f.number, f.departure_time, f.arrival_time, f.price_cents, f.seat_capacity,
    o.id AS origin_id, o.code AS origin_code, o.name AS origin_name,
    o.city AS origin_city, o.country AS origin_country,
    d.id AS destination_id, d.code AS destination_code, d.name AS destination_name,
    d.city AS destination_city, d.country AS destination_country
FROM flights f
JOIN airports o ON f.origin_id = o.id
JOIN airports d ON f.destination_id = d.id
"#;

#[async_trait]
impl FlightStore for PgFlightStore {
    async fn get_flight(&self, id: Uuid) -> StoreResult<Option<Flight>> {
        let row = sqlx::query_as::<_, FlightRow>(&format!("{FLIGHT_SELECT} WHERE f.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(row.map(Flight::from))
    }

    async fn search_flights(
        &self,
        query: &FlightQuery,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Flight>> {
        let sql = format!(
            r#"{FLIGHT_SELECT}
            WHERE f.departure_time >= $1
              AND ($2::text IS NULL OR upper(o.code) = upper($2))
              AND ($3::text IS NULL OR upper(d.code) = upper($3))
              AND ($4::date IS NULL OR (f.departure_time AT TIME ZONE 'UTC')::date = $4)
            ORDER BY f.departure_time ASC"#
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(now)
            .bind(query.origin.as_ref().map(|s| s.trim().to_string()))
            .bind(query.destination.as_ref().map(|s| s.trim().to_string()))
            .bind(query.date)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn list_flights(
        &self,
        origin: Option<&str>,
        destination: Option<&str>,
    ) -> StoreResult<Vec<Flight>> {
        let sql = format!(
            r#"{FLIGHT_SELECT}
            WHERE ($1::text IS NULL OR upper(o.code) = upper($1))
              AND ($2::text IS NULL OR upper(d.code) = upper($2))
            ORDER BY f.departure_time ASC"#
        );
        let rows = sqlx::query_as::<_, FlightRow>(&sql)
            .bind(origin)
            .bind(destination)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Flight::from).collect())
    }

    async fn create_flight(&self, flight: &NewFlight) -> StoreResult<Flight> {
        let origin = self
            .get_airport_by_code(&flight.origin_code)
            .await?
            .ok_or(StoreError::NotFound)?;
        let destination = self
            .get_airport_by_code(&flight.destination_code)
            .await?
            .ok_or(StoreError::NotFound)?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO flights (id, number, origin_id, destination_id, departure_time,
                                 arrival_time, price_cents, seat_capacity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(&flight.number)
        .bind(origin.id)
        .bind(destination.id)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(flight.price_cents)
        .bind(flight.seat_capacity)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        Ok(Flight {
            id,
            number: flight.number.clone(),
            origin,
            destination,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            price_cents: flight.price_cents,
            seat_capacity: flight.seat_capacity,
        })
    }

    async fn get_airport_by_code(&self, code: &str) -> StoreResult<Option<Airport>> {
        let row = sqlx::query_as::<_, AirportRow>(
            "SELECT id, code, name, city, country FROM airports WHERE upper(code) = upper($1)",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(Airport::from))
    }

    async fn list_airports(&self, search: Option<&str>) -> StoreResult<Vec<Airport>> {
        let rows = sqlx::query_as::<_, AirportRow>(
            r#"
            SELECT id, code, name, city, country FROM airports
            WHERE ($1::text IS NULL
                   OR code ILIKE '%' || $1 || '%'
                   OR city ILIKE '%' || $1 || '%'
                   OR country ILIKE '%' || $1 || '%')
            ORDER BY code ASC
            "#,
        )
        .bind(search)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Airport::from).collect())
    }

    async fn create_airport(&self, airport: &NewAirport) -> StoreResult<Airport> {
        let row = sqlx::query_as::<_, AirportRow>(
            r#"
            INSERT INTO airports (id, code, name, city, country)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, code, name, city, country
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&airport.code)
        .bind(&airport.name)
        .bind(&airport.city)
        .bind(&airport.country)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(Airport::from(row))
    }
}
