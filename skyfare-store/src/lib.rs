pub mod app_config;
pub mod booking_repo;
pub mod contact_repo;
pub mod database;
pub mod flight_repo;
pub mod user_repo;

pub use booking_repo::PgBookingStore;
pub use contact_repo::PgContactStore;
pub use database::DbClient;
pub use flight_repo::PgFlightStore;
pub use user_repo::PgUserStore;

use skyfare_core::StoreError;

/// Map a sqlx error onto the storage taxonomy: unique violations become
/// `Conflict`, everything else is an opaque backend failure.
pub(crate) fn map_db_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Backend(Box::new(e))
}
