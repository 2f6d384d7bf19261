pub mod booking;
pub mod contact;
pub mod invoice;
pub mod memory;
pub mod models;
pub mod repository;
pub mod search;
pub mod validate;

pub use repository::{BookingStore, ContactStore, FlightStore, StoreError, UserStore};
pub use validate::{FieldError, FieldErrors};

/// Company metadata threaded into invoices and outbound email.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub address: String,
    pub support_email: String,
    pub support_phone: String,
    pub currency: String,
    pub from_email: String,
}

/// Render an integer minor-unit amount as `12.50 TND`.
pub fn format_amount(cents: i64, currency: &str) -> String {
    format!("{}.{:02} {}", cents / 100, (cents % 100).abs(), currency)
}
