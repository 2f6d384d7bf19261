use std::sync::Arc;

use skyfare_core::{BookingStore, CompanyInfo, ContactStore, FlightStore, UserStore};
use skyfare_notify::Mailer;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub flights: Arc<dyn FlightStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub users: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub auth: AuthConfig,
    pub company: CompanyInfo,
}
