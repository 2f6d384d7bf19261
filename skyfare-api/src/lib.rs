use axum::{extract::State, http::Method, routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod contact;
pub mod error;
pub mod flights;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/", get(home))
        .merge(auth::routes())
        .merge(flights::routes())
        .merge(bookings::routes(state.clone()))
        .merge(contact::routes())
        .merge(admin::routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "skyfare",
        "company": state.company.name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
