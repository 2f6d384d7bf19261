use std::net::SocketAddr;
use std::sync::Arc;

use skyfare_api::{
    app,
    state::{AppState, AuthConfig},
};
use skyfare_notify::{ConsoleMailer, Mailer, SmtpMailer};
use skyfare_store::{DbClient, PgBookingStore, PgContactStore, PgFlightStore, PgUserStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyfare_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skyfare_store::app_config::Config::load()?;
    tracing::info!("Starting Skyfare API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let mailer: Arc<dyn Mailer> = if config.smtp.enabled {
        Arc::new(SmtpMailer::new(
            &config.smtp.host,
            config.smtp.port,
            config.smtp.username.clone(),
            config.smtp.password.clone(),
            config.company.from_email.clone(),
        )?)
    } else {
        tracing::warn!("SMTP disabled; outbound mail goes to the log");
        Arc::new(ConsoleMailer)
    };

    let state = AppState {
        flights: Arc::new(PgFlightStore::new(db.pool.clone())),
        bookings: Arc::new(PgBookingStore::new(db.pool.clone())),
        contacts: Arc::new(PgContactStore::new(db.pool.clone())),
        users: Arc::new(PgUserStore::new(db.pool.clone())),
        mailer,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        company: config.company.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}
