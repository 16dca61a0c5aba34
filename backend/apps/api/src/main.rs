//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use api::settings::Settings;
use api::{account_mailer, build_app, cors_layer, email_backend};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use users::{InMemoryUserRepository, PgUserRepository, UsersAppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,users=info,platform=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match env::var("BASE_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir()?,
    };

    let settings = Settings::load(&base_dir).context("Failed to load settings")?;
    let users_config = Arc::new(settings.auth.users_config()?);

    let mailer = account_mailer(
        &settings,
        &base_dir,
        email_backend(&settings)?,
        users_config.clone(),
    );
    let cors = cors_layer(&settings.cors);

    let app = match settings.database_url() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(settings.database.max_connections)
                .connect(&database_url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let state = UsersAppState::new(PgUserRepository::new(pool), mailer, users_config);
            build_app(state, cors)
        }
        None => {
            tracing::warn!("No database configured, users are kept in memory and lost on exit");

            let state = UsersAppState::new(InMemoryUserRepository::new(), mailer, users_config);
            build_app(state, cors)
        }
    };

    // Start server
    let host: std::net::IpAddr = settings
        .server
        .host
        .parse()
        .context("server.host must be an IP address")?;
    let addr = SocketAddr::new(host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
