//! Curio API server.
//!
//! This binary serves the collectibles storefront backend as a JSON API.
//!
//! # Architecture
//!
//! - Axum web framework, JSON request/response bodies
//! - `SQLite` for all persistent data, behind a single-writer pool
//! - Cookie sessions backed by the same database
//!
//! Migrations are NOT run automatically on startup. Run them first via:
//! `cargo run -p curio-cli -- migrate`

#![cfg_attr(not(test), forbid(unsafe_code))]

use curio_api::config::AppConfig;
use curio_api::state::AppState;
use curio_api::{db, routes};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "curio_api=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Application migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p curio-cli -- migrate

    // The session store manages its own table
    let session_store = SqliteStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .expect("Failed to migrate session store");

    // Build application state and router
    let addr = config.socket_addr();
    let state = AppState::new(config, pool);
    let app = routes::app(state, session_store);

    // Start server
    tracing::info!("curio-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
