//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! curio migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CURIO_DATABASE_URL` (falls back to `DATABASE_URL`) - `SQLite`
//!   connection string, e.g. `sqlite://curio.db`
//!
//! The database file is created if it does not exist. Migrations are
//! embedded in the `curio-api` crate, so the command works from any
//! directory.

use secrecy::SecretString;
use thiserror::Error;

use curio_api::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the application migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database URL is missing, the connection
/// fails, or a migration fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

/// Read the database URL, preferring `CURIO_DATABASE_URL` and falling back
/// to plain `DATABASE_URL` so sqlx-cli setups keep working.
fn database_url_from_env() -> Result<SecretString, MigrationError> {
    std::env::var("CURIO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("CURIO_DATABASE_URL"))
}
