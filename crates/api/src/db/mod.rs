//! Database operations for the Curio `SQLite` store.
//!
//! ## Tables
//!
//! - `users` - Accounts and password hashes
//! - `groups` / `products` - Catalog
//! - `orders` / `order_items` - Carts (status `CART`) and placed orders
//! - `wishlist_items` / `collection_items` - Per-user product sets
//! - `gallery_posts` - Community photo feed
//! - `tower_sessions` - Managed by the session store itself
//!
//! # Migrations
//!
//! Migrations are embedded from `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p curio-cli -- migrate
//! ```

pub mod collection;
pub mod gallery;
pub mod groups;
pub mod orders;
pub mod products;
pub mod users;
pub mod wishlist;

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

pub use collection::CollectionRepository;
pub use gallery::GalleryRepository;
pub use groups::GroupRepository;
pub use orders::OrderRepository;
pub use products::{NewProduct, ProductRepository};
pub use users::{NewUser, UserRepository};
pub use wishlist::WishlistRepository;

/// Embedded application migrations (`crates/api/migrations/`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool.
///
/// The pool is capped at a single connection: `SQLite` allows one writer at a
/// time, and funnelling every transaction through one connection serializes
/// them instead of surfacing `SQLITE_BUSY` to callers. The database file is
/// created on first use; `sqlite::memory:` works for tests.
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Parse a stored decimal TEXT column.
pub(crate) fn parse_decimal(raw: &str, column: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid decimal in {column}: {e}"))
    })
}
