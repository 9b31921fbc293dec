//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account
//! curio admin create -u admin -e admin@example.com -p <password>
//! ```
//!
//! # Environment Variables
//!
//! - `CURIO_DATABASE_URL` (falls back to `DATABASE_URL`) - `SQLite`
//!   connection string

use secrecy::SecretString;
use thiserror::Error;

use curio_core::{Email, UserId, UserRole};

use curio_api::db::{self, NewUser, RepositoryError, UserRepository};
use curio_api::services::auth;

/// Errors that can occur during admin account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password too short.
    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    /// Account already exists.
    #[error("Account already exists: {0}")]
    UserExists(String),

    /// Password hashing failed.
    #[error("Password hashing failed")]
    PasswordHash,

    /// Repository error.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Create a new admin account.
///
/// # Arguments
///
/// * `username` - Account username
/// * `email` - Account email address
/// * `password` - Plaintext password, hashed before storage
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns `AdminError` if validation fails, the account already exists, or
/// a database operation fails.
pub async fn create_user(username: &str, email: &str, password: &str) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    if password.chars().count() < auth::MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword(auth::MIN_PASSWORD_LENGTH));
    }

    let database_url = std::env::var("CURIO_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| AdminError::MissingEnvVar("CURIO_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating admin account: {} ({})", username, email.as_str());

    let password_hash = auth::hash_password(password).map_err(|_| AdminError::PasswordHash)?;

    let user = UserRepository::new(&pool)
        .create(NewUser {
            username,
            email: &email,
            phone: None,
            password_hash: &password_hash,
            avatar_url: None,
            role: UserRole::Admin,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(username.to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
