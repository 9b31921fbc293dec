//! Authentication service.
//!
//! Registration, login by username or email, and Argon2 password handling.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use curio_core::{Email, UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Username length bounds.
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;

/// A registration request after transport decoding.
#[derive(Debug)]
pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub password: &'a str,
    pub avatar_url: Option<&'a str>,
}

/// A profile update. `None` fields keep their current value; a blank string
/// in `phone` or `avatar_url` clears the field.
#[derive(Debug, Default)]
pub struct ProfileUpdate<'a> {
    pub username: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

/// Authentication service.
///
/// Handles account registration and password login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer account.
    ///
    /// Uniqueness is enforced by the insert itself rather than a
    /// check-then-insert, so two racing registrations cannot both win.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::InvalidUsername`, or
    /// `AuthError::WeakPassword` if a field fails validation.
    /// Returns `AuthError::UsernameTaken` or `AuthError::EmailTaken` if the
    /// account already exists.
    pub async fn register(&self, account: NewAccount<'_>) -> Result<User, AuthError> {
        let email = Email::parse(account.email)?;
        validate_username(account.username)?;
        validate_password(account.password)?;

        let password_hash = hash_password(account.password)?;

        let phone = account.phone.map(str::trim).filter(|p| !p.is_empty());
        let avatar_url = account.avatar_url.map(str::trim).filter(|u| !u.is_empty());

        let user = self
            .users
            .create(NewUser {
                username: account.username,
                email: &email,
                phone,
                password_hash: &password_hash,
                avatar_url,
                role: UserRole::Customer,
            })
            .await
            .map_err(|e| match e {
                // The violation message names the column, e.g. "users.email".
                RepositoryError::Conflict(msg) if msg.contains("email") => AuthError::EmailTaken,
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with a username or email plus password.
    ///
    /// The identifier is tried as a username first, then as an email. A
    /// missing account and a wrong password produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the identifier or password
    /// is wrong.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_auth_by_identifier(identifier.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update a user's profile. Email is not updatable.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    /// Returns `AuthError::InvalidUsername` or `AuthError::UsernameTaken` if
    /// the new username fails validation or belongs to someone else.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate<'_>,
    ) -> Result<User, AuthError> {
        let current = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let username = match update.username {
            Some(name) => {
                validate_username(name)?;
                if self.users.username_taken_by_other(name, user_id).await? {
                    return Err(AuthError::UsernameTaken);
                }
                name.to_owned()
            }
            None => current.username,
        };
        let phone = normalize_optional(update.phone, current.phone);
        let avatar_url = normalize_optional(update.avatar_url, current.avatar_url);

        let user = self
            .users
            .update_profile(user_id, &username, phone.as_deref(), avatar_url.as_deref())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                // The rename raced another one past the pre-check.
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }
}

/// Apply the update semantics for an optional text field: absent keeps the
/// current value, blank clears it.
fn normalize_optional(update: Option<&str>, current: Option<String>) -> Option<String> {
    match update {
        Some(value) => {
            let value = value.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_owned())
            }
        }
        None => current,
    }
}

/// Validate username meets requirements.
fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.trim() != username {
        return Err(AuthError::InvalidUsername(
            "username cannot start or end with whitespace".to_owned(),
        ));
    }

    let length = username.chars().count();
    if length < MIN_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    if length > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id. Public so the CLI can reuse it when
/// creating admin accounts.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_rejects_short_and_long() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
        assert!(validate_username("collector42").is_ok());
    }

    #[test]
    fn test_validate_username_rejects_surrounding_whitespace() {
        assert!(validate_username(" padded").is_err());
        assert!(validate_username("padded ").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_normalize_optional_field_semantics() {
        // Absent keeps the current value
        assert_eq!(
            normalize_optional(None, Some("0901".to_owned())),
            Some("0901".to_owned())
        );
        // Blank clears it
        assert_eq!(normalize_optional(Some("  "), Some("0901".to_owned())), None);
        // Present replaces it, trimmed
        assert_eq!(
            normalize_optional(Some(" 0902 "), Some("0901".to_owned())),
            Some("0902".to_owned())
        );
    }
}
