//! User repository for database operations.
//!
//! Queries use the runtime sqlx API with explicit row structs; stored emails
//! and roles are re-validated on the way out and surface as
//! [`RepositoryError::DataCorruption`] when they no longer parse.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use curio_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

/// Row shape shared by the user queries. The password hash is excluded; auth
/// queries use [`UserAuthRow`] instead.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    email: String,
    phone: Option<String>,
    avatar_url: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            username: row.username,
            email,
            phone: row.phone,
            avatar_url: row.avatar_url,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// User row plus credentials, for login lookups.
#[derive(Debug, sqlx::FromRow)]
struct UserAuthRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Fields required to insert a user.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a Email,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
    pub avatar_url: Option<&'a str>,
    pub role: UserRole,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Check whether a user with this ID exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, phone, avatar_url, role, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their login name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, phone, avatar_url, role, created_at, updated_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Look up a user and their password hash by username or, failing that,
    /// by email. This is the login path: the identifier field accepts either.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_auth_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let by_username = sqlx::query_as::<_, UserAuthRow>(
            r#"
            SELECT id, username, email, phone, avatar_url, role, created_at, updated_at,
                   password_hash
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(identifier)
        .fetch_optional(self.pool)
        .await?;

        let row = match by_username {
            Some(row) => Some(row),
            None => {
                sqlx::query_as::<_, UserAuthRow>(
                    r#"
                    SELECT id, username, email, phone, avatar_url, role, created_at, updated_at,
                           password_hash
                    FROM users
                    WHERE email = ?1
                    "#,
                )
                .bind(identifier)
                .fetch_optional(self.pool)
                .await?
            }
        };

        match row {
            Some(r) => {
                let user = User::try_from(r.user)?;
                Ok(Some((user, r.password_hash)))
            }
            None => Ok(None),
        }
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is already
    /// taken; the message names the violated column.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: NewUser<'_>) -> Result<User, RepositoryError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, phone, password_hash, avatar_url, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING id, username, email, phone, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(user.username)
        .bind(user.email.as_str())
        .bind(user.phone)
        .bind(user.password_hash)
        .bind(user.avatar_url)
        .bind(user.role.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                // The message names the violated column, e.g.
                // "UNIQUE constraint failed: users.email".
                return RepositoryError::Conflict(db_err.message().to_owned());
            }
            RepositoryError::Database(e)
        })?;

        User::try_from(row)
    }

    /// Check whether a username belongs to a different user. Used to validate
    /// profile renames.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_taken_by_other(
        &self,
        username: &str,
        id: UserId,
    ) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1 AND id != ?2)
            "#,
        )
        .bind(username)
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Update a user's profile fields. Email is deliberately not updatable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the username is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        username: &str,
        phone: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET username = ?2, phone = ?3, avatar_url = ?4, updated_at = ?5
            WHERE id = ?1
            RETURNING id, username, email, phone, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(phone)
        .bind(avatar_url)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(db_err.message().to_owned());
            }
            RepositoryError::Database(e)
        })?;

        match row {
            Some(r) => User::try_from(r),
            None => Err(RepositoryError::NotFound),
        }
    }
}
