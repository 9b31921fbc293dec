//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use curio_core::{Email, UserId, UserRole};

/// A registered account (domain type).
///
/// The password hash deliberately lives outside this struct so it can never
/// leak through a serialized response; see
/// [`crate::db::UserRepository::get_auth_by_identifier`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique across accounts.
    pub username: String,
    /// User's email address, also unique.
    pub email: Email,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Optional avatar image URL.
    pub avatar_url: Option<String>,
    /// Permission level.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
