//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in (or admin) user in route
//! handlers, plus helpers for the session round-trip.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use curio_core::UserId;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

/// Extractor that requires a logged-in admin.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when a request lacks the required session user.
pub enum AuthRejection {
    /// No session user at all.
    Unauthorized,
    /// Session user exists but lacks the admin role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => {
                AppError::Unauthorized("authentication required".to_owned()).into_response()
            }
            Self::Forbidden => {
                AppError::Forbidden("admin access required".to_owned()).into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::Unauthorized)?;

        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

/// Require that the session user matches the user addressed by the path.
///
/// # Errors
///
/// Returns `AppError::Forbidden` on mismatch.
pub fn ensure_same_user(current: &CurrentUser, path_user: UserId) -> Result<(), AppError> {
    if current.id == path_user {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "cannot access another user's resources".to_owned(),
        ))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::UserRole;

    #[test]
    fn test_ensure_same_user() {
        let current = CurrentUser {
            id: UserId::new(1),
            username: "collector".to_owned(),
            role: UserRole::Customer,
        };

        assert!(ensure_same_user(&current, UserId::new(1)).is_ok());
        assert!(matches!(
            ensure_same_user(&current, UserId::new(2)),
            Err(AppError::Forbidden(_))
        ));
    }
}
