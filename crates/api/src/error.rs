//! Unified error handling for the API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CartError, OrderError};

/// Convenience alias for handler results.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-level error type.
///
/// Service errors convert into this at the handler boundary; the variant
/// picks the status code and the payload carries the message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("{0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Request lost to current state (stock, duplicate account).
    #[error("{0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        let message = err.to_string();
        match err {
            CartError::InvalidQuantity => Self::BadRequest(message),
            CartError::UserNotFound
            | CartError::ProductNotFound
            | CartError::CartNotFound
            | CartError::ItemNotFound => Self::NotFound(message),
            CartError::NotCartOwner => Self::Forbidden(message),
            CartError::InsufficientStock { .. } => Self::Conflict(message),
            CartError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::EmptyOrder | OrderError::InvalidQuantity => Self::BadRequest(message),
            OrderError::UserNotFound | OrderError::ProductNotFound => Self::NotFound(message),
            OrderError::InsufficientStock { .. } => Self::Conflict(message),
            OrderError::OrderCodeExhausted => Self::Internal(message),
            OrderError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session store error: {err}"))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidEmail(_)
            | AuthError::InvalidUsername(_)
            | AuthError::WeakPassword(_) => Self::BadRequest(message),
            AuthError::InvalidCredentials | AuthError::UserNotFound => Self::Unauthorized(message),
            AuthError::UsernameTaken | AuthError::EmailTaken => Self::Conflict(message),
            AuthError::PasswordHash => Self::Internal(message),
            AuthError::Repository(e) => Self::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "Request failed");
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        };

        // Don't expose internal error details to clients
        let message = match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::BadRequest(m)
            | Self::Conflict(m) => m,
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_owned())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cart_error_mapping() {
        assert_eq!(
            get_status(
                CartError::InsufficientStock {
                    product_name: "Miku".to_owned(),
                    requested: 12,
                    available: 5,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CartError::NotCartOwner.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(CartError::ItemNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::InvalidQuantity.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_order_error_mapping() {
        assert_eq!(
            get_status(OrderError::EmptyOrder.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(OrderError::OrderCodeExhausted.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::EmailTaken.into()),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_client_errors_keep_their_message() {
        let response = AppError::NotFound("product not found".to_owned()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "product not found");
    }

    #[tokio::test]
    async fn test_internal_errors_are_masked() {
        let response = AppError::Database(RepositoryError::NotFound).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Internal server error");
    }
}
