//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::{RequireUser, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthService, NewAccount};
use crate::state::AppState;

/// Request body for registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub avatar_url: Option<String>,
}

/// Request body for login. `identifier` is a username or an email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Register a new customer account and log it in.
///
/// # Errors
///
/// Returns 400 for invalid fields, 409 when the username or email is taken.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(NewAccount {
            username: &body.username,
            email: &body.email,
            phone: body.phone.as_deref(),
            password: &body.password,
            avatar_url: body.avatar_url.as_deref(),
        })
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with a username or email plus password.
///
/// # Errors
///
/// Returns 401 for a wrong identifier/password pair.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&body.identifier, &body.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;

    Ok(Json(user))
}

/// Logout. Clearing an already-anonymous session is a no-op.
///
/// # Errors
///
/// Returns 500 if the session store fails.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current session user, read fresh from the database.
///
/// # Errors
///
/// Returns 401 when unauthenticated or when the account no longer exists.
pub async fn me(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    Ok(Json(user))
}
