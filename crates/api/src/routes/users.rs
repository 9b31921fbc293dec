//! User profile route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use curio_core::UserId;

use crate::error::Result;
use crate::middleware::{RequireUser, ensure_same_user};
use crate::models::User;
use crate::services::{AuthService, ProfileUpdate};
use crate::state::AppState;

/// Request body for a profile update. Absent fields keep their current
/// value; a blank `phone` or `avatarUrl` clears the field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// Get the user's profile.
///
/// # Errors
///
/// Returns 403 when the session user doesn't match the path user.
pub async fn get_profile(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>> {
    ensure_same_user(&current, user_id)?;

    let user = AuthService::new(state.pool()).get_user(user_id).await?;
    Ok(Json(user))
}

/// Update the user's profile.
///
/// # Errors
///
/// Returns 403 when the session user doesn't match the path user, 400 for an
/// invalid username, 409 when the username belongs to someone else.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(user_id): Path<UserId>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    ensure_same_user(&current, user_id)?;

    let user = AuthService::new(state.pool())
        .update_profile(
            user_id,
            ProfileUpdate {
                username: body.username.as_deref(),
                phone: body.phone.as_deref(),
                avatar_url: body.avatar_url.as_deref(),
            },
        )
        .await?;

    Ok(Json(user))
}
