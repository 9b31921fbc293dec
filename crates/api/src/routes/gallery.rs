//! Community gallery route handlers.
//!
//! The feed is public; posting requires a session. Posts denormalize the
//! poster's username and avatar at creation time, so later profile edits
//! don't rewrite the feed.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::db::GalleryRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::GalleryPost;
use crate::services::AuthService;
use crate::state::AppState;

/// Request body for creating a gallery post.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub image_url: String,
    pub caption: Option<String>,
}

/// List all gallery posts, newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<GalleryPost>>> {
    let posts = GalleryRepository::new(state.pool()).list().await?;
    Ok(Json(posts))
}

/// Create a gallery post as the signed-in user.
pub async fn create(
    RequireUser(current): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<GalleryPost>)> {
    let image_url = body.image_url.trim();
    if image_url.is_empty() {
        return Err(AppError::BadRequest("imageUrl is required".to_owned()));
    }

    // Snapshot the poster's profile as it stands right now.
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    let post = GalleryRepository::new(state.pool())
        .create(
            current.id,
            image_url,
            body.caption.as_deref().map(str::trim).filter(|c| !c.is_empty()),
            &user.username,
            user.avatar_url.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}
