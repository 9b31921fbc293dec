//! Figure line (group) route handlers.
//!
//! Reads are public; writes require an admin session.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use curio_core::GroupId;

use crate::db::GroupRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Group;
use crate::state::AppState;

/// Request body for creating or replacing a group.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPayload {
    pub name: String,
    pub logo_image_url: Option<String>,
}

/// List all groups.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Group>>> {
    let groups = GroupRepository::new(state.pool()).list().await?;
    Ok(Json(groups))
}

/// Get a single group.
pub async fn get(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Group>> {
    let group = GroupRepository::new(state.pool())
        .get_by_id(group_id)
        .await?
        .ok_or_else(|| AppError::NotFound("group not found".to_owned()))?;
    Ok(Json(group))
}

/// Create a group (admin only).
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<GroupPayload>,
) -> Result<(StatusCode, Json<Group>)> {
    let name = validated_name(&body)?;
    let group = GroupRepository::new(state.pool())
        .create(name, body.logo_image_url.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// Replace a group's fields (admin only).
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Json(body): Json<GroupPayload>,
) -> Result<Json<Group>> {
    let name = validated_name(&body)?;
    let group = GroupRepository::new(state.pool())
        .update(group_id, name, body.logo_image_url.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("group not found".to_owned()))?;
    Ok(Json(group))
}

/// Delete a group (admin only). Its products are detached, not removed.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> Result<StatusCode> {
    let deleted = GroupRepository::new(state.pool()).delete(group_id).await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("group not found".to_owned()))
    }
}

fn validated_name(payload: &GroupPayload) -> Result<&str> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }
    Ok(name)
}
