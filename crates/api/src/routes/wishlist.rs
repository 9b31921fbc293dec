//! Wishlist route handlers.
//!
//! All endpoints live under `/api/users/{user_id}/wishlist` and are
//! restricted to the session owner.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use curio_core::{ProductId, UserId};

use crate::db::{ProductRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireUser, ensure_same_user};
use crate::models::Product;
use crate::state::AppState;

/// List the user's wishlisted products.
pub async fn list(
    RequireUser(current): RequireUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Product>>> {
    ensure_same_user(&current, user_id)?;

    let products = WishlistRepository::new(state.pool()).list(user_id).await?;
    Ok(Json(products))
}

/// Add a product to the wishlist. Adding it twice is a no-op.
pub async fn add(
    RequireUser(current): RequireUser,
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(UserId, ProductId)>,
) -> Result<Json<Product>> {
    ensure_same_user(&current, user_id)?;

    let product = ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;

    WishlistRepository::new(state.pool())
        .add(user_id, product_id)
        .await?;
    Ok(Json(product))
}

/// Remove a product from the wishlist.
pub async fn remove(
    RequireUser(current): RequireUser,
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(UserId, ProductId)>,
) -> Result<StatusCode> {
    ensure_same_user(&current, user_id)?;

    let removed = WishlistRepository::new(state.pool())
        .remove(user_id, product_id)
        .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("wishlist entry not found".to_owned()))
    }
}
