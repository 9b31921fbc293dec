//! Cart route handlers.
//!
//! All of them require the session user to match the path user.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use curio_core::{OrderItemId, ProductId, UserId};

use crate::error::Result;
use crate::middleware::{RequireUser, ensure_same_user};
use crate::services::{CartService, CartView};
use crate::state::AppState;

/// Request body for adding a product to the cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Request body for setting a cart line's quantity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Get the user's cart.
pub async fn get_cart(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<CartView>> {
    ensure_same_user(&current, user_id)?;

    let view = CartService::new(state.pool()).get_cart(user_id).await?;
    Ok(Json(view))
}

/// Add a product to the cart, merging with an existing line for the same
/// product.
///
/// # Errors
///
/// Returns 409 when stock can't cover the requested quantity.
pub async fn add_item(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(user_id): Path<UserId>,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    ensure_same_user(&current, user_id)?;

    let view = CartService::new(state.pool())
        .add_item(user_id, body.product_id, body.quantity)
        .await?;
    Ok(Json(view))
}

/// Set a cart line to an absolute quantity.
pub async fn update_item(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path((user_id, item_id)): Path<(UserId, OrderItemId)>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    ensure_same_user(&current, user_id)?;

    let view = CartService::new(state.pool())
        .update_item_quantity(user_id, item_id, body.quantity)
        .await?;
    Ok(Json(view))
}

/// Remove a line from the cart.
pub async fn remove_item(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path((user_id, item_id)): Path<(UserId, OrderItemId)>,
) -> Result<Json<CartView>> {
    ensure_same_user(&current, user_id)?;

    let view = CartService::new(state.pool())
        .remove_item(user_id, item_id)
        .await?;
    Ok(Json(view))
}

/// Delete the cart outright. Succeeds even when there is no cart.
pub async fn clear_cart(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode> {
    ensure_same_user(&current, user_id)?;

    CartService::new(state.pool()).clear_cart(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
