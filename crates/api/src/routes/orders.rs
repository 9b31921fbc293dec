//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use curio_core::UserId;

use crate::error::Result;
use crate::middleware::{RequireUser, ensure_same_user};
use crate::services::{Checkout, CheckoutItem, OrderService, OrderView};
use crate::state::AppState;

/// Request body for checkout. A client-sent `shippingFee` field, if any, is
/// ignored; the fee always comes from the server-side calculator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub cart_items: Vec<CheckoutItem>,
    pub shipping_address: String,
    pub selected_province: String,
    pub phone_number: String,
}

/// Place an order from the submitted item list.
///
/// # Errors
///
/// Returns 400 for an empty list or non-positive quantity, 404 for a missing
/// product, 409 when stock can't cover a line.
pub async fn create_order(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(user_id): Path<UserId>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    ensure_same_user(&current, user_id)?;

    let view = OrderService::new(state.pool())
        .checkout(Checkout {
            user_id,
            items: &body.cart_items,
            shipping_address: &body.shipping_address,
            province: &body.selected_province,
            phone_number: &body.phone_number,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// List the user's placed orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireUser(current): RequireUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<OrderView>>> {
    ensure_same_user(&current, user_id)?;

    let views = OrderService::new(state.pool()).list_orders(user_id).await?;
    Ok(Json(views))
}
