//! Product catalog route handlers.
//!
//! Reads are public; writes require an admin session.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use curio_core::{GroupId, ProductId};

use crate::db::{GroupRepository, NewProduct, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub group_id: Option<GroupId>,
}

/// Request body for creating or replacing a product.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub group_id: Option<GroupId>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: i64,
}

/// List products, optionally filtered to one group.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(query.group_id)
        .await?;
    Ok(Json(products))
}

/// Get a single product.
pub async fn get(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;
    Ok(Json(product))
}

/// Create a product (admin only).
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    validate_payload(&body)?;
    ensure_group_exists(&state, body.group_id).await?;

    let product = ProductRepository::new(state.pool())
        .create(to_new_product(&body))
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields (admin only).
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(body): Json<ProductPayload>,
) -> Result<Json<Product>> {
    validate_payload(&body)?;
    ensure_group_exists(&state, body.group_id).await?;

    let product = ProductRepository::new(state.pool())
        .update(product_id, to_new_product(&body))
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;
    Ok(Json(product))
}

/// Delete a product (admin only). Historical order lines keep their snapshot.
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    let deleted = ProductRepository::new(state.pool())
        .delete(product_id)
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("product not found".to_owned()))
    }
}

fn validate_payload(payload: &ProductPayload) -> Result<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_owned()));
    }
    if payload.price < Decimal::ZERO {
        return Err(AppError::BadRequest("price cannot be negative".to_owned()));
    }
    if payload.stock_quantity < 0 {
        return Err(AppError::BadRequest(
            "stock quantity cannot be negative".to_owned(),
        ));
    }
    Ok(())
}

async fn ensure_group_exists(state: &AppState, group_id: Option<GroupId>) -> Result<()> {
    if let Some(group_id) = group_id {
        let exists = GroupRepository::new(state.pool())
            .get_by_id(group_id)
            .await?
            .is_some();
        if !exists {
            return Err(AppError::BadRequest("group does not exist".to_owned()));
        }
    }
    Ok(())
}

fn to_new_product(payload: &ProductPayload) -> NewProduct<'_> {
    NewProduct {
        name: payload.name.trim(),
        group_id: payload.group_id,
        version: payload.version.as_deref(),
        description: payload.description.as_deref(),
        price: payload.price,
        image_url: payload.image_url.as_deref(),
        stock_quantity: payload.stock_quantity,
    }
}
