//! Catalog product domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use curio_core::{GroupId, ProductId};

/// A sellable collectible figure (domain type).
///
/// Doubles as the API response shape; `price` serializes as a decimal string
/// (e.g. `"20.00"`) so cents survive the wire exactly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Figure line this product belongs to, if any.
    pub group_id: Option<GroupId>,
    /// Release or sculpt version label.
    pub version: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    /// Units on hand; never negative.
    pub stock_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
