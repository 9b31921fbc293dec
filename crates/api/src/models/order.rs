//! Order domain types.
//!
//! An [`Order`] row serves two purposes: a user's open cart (status
//! [`OrderStatus::Cart`]) and every placed order thereafter. These types are
//! internal; the API responds with the view types in [`crate::services`],
//! which join in product details and fallbacks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use curio_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// An order row (domain type).
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Cart creation time while in the cart state; placement time afterwards.
    pub order_date: DateTime<Utc>,
    /// Human-facing unique code, assigned at checkout.
    pub order_code: Option<String>,
    /// Sum of line subtotals.
    pub subtotal: Decimal,
    /// Flat delivery fee from the shipping tiers; zero while a cart.
    pub shipping_fee: Decimal,
    /// `subtotal + shipping_fee`.
    pub total_amount: Decimal,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A line item belonging to an order.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the referenced product has been deleted.
    pub product_id: Option<ProductId>,
    pub quantity: i64,
    /// Product price captured when the line was added; later catalog price
    /// changes do not touch it.
    pub unit_price: Decimal,
}
