//! Order service.
//!
//! Checkout turns a client-declared item list into a `PENDING` order inside
//! one transaction: stock is claimed per line with a conditional decrement,
//! prices are snapshotted, the order code is generated with in-transaction
//! collision retry, and the user's cart is cleared. Any failure rolls the
//! whole thing back.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use curio_core::{OrderId, OrderStatus, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::{self, LineItemDetail, NewOrder, OrderRepository};
use crate::db::products;
use crate::db::users::UserRepository;
use crate::models::Order;
use crate::services::shipping;

/// Display name for an order line whose product has since been deleted.
const MISSING_PRODUCT_NAME: &str = "N/A";

/// Order codes look like `ORD-20260810-K7WQ2N`. The suffix alphabet omits
/// easily-confused characters (I, O, 0, 1).
const ORDER_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ORDER_CODE_SUFFIX_LENGTH: usize = 6;
const MAX_ORDER_CODE_ATTEMPTS: usize = 5;

/// Errors that can occur during order operations.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("order must contain at least one item")]
    EmptyOrder,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("user not found")]
    UserNotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("not enough stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_name: String,
        requested: i64,
        available: i64,
    },

    #[error("could not generate a unique order code")]
    OrderCodeExhausted,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One line of a checkout request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Parameters for placing an order.
pub struct Checkout<'a> {
    pub user_id: UserId,
    pub items: &'a [CheckoutItem],
    pub shipping_address: &'a str,
    pub province: &'a str,
    pub phone_number: &'a str,
}

/// An order line as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub image_url: Option<String>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl From<LineItemDetail> for OrderItemView {
    fn from(item: LineItemDetail) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item
                .product_name
                .unwrap_or_else(|| MISSING_PRODUCT_NAME.to_owned()),
            image_url: item.image_url,
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal: item.unit_price * Decimal::from(item.quantity),
        }
    }
}

/// A placed order as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub order_date: DateTime<Utc>,
    pub order_code: Option<String>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub grand_total: Decimal,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    fn from_parts(order: Order, items: Vec<OrderItemView>) -> Self {
        Self {
            id: order.id,
            order_date: order.order_date,
            order_code: order.order_code,
            subtotal: order.subtotal,
            shipping_fee: order.shipping_fee,
            grand_total: order.total_amount,
            status: order.status,
            shipping_address: order.shipping_address,
            phone_number: order.phone_number,
            items,
        }
    }
}

/// A line successfully claimed during checkout, kept so the response view
/// can be built without re-reading the rows just written.
struct ClaimedLine {
    product_id: ProductId,
    quantity: i64,
    unit_price: Decimal,
    product_name: String,
    image_url: Option<String>,
}

/// Order service.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order from a client-declared item list.
    ///
    /// The list is never trusted: every price comes from the catalog and
    /// every quantity is claimed against live stock. Two concurrent
    /// checkouts of the same last unit can't both succeed, the conditional
    /// decrement admits exactly one.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyOrder` or `OrderError::InvalidQuantity` if
    /// the list is empty or carries a quantity below 1.
    /// Returns `OrderError::UserNotFound` or `OrderError::ProductNotFound`
    /// if a referenced resource doesn't exist.
    /// Returns `OrderError::InsufficientStock` if any line can't be covered.
    /// Returns `OrderError::OrderCodeExhausted` if code generation keeps
    /// colliding.
    #[instrument(skip(self, checkout), fields(user_id = %checkout.user_id, lines = checkout.items.len()))]
    pub async fn checkout(&self, checkout: Checkout<'_>) -> Result<OrderView, OrderError> {
        if checkout.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if checkout.items.iter().any(|item| item.quantity < 1) {
            return Err(OrderError::InvalidQuantity);
        }
        self.ensure_user(checkout.user_id).await?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let mut subtotal = Decimal::ZERO;
        let mut lines = Vec::with_capacity(checkout.items.len());
        for item in checkout.items {
            let claimed = products::claim_stock(&mut tx, item.product_id, item.quantity).await?;
            let Some(product) = claimed else {
                // The claim finds nothing both when the product is gone and
                // when stock can't cover the line; a plain read tells which.
                return match products::fetch_by_id(&mut tx, item.product_id).await? {
                    Some(product) => Err(OrderError::InsufficientStock {
                        product_name: product.name,
                        requested: item.quantity,
                        available: product.stock_quantity,
                    }),
                    None => Err(OrderError::ProductNotFound),
                };
            };

            subtotal += product.price * Decimal::from(item.quantity);
            lines.push(ClaimedLine {
                product_id: product.id,
                quantity: item.quantity,
                unit_price: product.price,
                product_name: product.name,
                image_url: product.image_url,
            });
        }

        let shipping_fee = shipping::fee(checkout.province);
        let total_amount = subtotal + shipping_fee;

        let now = Utc::now();
        let mut placed = None;
        // A unique violation aborts only the failed statement, so retrying
        // with a fresh code inside the same transaction is safe.
        for _ in 0..MAX_ORDER_CODE_ATTEMPTS {
            let code = generate_order_code(now);
            match orders::insert_order(
                &mut tx,
                NewOrder {
                    user_id: checkout.user_id,
                    order_code: &code,
                    subtotal,
                    shipping_fee,
                    total_amount,
                    shipping_address: checkout.shipping_address,
                    phone_number: checkout.phone_number,
                },
                now,
            )
            .await
            {
                Ok(order) => {
                    placed = Some(order);
                    break;
                }
                Err(RepositoryError::Conflict(_)) => {
                    warn!(user_id = %checkout.user_id, "Order code collision, regenerating");
                }
                Err(other) => return Err(other.into()),
            }
        }
        let order = placed.ok_or(OrderError::OrderCodeExhausted)?;

        for line in &lines {
            orders::insert_item(&mut tx, order.id, line.product_id, line.quantity, line.unit_price)
                .await?;
        }

        orders::delete_cart(&mut tx, checkout.user_id).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            user_id = %checkout.user_id,
            order_id = %order.id,
            order_code = order.order_code.as_deref().unwrap_or(""),
            total = %order.total_amount,
            "Order placed"
        );

        let items = lines
            .into_iter()
            .map(|line| OrderItemView {
                product_id: Some(line.product_id),
                product_name: line.product_name,
                image_url: line.image_url,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.unit_price * Decimal::from(line.quantity),
            })
            .collect();

        Ok(OrderView::from_parts(order, items))
    }

    /// List the user's placed orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UserNotFound` if the user doesn't exist.
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<OrderView>, OrderError> {
        self.ensure_user(user_id).await?;

        let repo = OrderRepository::new(self.pool);
        let placed = repo.list_for_user(user_id).await?;

        let mut views = Vec::with_capacity(placed.len());
        for order in placed {
            let items = repo
                .list_items(order.id)
                .await?
                .into_iter()
                .map(OrderItemView::from)
                .collect();
            views.push(OrderView::from_parts(order, items));
        }

        Ok(views)
    }

    async fn ensure_user(&self, user_id: UserId) -> Result<(), OrderError> {
        if UserRepository::new(self.pool).exists(user_id).await? {
            Ok(())
        } else {
            Err(OrderError::UserNotFound)
        }
    }
}

/// Generate a date-stamped order code with a random suffix.
fn generate_order_code(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_CODE_SUFFIX_LENGTH)
        .filter_map(|_| ORDER_CODE_ALPHABET.choose(&mut rng))
        .map(|b| char::from(*b))
        .collect();

    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}
