//! Order and cart repository.
//!
//! Carts and orders share the `orders` table; a cart is the row with status
//! `CART`. The pool-backed [`OrderRepository`] serves reads, while the free
//! functions here run on an open transaction's connection so the cart and
//! checkout engines can compose them atomically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use curio_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: String,
    order_date: DateTime<Utc>,
    order_code: Option<String>,
    subtotal: String,
    shipping_fee: String,
    total_amount: String,
    shipping_address: Option<String>,
    phone_number: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status,
            order_date: row.order_date,
            order_code: row.order_code,
            subtotal: super::parse_decimal(&row.subtotal, "orders.subtotal")?,
            shipping_fee: super::parse_decimal(&row.shipping_fee, "orders.shipping_fee")?,
            total_amount: super::parse_decimal(&row.total_amount, "orders.total_amount")?,
            shipping_address: row.shipping_address,
            phone_number: row.phone_number,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    quantity: i64,
    unit_price: String,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: super::parse_decimal(&row.unit_price, "order_items.unit_price")?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JoinedItemRow {
    id: OrderItemId,
    product_id: Option<ProductId>,
    quantity: i64,
    unit_price: String,
    product_name: Option<String>,
    image_url: Option<String>,
    stock_quantity: Option<i64>,
}

/// A line item joined with its product's current details. The product fields
/// are `None` once the product has been deleted; the snapshot price and
/// quantity always survive.
#[derive(Debug, Clone)]
pub struct LineItemDetail {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub product_name: Option<String>,
    pub image_url: Option<String>,
    pub stock_quantity: Option<i64>,
}

impl TryFrom<JoinedItemRow> for LineItemDetail {
    type Error = RepositoryError;

    fn try_from(row: JoinedItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: super::parse_decimal(&row.unit_price, "order_items.unit_price")?,
            product_name: row.product_name,
            image_url: row.image_url,
            stock_quantity: row.stock_quantity,
        })
    }
}

/// Fields required to insert a placed order at checkout.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub order_code: &'a str,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total_amount: Decimal,
    pub shipping_address: &'a str,
    pub phone_number: &'a str,
}

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the user's open cart, if one exists. Never creates one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, order_date, order_code, subtotal, shipping_fee,
                   total_amount, shipping_address, phone_number, updated_at
            FROM orders
            WHERE user_id = ?1 AND status = ?2
            "#,
        )
        .bind(user_id)
        .bind(OrderStatus::Cart.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// List a user's placed orders (everything except the cart), newest
    /// first with the row ID as tiebreak.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, status, order_date, order_code, subtotal, shipping_fee,
                   total_amount, shipping_address, phone_number, updated_at
            FROM orders
            WHERE user_id = ?1 AND status != ?2
            ORDER BY order_date DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(OrderStatus::Cart.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// List an order's line items with current product details joined in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list_items(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<LineItemDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, JoinedItemRow>(
            r#"
            SELECT oi.id, oi.product_id, oi.quantity, oi.unit_price,
                   p.name AS product_name, p.image_url, p.stock_quantity
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ?1
            ORDER BY oi.id
            "#,
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(LineItemDetail::try_from).collect()
    }
}

// ============================================================================
// Transaction-scoped operations
// ============================================================================

/// Find the user's open cart on an open transaction's connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if stored data is invalid.
pub async fn find_cart(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT id, user_id, status, order_date, order_code, subtotal, shipping_fee,
               total_amount, shipping_address, phone_number, updated_at
        FROM orders
        WHERE user_id = ?1 AND status = ?2
        "#,
    )
    .bind(user_id)
    .bind(OrderStatus::Cart.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Order::try_from).transpose()
}

/// Create an empty cart for the user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if stored data is invalid.
pub async fn create_cart(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<Order, RepositoryError> {
    let now = Utc::now();

    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        INSERT INTO orders (user_id, status, order_date, subtotal, shipping_fee,
                            total_amount, updated_at)
        VALUES (?1, ?2, ?3, '0', '0', '0', ?4)
        RETURNING id, user_id, status, order_date, order_code, subtotal, shipping_fee,
                  total_amount, shipping_address, phone_number, updated_at
        "#,
    )
    .bind(user_id)
    .bind(OrderStatus::Cart.as_str())
    .bind(now)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Order::try_from(row)
}

/// Find a line item by its ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if stored data is invalid.
pub async fn find_item(
    conn: &mut SqliteConnection,
    item_id: OrderItemId,
) -> Result<Option<OrderItem>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price
        FROM order_items
        WHERE id = ?1
        "#,
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(OrderItem::try_from).transpose()
}

/// Find the line for a product within an order, used to merge repeat adds.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if stored data is invalid.
pub async fn find_item_for_product(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    product_id: ProductId,
) -> Result<Option<OrderItem>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price
        FROM order_items
        WHERE order_id = ?1 AND product_id = ?2
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(OrderItem::try_from).transpose()
}

/// Insert a line item with a snapshot unit price.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if stored data is invalid.
pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    unit_price: Decimal,
) -> Result<OrderItem, RepositoryError> {
    let row = sqlx::query_as::<_, OrderItemRow>(
        r#"
        INSERT INTO order_items (order_id, product_id, quantity, unit_price)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, order_id, product_id, quantity, unit_price
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price.to_string())
    .fetch_one(&mut *conn)
    .await?;

    OrderItem::try_from(row)
}

/// Set a line item's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the item doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn update_item_quantity(
    conn: &mut SqliteConnection,
    item_id: OrderItemId,
    quantity: i64,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE order_items
        SET quantity = ?2
        WHERE id = ?1
        "#,
    )
    .bind(item_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Delete a line item. The parent order stays, even when emptied.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the item doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn delete_item(
    conn: &mut SqliteConnection,
    item_id: OrderItemId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        DELETE FROM order_items
        WHERE id = ?1
        "#,
    )
    .bind(item_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Sum an order's line subtotals in Rust; prices are TEXT in `SQLite`, so a
/// SQL SUM would coerce through floats.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
pub async fn items_subtotal(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Decimal, RepositoryError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT quantity, unit_price
        FROM order_items
        WHERE order_id = ?1
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut subtotal = Decimal::ZERO;
    for (quantity, unit_price) in rows {
        let unit_price = super::parse_decimal(&unit_price, "order_items.unit_price")?;
        subtotal += unit_price * Decimal::from(quantity);
    }

    Ok(subtotal)
}

/// Refresh a cart's stored totals. A cart carries no shipping fee, so the
/// total mirrors the subtotal until checkout.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update_cart_totals(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    subtotal: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        UPDATE orders
        SET subtotal = ?2, total_amount = ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(order_id)
    .bind(subtotal.to_string())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Delete the user's cart and its items with explicit statements, items
/// first. Returns `false` if there was no cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn delete_cart(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<bool, RepositoryError> {
    let Some(cart) = find_cart(&mut *conn, user_id).await? else {
        return Ok(false);
    };

    sqlx::query(
        r#"
        DELETE FROM order_items
        WHERE order_id = ?1
        "#,
    )
    .bind(cart.id)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(cart.id)
    .execute(&mut *conn)
    .await?;

    Ok(true)
}

/// Insert a placed order in the `PENDING` state.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order code is already taken;
/// the caller regenerates and retries.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert_order(
    conn: &mut SqliteConnection,
    order: NewOrder<'_>,
    now: DateTime<Utc>,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        INSERT INTO orders (user_id, status, order_date, order_code, subtotal,
                            shipping_fee, total_amount, shipping_address, phone_number,
                            updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        RETURNING id, user_id, status, order_date, order_code, subtotal, shipping_fee,
                  total_amount, shipping_address, phone_number, updated_at
        "#,
    )
    .bind(order.user_id)
    .bind(OrderStatus::Pending.as_str())
    .bind(now)
    .bind(order.order_code)
    .bind(order.subtotal.to_string())
    .bind(order.shipping_fee.to_string())
    .bind(order.total_amount.to_string())
    .bind(order.shipping_address)
    .bind(order.phone_number)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("order code already exists".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    Order::try_from(row)
}
