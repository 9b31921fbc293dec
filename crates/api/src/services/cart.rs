//! Cart service.
//!
//! Each user has at most one open cart, stored as an order in the `CART`
//! state. Every mutation runs in a single transaction that also refreshes
//! the cart's stored totals, so readers never observe a cart whose totals
//! disagree with its lines.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use curio_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::{self, LineItemDetail, OrderRepository};
use crate::db::products;
use crate::db::users::UserRepository;
use crate::models::Order;

/// Display name for a line whose product has since been deleted.
const DELETED_PRODUCT_NAME: &str = "Product no longer available";

/// Errors that can occur during cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("user not found")]
    UserNotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("cart not found")]
    CartNotFound,

    #[error("cart item not found")]
    ItemNotFound,

    #[error("cart item belongs to another user")]
    NotCartOwner,

    #[error("not enough stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_name: String,
        requested: i64,
        available: i64,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A cart line as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub line_item_id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i64,
    /// Current stock of the underlying product, 0 once it is deleted.
    pub stock_quantity: i64,
}

impl From<LineItemDetail> for CartItemView {
    fn from(item: LineItemDetail) -> Self {
        Self {
            line_item_id: item.id,
            product_id: item.product_id,
            product_name: item
                .product_name
                .unwrap_or_else(|| DELETED_PRODUCT_NAME.to_owned()),
            image_url: item.image_url,
            unit_price: item.unit_price,
            quantity: item.quantity,
            stock_quantity: item.stock_quantity.unwrap_or(0),
        }
    }
}

/// A user's cart as served to clients. `order_id` is `None` for a user who
/// has never put anything in their cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub order_id: Option<OrderId>,
    pub user_id: UserId,
    pub items: Vec<CartItemView>,
    pub total_quantity: i64,
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

impl CartView {
    fn empty(user_id: UserId) -> Self {
        Self {
            order_id: None,
            user_id,
            items: Vec::new(),
            total_quantity: 0,
            total_amount: Decimal::ZERO,
            status: OrderStatus::Cart,
        }
    }

    fn from_parts(cart: Order, items: Vec<LineItemDetail>) -> Self {
        let items: Vec<CartItemView> = items.into_iter().map(CartItemView::from).collect();
        let total_quantity = items.iter().map(|item| item.quantity).sum();

        Self {
            order_id: Some(cart.id),
            user_id: cart.user_id,
            items,
            total_quantity,
            total_amount: cart.total_amount,
            status: cart.status,
        }
    }
}

/// Cart service.
///
/// Reads go straight to the pool; mutations open a transaction, adjust the
/// lines, recompute the totals, and commit.
pub struct CartService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the user's cart. A user without an open cart gets an empty view
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UserNotFound` if the user doesn't exist.
    /// Returns `CartError::Repository` if a query fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView, CartError> {
        self.ensure_user(user_id).await?;

        let repo = OrderRepository::new(self.pool);

        let Some(cart) = repo.get_cart(user_id).await? else {
            return Ok(CartView::empty(user_id));
        };
        let items = repo.list_items(cart.id).await?;

        Ok(CartView::from_parts(cart, items))
    }

    /// Add a product to the user's cart, creating the cart on first use.
    ///
    /// Adding a product already in the cart merges into the existing line;
    /// the stock check then covers the combined quantity. The line keeps the
    /// unit price snapshotted at first add.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity` is below 1.
    /// Returns `CartError::UserNotFound` or `CartError::ProductNotFound` if
    /// either side of the add doesn't exist.
    /// Returns `CartError::InsufficientStock` if the product can't cover the
    /// requested quantity.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        self.ensure_user(user_id).await?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let product = products::fetch_by_id(&mut tx, product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        if product.stock_quantity < quantity {
            return Err(CartError::InsufficientStock {
                product_name: product.name,
                requested: quantity,
                available: product.stock_quantity,
            });
        }

        let cart = match orders::find_cart(&mut tx, user_id).await? {
            Some(cart) => cart,
            None => orders::create_cart(&mut tx, user_id).await?,
        };

        if let Some(existing) = orders::find_item_for_product(&mut tx, cart.id, product_id).await? {
            let combined = existing.quantity + quantity;
            if product.stock_quantity < combined {
                return Err(CartError::InsufficientStock {
                    product_name: product.name,
                    requested: combined,
                    available: product.stock_quantity,
                });
            }
            orders::update_item_quantity(&mut tx, existing.id, combined).await?;
        } else {
            orders::insert_item(&mut tx, cart.id, product_id, quantity, product.price).await?;
        }

        let subtotal = orders::items_subtotal(&mut tx, cart.id).await?;
        orders::update_cart_totals(&mut tx, cart.id, subtotal).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        debug!(user_id = %user_id, product_id = %product_id, quantity, "Added item to cart");

        self.get_cart(user_id).await
    }

    /// Set a cart line to an absolute quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity` is below 1.
    /// Returns `CartError::ItemNotFound` or `CartError::CartNotFound` if
    /// either doesn't exist, and `CartError::NotCartOwner` if the line
    /// belongs to a different cart.
    /// Returns `CartError::InsufficientStock` if the product can't cover the
    /// new quantity.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        user_id: UserId,
        item_id: OrderItemId,
        quantity: i64,
    ) -> Result<CartView, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let item = orders::find_item(&mut tx, item_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;
        let cart = orders::find_cart(&mut tx, user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if item.order_id != cart.id {
            return Err(CartError::NotCartOwner);
        }

        // A line whose product was deleted can no longer change quantity.
        let product_id = item.product_id.ok_or(CartError::ProductNotFound)?;
        let product = products::fetch_by_id(&mut tx, product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        if product.stock_quantity < quantity {
            return Err(CartError::InsufficientStock {
                product_name: product.name,
                requested: quantity,
                available: product.stock_quantity,
            });
        }

        orders::update_item_quantity(&mut tx, item_id, quantity).await?;

        let subtotal = orders::items_subtotal(&mut tx, cart.id).await?;
        orders::update_cart_totals(&mut tx, cart.id, subtotal).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        self.get_cart(user_id).await
    }

    /// Remove a line from the user's cart. No stock check applies; removal
    /// always shrinks the reservation.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` or `CartError::CartNotFound` if
    /// either doesn't exist, and `CartError::NotCartOwner` if the line
    /// belongs to a different cart.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: OrderItemId,
    ) -> Result<CartView, CartError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let item = orders::find_item(&mut tx, item_id)
            .await?
            .ok_or(CartError::ItemNotFound)?;
        let cart = orders::find_cart(&mut tx, user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if item.order_id != cart.id {
            return Err(CartError::NotCartOwner);
        }

        orders::delete_item(&mut tx, item_id).await?;

        let subtotal = orders::items_subtotal(&mut tx, cart.id).await?;
        orders::update_cart_totals(&mut tx, cart.id, subtotal).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        self.get_cart(user_id).await
    }

    /// Delete the user's cart and all its lines. Clearing an absent cart is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let removed = orders::delete_cart(&mut tx, user_id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        if removed {
            debug!(user_id = %user_id, "Cleared cart");
        }

        Ok(())
    }

    async fn ensure_user(&self, user_id: UserId) -> Result<(), CartError> {
        if UserRepository::new(self.pool).exists(user_id).await? {
            Ok(())
        } else {
            Err(CartError::UserNotFound)
        }
    }
}
