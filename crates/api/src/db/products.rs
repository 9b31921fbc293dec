//! Product repository for catalog database operations.
//!
//! Besides the pool-backed repository this module exposes two
//! connection-scoped helpers, [`claim_stock`] and [`fetch_by_id`], used by the
//! checkout and cart transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};

use curio_core::{GroupId, ProductId};

use super::RepositoryError;
use crate::models::Product;

/// Product row shape, shared with the wishlist and collection joins.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    name: String,
    group_id: Option<GroupId>,
    version: Option<String>,
    description: Option<String>,
    price: String,
    image_url: Option<String>,
    stock_quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = super::parse_decimal(&row.price, "products.price")?;

        Ok(Self {
            id: row.id,
            name: row.name,
            group_id: row.group_id,
            version: row.version,
            description: row.description,
            price,
            image_url: row.image_url,
            stock_quantity: row.stock_quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields required to insert or replace a product.
#[derive(Debug)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub group_id: Option<GroupId>,
    pub version: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub image_url: Option<&'a str>,
    pub stock_quantity: i64,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List products, optionally restricted to one group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(&self, group_id: Option<GroupId>) -> Result<Vec<Product>, RepositoryError> {
        let rows = match group_id {
            Some(gid) => {
                sqlx::query_as::<_, ProductRow>(
                    r#"
                    SELECT id, name, group_id, version, description, price, image_url,
                           stock_quantity, created_at, updated_at
                    FROM products
                    WHERE group_id = ?1
                    ORDER BY id
                    "#,
                )
                .bind(gid)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(
                    r#"
                    SELECT id, name, group_id, version, description, price, image_url,
                           stock_quantity, created_at, updated_at
                    FROM products
                    ORDER BY id
                    "#,
                )
                .fetch_all(self.pool)
                .await?
            }
        };

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, group_id, version, description, price, image_url,
                   stock_quantity, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, product: NewProduct<'_>) -> Result<Product, RepositoryError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, group_id, version, description, price, image_url,
                                  stock_quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id, name, group_id, version, description, price, image_url,
                      stock_quantity, created_at, updated_at
            "#,
        )
        .bind(product.name)
        .bind(product.group_id)
        .bind(product.version)
        .bind(product.description)
        .bind(product.price.to_string())
        .bind(product.image_url)
        .bind(product.stock_quantity)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Product::try_from(row)
    }

    /// Replace a product's fields.
    ///
    /// Returns `None` if the product doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ProductId,
        product: NewProduct<'_>,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = ?2, group_id = ?3, version = ?4, description = ?5, price = ?6,
                image_url = ?7, stock_quantity = ?8, updated_at = ?9
            WHERE id = ?1
            RETURNING id, name, group_id, version, description, price, image_url,
                      stock_quantity, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(product.name)
        .bind(product.group_id)
        .bind(product.version)
        .bind(product.description)
        .bind(product.price.to_string())
        .bind(product.image_url)
        .bind(product.stock_quantity)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Delete a product.
    ///
    /// Existing order lines keep their snapshot and have their `product_id`
    /// nulled by the foreign key; wishlist and collection entries cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Atomically claim `quantity` units of stock inside an open transaction.
///
/// The decrement is guarded by `stock_quantity >= ?2`, so concurrent
/// checkouts can never drive stock negative. Returns the product row after
/// the decrement, or `None` when the product is missing or the remaining
/// stock is short; callers distinguish the two cases with [`fetch_by_id`].
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
pub async fn claim_stock(
    conn: &mut SqliteConnection,
    product_id: ProductId,
    quantity: i64,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        UPDATE products
        SET stock_quantity = stock_quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        RETURNING id, name, group_id, version, description, price, image_url,
                  stock_quantity, created_at, updated_at
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Product::try_from).transpose()
}

/// Get a product by ID on an open transaction's connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
pub async fn fetch_by_id(
    conn: &mut SqliteConnection,
    product_id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, group_id, version, description, price, image_url,
               stock_quantity, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Product::try_from).transpose()
}
