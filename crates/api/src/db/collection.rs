//! Collection repository.
//!
//! The collection tracks figures a user actually owns, as opposed to the
//! wishlist. Same shape: a per-user product set with idempotent adds.

use chrono::Utc;
use sqlx::SqlitePool;

use curio_core::{ProductId, UserId};

use super::RepositoryError;
use super::products::ProductRow;
use crate::models::Product;

/// Repository for collection database operations.
pub struct CollectionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CollectionRepository<'a> {
    /// Create a new collection repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List the user's owned products, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT p.id, p.name, p.group_id, p.version, p.description, p.price,
                   p.image_url, p.stock_quantity, p.created_at, p.updated_at
            FROM collection_items c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = ?1
            ORDER BY c.added_at DESC, c.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Mark a product as owned. Marking an already-owned product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO collection_items (user_id, product_id, added_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove a product from the collection.
    ///
    /// # Returns
    ///
    /// Returns `true` if an entry was removed, `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM collection_items
            WHERE user_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
