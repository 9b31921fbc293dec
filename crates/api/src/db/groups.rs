//! Figure line (group) repository.

use sqlx::SqlitePool;

use curio_core::GroupId;

use super::RepositoryError;
use crate::models::Group;

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: GroupId,
    name: String,
    logo_image_url: Option<String>,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            logo_image_url: row.logo_image_url,
        }
    }
}

/// Repository for group database operations.
pub struct GroupRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GroupRepository<'a> {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all groups, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Group>, RepositoryError> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, logo_image_url
            FROM groups
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    /// Get a group by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, logo_image_url
            FROM groups
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Group::from))
    }

    /// Create a new group.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        name: &str,
        logo_image_url: Option<&str>,
    ) -> Result<Group, RepositoryError> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            INSERT INTO groups (name, logo_image_url)
            VALUES (?1, ?2)
            RETURNING id, name, logo_image_url
            "#,
        )
        .bind(name)
        .bind(logo_image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(Group::from(row))
    }

    /// Replace a group's fields.
    ///
    /// Returns `None` if the group doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: GroupId,
        name: &str,
        logo_image_url: Option<&str>,
    ) -> Result<Option<Group>, RepositoryError> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            UPDATE groups
            SET name = ?2, logo_image_url = ?3
            WHERE id = ?1
            RETURNING id, name, logo_image_url
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(logo_image_url)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Group::from))
    }

    /// Delete a group. Its products survive with `group_id` set to NULL.
    ///
    /// # Returns
    ///
    /// Returns `true` if the group was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: GroupId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM groups
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
