//! Community gallery repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use curio_core::{GalleryPostId, UserId};

use super::RepositoryError;
use crate::models::GalleryPost;

#[derive(Debug, sqlx::FromRow)]
struct GalleryPostRow {
    id: GalleryPostId,
    user_id: UserId,
    image_url: String,
    caption: Option<String>,
    likes_count: i64,
    comments_count: i64,
    posted_by_username: String,
    posted_by_avatar_url: Option<String>,
    posted_at: DateTime<Utc>,
}

impl From<GalleryPostRow> for GalleryPost {
    fn from(row: GalleryPostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            image_url: row.image_url,
            caption: row.caption,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            posted_by_username: row.posted_by_username,
            posted_by_avatar_url: row.posted_by_avatar_url,
            posted_at: row.posted_at,
        }
    }
}

/// Repository for gallery database operations.
pub struct GalleryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> GalleryRepository<'a> {
    /// Create a new gallery repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<GalleryPost>, RepositoryError> {
        let rows = sqlx::query_as::<_, GalleryPostRow>(
            r#"
            SELECT id, user_id, image_url, caption, likes_count, comments_count,
                   posted_by_username, posted_by_avatar_url, posted_at
            FROM gallery_posts
            ORDER BY posted_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(GalleryPost::from).collect())
    }

    /// Create a post with the poster's current name and avatar denormalized
    /// in, and both counters at zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        image_url: &str,
        caption: Option<&str>,
        posted_by_username: &str,
        posted_by_avatar_url: Option<&str>,
    ) -> Result<GalleryPost, RepositoryError> {
        let row = sqlx::query_as::<_, GalleryPostRow>(
            r#"
            INSERT INTO gallery_posts (user_id, image_url, caption, likes_count,
                                       comments_count, posted_by_username,
                                       posted_by_avatar_url, posted_at)
            VALUES (?1, ?2, ?3, 0, 0, ?4, ?5, ?6)
            RETURNING id, user_id, image_url, caption, likes_count, comments_count,
                      posted_by_username, posted_by_avatar_url, posted_at
            "#,
        )
        .bind(user_id)
        .bind(image_url)
        .bind(caption)
        .bind(posted_by_username)
        .bind(posted_by_avatar_url)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(GalleryPost::from(row))
    }
}
