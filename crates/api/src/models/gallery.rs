//! Community gallery domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use curio_core::{GalleryPostId, UserId};

/// A photo post in the community gallery.
///
/// Poster name and avatar are denormalized at creation time, so the feed
/// renders without a join and old posts keep their original byline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPost {
    pub id: GalleryPostId,
    pub user_id: UserId,
    pub image_url: String,
    pub caption: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub posted_by_username: String,
    pub posted_by_avatar_url: Option<String>,
    pub posted_at: DateTime<Utc>,
}
