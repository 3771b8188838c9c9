//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Post aggregate record.
///
/// Asset rows referencing the post only become visible once the creation
/// transaction commits; a draft post is never observable by readers.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub post_id: Uuid,
    pub owner_user_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// Uploaded media asset record.
///
/// Created only after a successful gateway upload and owned by exactly one
/// aggregate: a post (`post_id` set) or a user profile slot (`post_id` null).
#[derive(Debug, Clone, FromRow)]
pub struct MediaAssetRow {
    pub asset_id: Uuid,
    pub post_id: Option<Uuid>,
    pub owner_user_id: Uuid,
    pub object_key: String,
    /// Stable media kind string ("photo" or "video").
    pub kind: String,
    pub display_name: String,
    /// 1-based input order within the owning post.
    pub position: i32,
    pub uploaded_at: OffsetDateTime,
}

/// Profile media slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileSlot {
    Avatar,
    Banner,
}

impl ProfileSlot {
    /// Stable string form used in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Banner => "banner",
        }
    }
}

impl std::fmt::Display for ProfileSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile media record (one per user per slot).
#[derive(Debug, Clone, FromRow)]
pub struct ProfileMediaRow {
    pub owner_user_id: Uuid,
    pub slot: String,
    pub object_key: String,
    pub updated_at: OffsetDateTime,
}
