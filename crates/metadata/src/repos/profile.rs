//! Profile media repository.
//!
//! Profile slots are simple single-row upserts outside any transaction; the
//! upload flow for them replaces one object at a time.

use crate::error::MetadataResult;
use crate::models::{ProfileMediaRow, ProfileSlot};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for per-user profile media slots (avatar, banner).
#[async_trait]
pub trait ProfileMediaRepo: Send + Sync {
    /// Get the current media for a user's slot.
    async fn get_profile_media(
        &self,
        owner_user_id: Uuid,
        slot: ProfileSlot,
    ) -> MetadataResult<Option<ProfileMediaRow>>;

    /// Upsert the media for a user's slot.
    ///
    /// Returns the object key that was replaced, if any, so the caller can
    /// delete the old blob and invalidate its cached URL.
    async fn set_profile_media(&self, row: &ProfileMediaRow) -> MetadataResult<Option<String>>;

    /// Remove the media for a user's slot.
    ///
    /// Returns the removed object key, if any. Clearing an empty slot is a
    /// no-op.
    async fn clear_profile_media(
        &self,
        owner_user_id: Uuid,
        slot: ProfileSlot,
    ) -> MetadataResult<Option<String>>;
}
