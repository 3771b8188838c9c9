//! Profile media (avatar and banner) flows.
//!
//! Single-object replacements: upload the new blob, swap the slot record,
//! then delete the replaced blob and drop its cached URL. The returned URL is
//! pre-warmed in the cache so the first read after an upload is a hit.

use crate::error::ServiceResult;
use crate::metrics::PROFILE_MEDIA_REPLACED;
use bytes::Bytes;
use darkroom_core::keys::{KeyTemplates, MediaFolder, ObjectKey};
use darkroom_metadata::models::{ProfileMediaRow, ProfileSlot};
use darkroom_metadata::store::MetadataStore;
use darkroom_storage::cache::SignedUrlCache;
use darkroom_storage::traits::MediaStore;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Manages per-user profile media slots.
#[derive(Clone)]
pub struct ProfileService {
    storage: Arc<dyn MediaStore>,
    metadata: Arc<dyn MetadataStore>,
    urls: Arc<SignedUrlCache>,
    templates: KeyTemplates,
    url_ttl: Duration,
}

impl ProfileService {
    pub fn new(
        storage: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataStore>,
        urls: Arc<SignedUrlCache>,
        templates: KeyTemplates,
        url_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            metadata,
            urls,
            templates,
            url_ttl,
        }
    }

    /// Set or replace a user's avatar. Returns a signed read URL for it.
    pub async fn set_avatar(
        &self,
        owner_user_id: Uuid,
        data: Bytes,
        content_type: &str,
    ) -> ServiceResult<String> {
        self.set_slot(
            owner_user_id,
            ProfileSlot::Avatar,
            MediaFolder::Avatar,
            data,
            content_type,
        )
        .await
    }

    /// Set or replace a user's banner. Returns a signed read URL for it.
    pub async fn set_banner(
        &self,
        owner_user_id: Uuid,
        data: Bytes,
        content_type: &str,
    ) -> ServiceResult<String> {
        self.set_slot(
            owner_user_id,
            ProfileSlot::Banner,
            MediaFolder::Banner,
            data,
            content_type,
        )
        .await
    }

    /// Resolve the signed URL of a user's avatar, if one is set.
    pub async fn avatar_url(&self, owner_user_id: Uuid) -> ServiceResult<Option<String>> {
        self.slot_url(owner_user_id, ProfileSlot::Avatar).await
    }

    /// Resolve the signed URL of a user's banner, if one is set.
    pub async fn banner_url(&self, owner_user_id: Uuid) -> ServiceResult<Option<String>> {
        self.slot_url(owner_user_id, ProfileSlot::Banner).await
    }

    /// Remove a user's avatar. Returns whether one was set.
    pub async fn clear_avatar(&self, owner_user_id: Uuid) -> ServiceResult<bool> {
        self.clear_slot(owner_user_id, ProfileSlot::Avatar).await
    }

    /// Remove a user's banner. Returns whether one was set.
    pub async fn clear_banner(&self, owner_user_id: Uuid) -> ServiceResult<bool> {
        self.clear_slot(owner_user_id, ProfileSlot::Banner).await
    }

    #[tracing::instrument(skip(self, data, content_type))]
    async fn set_slot(
        &self,
        owner_user_id: Uuid,
        slot: ProfileSlot,
        folder: MediaFolder,
        data: Bytes,
        content_type: &str,
    ) -> ServiceResult<String> {
        let key = self
            .templates
            .build(folder, &owner_user_id.to_string())?;

        self.storage
            .put(key.as_str(), data, content_type)
            .await?;

        // Sign once and seed the cache; the caller gets the same URL the
        // first reader will hit.
        let entry = self.storage.presign_get(key.as_str(), self.url_ttl).await?;
        let url = entry.url.clone();
        self.urls.seed(entry);

        let replaced = self
            .metadata
            .set_profile_media(&ProfileMediaRow {
                owner_user_id,
                slot: slot.as_str().to_string(),
                object_key: key.as_str().to_string(),
                updated_at: OffsetDateTime::now_utc(),
            })
            .await?;

        if let Some(old_key) = replaced {
            let old_key = ObjectKey::from_stored(old_key);
            // The record already points at the new blob; a failed delete of
            // the old one leaves an orphan, not a dangling reference.
            if let Err(err) = self.storage.delete(old_key.as_str()).await {
                tracing::warn!(
                    owner = %owner_user_id,
                    key = %old_key,
                    error = %err,
                    "failed to delete replaced profile media object"
                );
            }
            self.urls.invalidate(&old_key);
        }

        PROFILE_MEDIA_REPLACED.inc();
        Ok(url)
    }

    async fn slot_url(
        &self,
        owner_user_id: Uuid,
        slot: ProfileSlot,
    ) -> ServiceResult<Option<String>> {
        match self.metadata.get_profile_media(owner_user_id, slot).await? {
            Some(row) => {
                let key = ObjectKey::from_stored(row.object_key);
                Ok(Some(self.urls.get_or_create(&key).await?))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn clear_slot(&self, owner_user_id: Uuid, slot: ProfileSlot) -> ServiceResult<bool> {
        let Some(row) = self.metadata.get_profile_media(owner_user_id, slot).await? else {
            return Ok(false);
        };

        // Blob before record: a retry after a partial failure converges
        // because object deletion is idempotent.
        let key = ObjectKey::from_stored(row.object_key);
        self.storage.delete(key.as_str()).await?;
        self.urls.invalidate(&key);

        self.metadata
            .clear_profile_media(owner_user_id, slot)
            .await?;
        Ok(true)
    }
}
