//! Post creation orchestration.
//!
//! A post with N assets either commits whole or leaves no relational trace:
//! the draft row and every attached asset row live inside one repository
//! transaction that the orchestrator commits after the last upload or rolls
//! back on the first failure. Per-asset progress is published to the owner's
//! live sessions as each upload completes; event delivery is best-effort and
//! never affects the transaction outcome.

use crate::error::{ServiceError, ServiceResult};
use crate::metrics::{ASSETS_UPLOADED, POST_CREATE_DURATION, POSTS_COMMITTED, POSTS_ROLLED_BACK};
use bytes::Bytes;
use darkroom_core::event::SessionEvent;
use darkroom_core::keys::{KeyTemplates, MediaFolder, ObjectKey};
use darkroom_core::media::MediaKind;
use darkroom_metadata::models::{MediaAssetRow, PostRow};
use darkroom_metadata::repos::PostTransaction;
use darkroom_metadata::store::MetadataStore;
use darkroom_notify::SessionHub;
use darkroom_storage::cache::SignedUrlCache;
use darkroom_storage::traits::MediaStore;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use uuid::Uuid;

/// One media input of a post creation request.
#[derive(Clone, Debug)]
pub struct PostAssetInput {
    /// Display name shown in progress UI and stored with the asset.
    pub display_name: String,
    /// MIME type forwarded to the object store.
    pub content_type: String,
    pub data: Bytes,
}

/// A committed post aggregate.
#[derive(Clone, Debug)]
pub struct CreatedPost {
    pub post: PostRow,
    pub assets: Vec<MediaAssetRow>,
}

/// Orchestrates multi-asset post creation.
#[derive(Clone)]
pub struct PostService {
    storage: Arc<dyn MediaStore>,
    metadata: Arc<dyn MetadataStore>,
    urls: Arc<SignedUrlCache>,
    hub: SessionHub,
    templates: KeyTemplates,
}

impl PostService {
    pub fn new(
        storage: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataStore>,
        urls: Arc<SignedUrlCache>,
        hub: SessionHub,
        templates: KeyTemplates,
    ) -> Self {
        Self {
            storage,
            metadata,
            urls,
            hub,
            templates,
        }
    }

    /// Create a post with the given photo and video inputs.
    ///
    /// Assets upload sequentially in input order (photos first, then videos),
    /// so progress events for one `correlation_id` carry strictly increasing
    /// indices. A failure at any asset rolls the whole relational state back;
    /// blobs already uploaded are left in the store (orphan cleanup is a
    /// deployment concern, not a failure-path one).
    #[tracing::instrument(skip(self, content, photos, videos))]
    pub async fn create_post(
        &self,
        owner_user_id: Uuid,
        content: String,
        photos: Vec<PostAssetInput>,
        videos: Vec<PostAssetInput>,
        correlation_id: Uuid,
    ) -> ServiceResult<CreatedPost> {
        let started = Instant::now();
        let asset_total = (photos.len() + videos.len()) as u32;

        let mut tx = self.metadata.begin_post().await?;

        let post = PostRow {
            post_id: Uuid::new_v4(),
            owner_user_id,
            content,
            created_at: OffsetDateTime::now_utc(),
        };
        if let Err(err) = tx.insert_draft_post(&post).await {
            self.abort(tx, owner_user_id, correlation_id).await;
            return Err(err.into());
        }

        let inputs = photos
            .into_iter()
            .map(|input| (MediaKind::Photo, MediaFolder::PostPhoto, input))
            .chain(
                videos
                    .into_iter()
                    .map(|input| (MediaKind::Video, MediaFolder::PostVideo, input)),
            );

        let disambiguator = post.post_id.to_string();
        let mut assets = Vec::with_capacity(asset_total as usize);

        for (offset, (kind, folder, input)) in inputs.enumerate() {
            let asset_index = offset as u32 + 1;

            let key = match self.templates.build(folder, &disambiguator) {
                Ok(key) => key,
                Err(err) => {
                    self.abort(tx, owner_user_id, correlation_id).await;
                    return Err(err.into());
                }
            };

            if let Err(err) = self
                .storage
                .put(key.as_str(), input.data, &input.content_type)
                .await
            {
                tracing::warn!(
                    post_id = %post.post_id,
                    asset_index = asset_index,
                    asset_total = asset_total,
                    key = %key,
                    error = %err,
                    "asset upload failed, rolling back post creation"
                );
                self.abort(tx, owner_user_id, correlation_id).await;
                return Err(ServiceError::PostCreationFailed {
                    index: asset_index,
                    total: asset_total,
                    source: err,
                });
            }

            // Fresh keys cannot be cached yet; the invalidate guards against
            // a template change ever mapping onto a previously issued key.
            self.urls.invalidate(&key);

            assets.push(MediaAssetRow {
                asset_id: Uuid::new_v4(),
                post_id: Some(post.post_id),
                owner_user_id,
                object_key: key.into_string(),
                kind: kind.as_str().to_string(),
                display_name: input.display_name.clone(),
                position: asset_index as i32,
                uploaded_at: OffsetDateTime::now_utc(),
            });

            // Fire-and-forget: delivery failure never fails the transaction.
            self.hub.publish(
                owner_user_id,
                SessionEvent::progress(
                    correlation_id,
                    asset_index,
                    asset_total,
                    kind,
                    input.display_name,
                ),
            );
        }

        if let Err(err) = tx.insert_assets(&assets).await {
            self.abort(tx, owner_user_id, correlation_id).await;
            return Err(err.into());
        }

        if let Err(err) = tx.commit().await {
            self.hub
                .publish(owner_user_id, SessionEvent::completed(correlation_id, false));
            POSTS_ROLLED_BACK.inc();
            return Err(err.into());
        }

        self.hub
            .publish(owner_user_id, SessionEvent::completed(correlation_id, true));
        POSTS_COMMITTED.inc();
        ASSETS_UPLOADED.inc_by(asset_total as u64);
        POST_CREATE_DURATION.observe(started.elapsed().as_secs_f64());

        tracing::info!(
            post_id = %post.post_id,
            assets = asset_total,
            "post committed"
        );

        Ok(CreatedPost { post, assets })
    }

    /// Delete a committed post: blobs first, then the rows.
    ///
    /// Object deletion is idempotent, so a retried delete after a partial
    /// failure converges.
    #[tracing::instrument(skip(self))]
    pub async fn delete_post(&self, post_id: Uuid) -> ServiceResult<()> {
        let assets = self.metadata.get_post_assets(post_id).await?;

        for asset in &assets {
            let key = ObjectKey::from_stored(asset.object_key.clone());
            self.storage.delete(key.as_str()).await?;
            self.urls.invalidate(&key);
        }

        self.metadata.delete_post(post_id).await?;
        Ok(())
    }

    /// Resolve a signed read URL for a committed asset.
    pub async fn asset_url(&self, asset: &MediaAssetRow) -> ServiceResult<String> {
        let key = ObjectKey::from_stored(asset.object_key.clone());
        Ok(self.urls.get_or_create(&key).await?)
    }

    /// Roll back and emit the terminal failure event.
    ///
    /// Blobs uploaded before the failure point are intentionally not
    /// compensated; only relational state is undone.
    async fn abort(
        &self,
        tx: Box<dyn PostTransaction>,
        owner_user_id: Uuid,
        correlation_id: Uuid,
    ) {
        if let Err(err) = tx.rollback().await {
            tracing::error!(
                correlation = %correlation_id,
                error = %err,
                "post creation rollback failed"
            );
        }
        self.hub
            .publish(owner_user_id, SessionEvent::completed(correlation_id, false));
        POSTS_ROLLED_BACK.inc();
    }
}
