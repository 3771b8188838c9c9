//! Post aggregate repository.

use crate::error::MetadataResult;
use crate::models::{MediaAssetRow, PostRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for post aggregate operations.
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Open a transaction for a post creation flow.
    ///
    /// The transaction is exclusively owned by the flow that opened it; no
    /// other flow can observe rows inserted through it before `commit`.
    async fn begin_post(&self) -> MetadataResult<Box<dyn PostTransaction>>;

    /// Get a committed post by id.
    async fn get_post(&self, post_id: Uuid) -> MetadataResult<Option<PostRow>>;

    /// Get a committed post's assets ordered by input position.
    async fn get_post_assets(&self, post_id: Uuid) -> MetadataResult<Vec<MediaAssetRow>>;

    /// Delete a post and its asset rows.
    ///
    /// Callers are responsible for deleting the backing objects from the
    /// store first (asset ownership: blob before record).
    async fn delete_post(&self, post_id: Uuid) -> MetadataResult<()>;
}

/// An open post creation transaction.
///
/// Either `commit` or `rollback` must be called; dropping an unfinished
/// transaction rolls it back implicitly at the database layer.
#[async_trait]
pub trait PostTransaction: Send {
    /// Insert the draft post row, fixing its id for key construction.
    async fn insert_draft_post(&mut self, post: &PostRow) -> MetadataResult<()>;

    /// Attach asset rows to the draft post.
    async fn insert_assets(&mut self, assets: &[MediaAssetRow]) -> MetadataResult<()>;

    /// Commit: the post and all attached assets become visible atomically.
    async fn commit(self: Box<Self>) -> MetadataResult<()>;

    /// Roll back: the draft post and any attached asset rows are undone.
    async fn rollback(self: Box<Self>) -> MetadataResult<()>;
}
