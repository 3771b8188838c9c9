//! Service-level error types.

use darkroom_metadata::MetadataError;
use darkroom_storage::StorageError;
use thiserror::Error;

/// Errors returned by the orchestration services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The creation flow aborted and relational state was rolled back.
    ///
    /// Wraps the first failing asset's error. The post is guaranteed absent
    /// from the repository; blobs uploaded before the failure point may
    /// remain in the object store.
    #[error("post creation failed at asset {index} of {total}: {source}")]
    PostCreationFailed {
        /// 1-based index of the failing asset.
        index: u32,
        /// Total assets in the request.
        total: u32,
        #[source]
        source: StorageError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("invalid media input: {0}")]
    Input(#[from] darkroom_core::Error),
}

/// Result type for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
