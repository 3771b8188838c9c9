//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key has no backing object. Signals a data-integrity concern when an
    /// asset record still references the key.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The store refused the payload (size/type limits). Non-retryable.
    #[error("payload rejected: {0}")]
    PayloadRejected(String),

    /// Transient infrastructure failure. Retryable by the caller; never
    /// retried internally.
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("presign error: {0}")]
    Presign(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// Whether the caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
