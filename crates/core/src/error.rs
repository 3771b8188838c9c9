//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown media folder: {0}")]
    InvalidFolder(String),

    #[error("invalid key disambiguator: {0}")]
    InvalidDisambiguator(String),

    #[error("invalid key template: {0}")]
    InvalidTemplate(String),

    #[error("unknown media kind: {0}")]
    InvalidMediaKind(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
