//! Relational metadata store for darkroom.
//!
//! This crate provides:
//! - Post aggregate and media asset row models
//! - The `PostRepo`/`PostTransaction` repository traits with explicit
//!   transaction boundaries driven by the creation orchestrator
//! - Profile media slot upserts
//! - A SQLite implementation

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use models::{MediaAssetRow, PostRow, ProfileMediaRow, ProfileSlot};
pub use repos::{PostRepo, PostTransaction, ProfileMediaRepo};
pub use store::{MetadataStore, SqliteStore};

use darkroom_core::config::MetadataConfig;
use std::sync::Arc;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<dyn MetadataStore>> {
    match config {
        MetadataConfig::Sqlite { path } => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn from_config_sqlite_ok() {
        let temp = tempfile::tempdir().unwrap();
        let config = MetadataConfig::Sqlite {
            path: temp.path().join("metadata.db"),
        };

        let store = from_config(&config).await.unwrap();
        store.health_check().await.unwrap();
    }
}
