//! Application state shared across services.

use crate::posts::PostService;
use crate::profile::ProfileService;
use anyhow::Context;
use darkroom_core::config::AppConfig;
use darkroom_metadata::store::MetadataStore;
use darkroom_notify::SessionHub;
use darkroom_storage::cache::{SignedUrlCache, spawn_cleanup_task};
use darkroom_storage::traits::MediaStore;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shared application state.
///
/// Owns the process's dependency graph: one storage gateway, one metadata
/// store, one signed-URL cache instance, one session hub. Services are cheap
/// handles constructed on demand from these.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage gateway.
    pub storage: Arc<dyn MediaStore>,
    /// Metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Signed-URL cache.
    pub urls: Arc<SignedUrlCache>,
    /// Session event hub.
    pub hub: SessionHub,
}

impl AppState {
    /// Create a new application state from already constructed components.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid; use [`AppConfig::validate`]
    /// first when failing gracefully matters.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn MediaStore>,
        metadata: Arc<dyn MetadataStore>,
        hub: SessionHub,
    ) -> Self {
        if let Err(error) = config.validate() {
            panic!("invalid configuration: {error}");
        }

        let urls = Arc::new(SignedUrlCache::new(storage.clone(), &config.media));

        Self {
            config: Arc::new(config),
            storage,
            metadata,
            urls,
            hub,
        }
    }

    /// Construct all components from configuration and verify connectivity.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(|error| anyhow::anyhow!("invalid configuration: {error}"))?;

        let storage = darkroom_storage::from_config(&config.storage)
            .await
            .context("failed to initialize storage")?;
        storage
            .health_check()
            .await
            .context("storage health check failed")?;

        let metadata = darkroom_metadata::from_config(&config.metadata)
            .await
            .context("failed to initialize metadata store")?;
        metadata
            .health_check()
            .await
            .context("metadata health check failed")?;

        let hub = SessionHub::new(&config.notify);

        Ok(Self::new(config, storage, metadata, hub))
    }

    /// Post creation service handle.
    pub fn posts(&self) -> PostService {
        PostService::new(
            self.storage.clone(),
            self.metadata.clone(),
            self.urls.clone(),
            self.hub.clone(),
            self.config.media.key_templates.clone(),
        )
    }

    /// Profile media service handle.
    pub fn profile(&self) -> ProfileService {
        ProfileService::new(
            self.storage.clone(),
            self.metadata.clone(),
            self.urls.clone(),
            self.config.media.key_templates.clone(),
            self.config.media.url_ttl(),
        )
    }

    /// Spawn the periodic signed-URL cache cleanup task.
    pub fn spawn_url_cache_cleanup(&self) -> JoinHandle<()> {
        spawn_cleanup_task(
            self.urls.clone(),
            self.config.media.url_cache_cleanup_interval(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darkroom_core::config::{AppConfig, MetadataConfig, StorageConfig};
    use tempfile::tempdir;

    #[tokio::test]
    async fn from_config_wires_components() {
        let temp = tempdir().unwrap();
        let config = AppConfig {
            storage: StorageConfig::Filesystem {
                path: temp.path().join("media"),
            },
            metadata: MetadataConfig::Sqlite {
                path: temp.path().join("metadata.db"),
            },
            ..AppConfig::for_testing()
        };

        let state = AppState::from_config(config).await.unwrap();
        assert_eq!(state.storage.backend_name(), "filesystem");
        state.metadata.health_check().await.unwrap();
        assert_eq!(state.urls.stats().entries, 0);
    }

    #[tokio::test]
    async fn from_config_rejects_invalid_media_settings() {
        let temp = tempdir().unwrap();
        let mut config = AppConfig {
            storage: StorageConfig::Filesystem {
                path: temp.path().join("media"),
            },
            metadata: MetadataConfig::Sqlite {
                path: temp.path().join("metadata.db"),
            },
            ..AppConfig::for_testing()
        };
        config.media.url_ttl_secs = 0;

        assert!(AppState::from_config(config).await.is_err());
    }
}
