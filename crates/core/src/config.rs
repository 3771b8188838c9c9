//! Configuration types shared across crates.

use crate::keys::KeyTemplates;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for configuration environment variables (nested keys split on `__`).
pub const ENV_PREFIX: &str = "DARKROOM_";

/// Storage backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage (development and tests).
    Filesystem {
        /// Root directory for storage.
        path: PathBuf,
    },
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Optional endpoint URL (for MinIO, etc.).
        endpoint: Option<String>,
        /// AWS region.
        region: Option<String>,
        /// Optional key prefix.
        prefix: Option<String>,
        /// AWS access key ID. Falls back to the ambient credential chain if not set.
        /// WARNING: Prefer env vars or IAM roles over storing secrets in config files.
        access_key_id: Option<String>,
        /// AWS secret access key. Falls back to the ambient credential chain if not set.
        secret_access_key: Option<String>,
        /// Force path-style URLs (`endpoint/bucket/key` instead of `bucket.endpoint/key`).
        /// Required for MinIO and some S3-compatible services; AWS S3 requires
        /// virtual-hosted style (false).
        #[serde(default)]
        force_path_style: bool,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            path: PathBuf::from("./data/media"),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StorageConfig::S3 {
                access_key_id,
                secret_access_key,
                ..
            } => match (access_key_id.as_ref(), secret_access_key.as_ref()) {
                (Some(_), Some(_)) | (None, None) => Ok(()),
                _ => Err(
                    "s3 config requires both access_key_id and secret_access_key when either is set"
                        .to_string(),
                ),
            },
            _ => Ok(()),
        }
    }
}

/// Metadata store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetadataConfig {
    /// SQLite database.
    Sqlite {
        /// Database file path.
        path: PathBuf,
    },
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/metadata.db"),
        }
    }
}

/// Signed-URL and key-template configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Signed-URL lifetime in seconds.
    #[serde(default = "default_url_ttl_secs")]
    pub url_ttl_secs: u64,
    /// Freshness safety margin in seconds. A cached URL is only served while
    /// `now < expires_at - margin`.
    #[serde(default = "default_url_safety_margin_secs")]
    pub url_safety_margin_secs: u64,
    /// Maximum number of cached signed-URL entries.
    #[serde(default = "default_url_cache_max_entries")]
    pub url_cache_max_entries: u32,
    /// Interval in seconds between cleanup sweeps of expired cache entries.
    #[serde(default = "default_url_cache_cleanup_interval_secs")]
    pub url_cache_cleanup_interval_secs: u64,
    /// Folder-type to key-template mapping.
    #[serde(default)]
    pub key_templates: KeyTemplates,
}

fn default_url_ttl_secs() -> u64 {
    crate::DEFAULT_URL_TTL_SECS
}

fn default_url_safety_margin_secs() -> u64 {
    crate::DEFAULT_URL_SAFETY_MARGIN_SECS
}

fn default_url_cache_max_entries() -> u32 {
    10_000
}

fn default_url_cache_cleanup_interval_secs() -> u64 {
    300
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            url_ttl_secs: default_url_ttl_secs(),
            url_safety_margin_secs: default_url_safety_margin_secs(),
            url_cache_max_entries: default_url_cache_max_entries(),
            url_cache_cleanup_interval_secs: default_url_cache_cleanup_interval_secs(),
            key_templates: KeyTemplates::default(),
        }
    }
}

impl MediaConfig {
    /// Validate media configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.url_ttl_secs == 0 {
            return Err("media.url_ttl_secs must be greater than zero".to_string());
        }
        if self.url_safety_margin_secs >= self.url_ttl_secs {
            return Err(format!(
                "media.url_safety_margin_secs {} must be smaller than url_ttl_secs {}",
                self.url_safety_margin_secs, self.url_ttl_secs
            ));
        }
        if self.url_cache_max_entries == 0 {
            return Err("media.url_cache_max_entries must be greater than zero".to_string());
        }
        if self.url_cache_cleanup_interval_secs == 0 {
            return Err(
                "media.url_cache_cleanup_interval_secs cannot be 0. \
                 This would cause a panic when creating the cleanup timer. \
                 Use a value >= 1 second."
                    .to_string(),
            );
        }
        self.key_templates.validate()
    }

    /// Get the signed-URL lifetime as a std Duration.
    pub fn url_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.url_ttl_secs)
    }

    /// Get the safety margin as a time Duration.
    pub fn url_safety_margin(&self) -> time::Duration {
        // Saturate at i64::MAX to prevent overflow wrapping to negative
        let secs = i64::try_from(self.url_safety_margin_secs).unwrap_or(i64::MAX);
        time::Duration::seconds(secs)
    }

    /// Get the cleanup interval as a std Duration.
    pub fn url_cache_cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.url_cache_cleanup_interval_secs)
    }
}

/// Session notification configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bounded per-subscriber event queue capacity. A subscriber that falls
    /// further behind loses the oldest events rather than stalling publishers.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: u32,
}

fn default_queue_capacity() -> u32 {
    64
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl NotifyConfig {
    /// Validate notify configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("notify.queue_capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Signed-URL and key-template configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Session notification configuration.
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file merged with
    /// `DARKROOM_`-prefixed environment variables (nested keys split on `__`).
    ///
    /// Environment variables override file values.
    pub fn load(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new();
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__")).extract()
    }

    /// Validate all sections. Returns the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()?;
        self.media.validate()?;
        self.notify.validate()
    }

    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses filesystem storage and SQLite metadata under
    /// relative paths; tests normally override both with temp directories.
    pub fn for_testing() -> Self {
        Self::default()
    }
}
