//! Core domain types and shared logic for the darkroom media service.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Object keys and folder-type key templates
//! - Media kinds and asset display metadata
//! - Session events (upload progress and completion)
//! - Application configuration

pub mod config;
pub mod error;
pub mod event;
pub mod keys;
pub mod media;

pub use config::{AppConfig, MediaConfig, MetadataConfig, NotifyConfig, StorageConfig};
pub use error::{Error, Result};
pub use event::SessionEvent;
pub use keys::{KeyTemplates, MediaFolder, ObjectKey};
pub use media::MediaKind;

/// Default signed-URL lifetime: 3 days.
pub const DEFAULT_URL_TTL_SECS: u64 = 3 * 24 * 60 * 60;

/// Default freshness safety margin for cached signed URLs: 5 minutes.
///
/// Absorbs clock skew and in-flight response latency so a URL handed to a
/// client is never already expired by the time the client dereferences it.
pub const DEFAULT_URL_SAFETY_MARGIN_SECS: u64 = 5 * 60;
