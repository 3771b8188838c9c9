//! Upload orchestration and wiring for darkroom.
//!
//! This crate provides:
//! - `PostService`: transactional multi-asset post creation with per-asset
//!   progress events
//! - `ProfileService`: avatar and banner replacement flows
//! - `AppState`: the process dependency graph (gateway, metadata store,
//!   signed-URL cache, session hub)
//! - Prometheus metrics for upload outcomes

pub mod error;
pub mod metrics;
pub mod posts;
pub mod profile;
pub mod state;

pub use error::{ServiceError, ServiceResult};
pub use posts::{CreatedPost, PostAssetInput, PostService};
pub use profile::ProfileService;
pub use state::AppState;
