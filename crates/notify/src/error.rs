//! Notification error types.

use thiserror::Error;

/// Notification delivery errors.
///
/// Local fan-out is infallible by design (events to absent subscribers are
/// dropped); only backplane forwarding can fail, and those failures are
/// swallowed at the publish site after logging.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("backplane error: {0}")]
    Backplane(String),
}

/// Result type for notification operations.
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;
