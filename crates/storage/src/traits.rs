//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use time::OffsetDateTime;

/// Maximum presigned URL expiry (7 days, the S3 limit).
pub const MAX_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Validate a presigned URL expiry duration.
pub fn validate_expiry(expires_in: Duration) -> Result<(), String> {
    if expires_in.is_zero() {
        Err("expiry duration must be greater than zero".to_string())
    } else if expires_in > MAX_PRESIGN_EXPIRY {
        Err(format!(
            "expiry duration {expires_in:?} exceeds maximum allowed {MAX_PRESIGN_EXPIRY:?}"
        ))
    } else {
        Ok(())
    }
}

/// A time-limited signed read URL issued for one object key.
///
/// Entries are replaced whole on refresh, never field-mutated.
#[derive(Clone, Debug)]
pub struct SignedUrlEntry {
    /// Key the URL was issued for.
    pub key: String,
    /// The signed URL.
    pub url: String,
    /// Issuance time.
    pub issued_at: OffsetDateTime,
    /// Expiry time. Always after `issued_at`.
    pub expires_at: OffsetDateTime,
}

impl SignedUrlEntry {
    /// Whether the entry may still be served: `now < expires_at - margin`.
    pub fn is_fresh(&self, now: OffsetDateTime, safety_margin: time::Duration) -> bool {
        now < self.expires_at - safety_margin
    }

    /// Whether the entry is past its hard expiry.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Object store gateway for media blobs.
///
/// A thin capability wrapper around the remote store: no caching, no business
/// logic, no state beyond the remote side. Safe to share across unlimited
/// concurrent callers.
#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    /// Upload a payload under `key`.
    ///
    /// Fails with `Unavailable` (retryable) or `PayloadRejected`
    /// (non-retryable). Any upload failure is fatal to the owning creation
    /// flow; there is no internal retry.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Delete the object under `key`.
    ///
    /// Idempotent: deleting a key that does not exist succeeds, so
    /// compensating deletes never fail noisily.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Produce a time-limited signed read URL for `key`.
    ///
    /// Fails with `NotFound` when the key has no backing object.
    async fn presign_get(&self, key: &str, expires_in: Duration)
    -> StorageResult<SignedUrlEntry>;

    /// Static identifier of the backend type (e.g. "s3", "filesystem").
    /// Used for metrics and logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    ///
    /// The default implementation returns Ok(()), suitable for backends that
    /// don't require connectivity verification.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_expiry_bounds() {
        assert!(validate_expiry(Duration::from_secs(60)).is_ok());
        assert!(validate_expiry(MAX_PRESIGN_EXPIRY).is_ok());
        assert!(validate_expiry(Duration::ZERO).is_err());
        assert!(validate_expiry(MAX_PRESIGN_EXPIRY + Duration::from_secs(1)).is_err());
    }

    #[test]
    fn entry_freshness_respects_margin() {
        let now = OffsetDateTime::now_utc();
        let entry = SignedUrlEntry {
            key: "k".to_string(),
            url: "https://example.test/k".to_string(),
            issued_at: now,
            expires_at: now + time::Duration::minutes(10),
        };

        assert!(entry.is_fresh(now, time::Duration::minutes(5)));
        assert!(!entry.is_fresh(now, time::Duration::minutes(10)));
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + time::Duration::minutes(10)));
    }
}
