use async_trait::async_trait;
use bytes::Bytes;
use darkroom_storage::error::{StorageError, StorageResult};
use darkroom_storage::traits::{MediaStore, SignedUrlEntry};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

/// Gateway fake that counts calls and can inject failures.
///
/// Each successful presign yields a distinct URL (`?sig=<n>`), so tests can
/// tell a cached URL from a re-signed one by plain string comparison.
pub struct StubMediaStore {
    pub put_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub presign_calls: AtomicUsize,
    fail_presign: AtomicBool,
    not_found: AtomicBool,
    issued_ttl: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl StubMediaStore {
    pub fn new() -> Self {
        Self {
            put_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            presign_calls: AtomicUsize::new(0),
            fail_presign: AtomicBool::new(false),
            not_found: AtomicBool::new(false),
            issued_ttl: Mutex::new(None),
        }
    }

    /// Make subsequent presign calls fail with `Unavailable`.
    pub fn fail_presigns(&self, fail: bool) {
        self.fail_presign.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent presign calls fail with `NotFound`.
    pub fn presign_not_found(&self, missing: bool) {
        self.not_found.store(missing, Ordering::SeqCst);
    }

    /// Issue URLs with this lifetime instead of the requested one.
    ///
    /// Lets tests fabricate entries that are already stale (or expired)
    /// relative to the cache's safety margin.
    pub fn set_issued_ttl(&self, ttl: Duration) {
        *self.issued_ttl.lock().unwrap() = Some(ttl);
    }
}

#[async_trait]
impl MediaStore for StubMediaStore {
    async fn put(&self, _key: &str, _data: Bytes, _content_type: &str) -> StorageResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, _key: &str) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUrlEntry> {
        let call = self.presign_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.not_found.load(Ordering::SeqCst) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "stub outage",
            ))));
        }

        let ttl = self.issued_ttl.lock().unwrap().unwrap_or(expires_in);
        let issued_at = OffsetDateTime::now_utc();
        Ok(SignedUrlEntry {
            key: key.to_string(),
            url: format!("https://media.test/{key}?sig={call}"),
            issued_at,
            expires_at: issued_at + ttl,
        })
    }

    fn backend_name(&self) -> &'static str {
        "stub"
    }
}
