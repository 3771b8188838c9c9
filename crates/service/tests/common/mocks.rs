use async_trait::async_trait;
use bytes::Bytes;
use darkroom_storage::error::{StorageError, StorageResult};
use darkroom_storage::traits::{MediaStore, SignedUrlEntry, validate_expiry};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

/// In-memory gateway with call counters and failure injection.
pub struct MemoryMediaStore {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    pub put_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub presign_calls: AtomicUsize,
    fail_put_at: Mutex<Option<usize>>,
}

#[allow(dead_code)]
impl MemoryMediaStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            put_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            presign_calls: AtomicUsize::new(0),
            fail_put_at: Mutex::new(None),
        }
    }

    /// Fail the n-th put call (1-based) with `Unavailable`.
    pub fn fail_put_at(&self, call: usize) {
        *self.fail_put_at.lock().unwrap() = Some(call);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let call = self.put_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if *self.fail_put_at.lock().unwrap() == Some(call) {
            return Err(StorageError::Unavailable(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "injected outage",
            ))));
        }

        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        // Absent keys count as already deleted.
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUrlEntry> {
        let call = self.presign_calls.fetch_add(1, Ordering::SeqCst) + 1;
        validate_expiry(expires_in).map_err(StorageError::Presign)?;

        if !self.contains(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let issued_at = OffsetDateTime::now_utc();
        Ok(SignedUrlEntry {
            key: key.to_string(),
            url: format!("https://cdn.test/{key}?sig={call}"),
            issued_at,
            expires_at: issued_at + expires_in,
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
