//! Local filesystem storage backend.
//!
//! Development and test backend. "Signed" URLs are plain `file://` URLs with
//! an advisory expiry; nothing enforces them, which is fine for the
//! environments this backend is meant for.

use crate::error::{StorageError, StorageResult};
use crate::traits::{MediaStore, SignedUrlEntry, validate_expiry};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

/// Local filesystem object store.
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Get the full path for a key, with path traversal protection.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }
        if key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }

        // Validate all path components are normal (no .., ., root, etc.)
        for component in Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidKey(format!(
                        "contains unsafe path component: {key}"
                    )));
                }
            }
        }

        Ok(self.root.join(key))
    }
}

#[async_trait]
impl MediaStore for FilesystemBackend {
    #[instrument(skip(self, data), fields(backend = "filesystem", size = data.len()))]
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temp file and rename for an atomic put.
        let temp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already deleted counts as deleted.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn presign_get(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<SignedUrlEntry> {
        validate_expiry(expires_in).map_err(StorageError::Presign)?;

        let path = self.key_path(key)?;
        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let issued_at = OffsetDateTime::now_utc();
        let expires_at = issued_at + expires_in;
        let url = format!(
            "file://{}?expires={}",
            path.display(),
            expires_at.unix_timestamp()
        );

        Ok(SignedUrlEntry {
            key: key.to_string(),
            url,
            issued_at,
            expires_at,
        })
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn make_backend() -> (tempfile::TempDir, FilesystemBackend) {
        let temp = tempdir().unwrap();
        let backend = FilesystemBackend::new(temp.path()).await.unwrap();
        (temp, backend)
    }

    #[tokio::test]
    async fn put_then_presign() {
        let (_temp, backend) = make_backend().await;
        backend
            .put("avatars/u1/a.jpg", Bytes::from_static(b"img"), "image/jpeg")
            .await
            .unwrap();

        let entry = backend
            .presign_get("avatars/u1/a.jpg", Duration::from_secs(600))
            .await
            .unwrap();

        assert!(entry.url.starts_with("file://"));
        assert!(entry.expires_at > entry.issued_at);
    }

    #[tokio::test]
    async fn presign_missing_key_is_not_found() {
        let (_temp, backend) = make_backend().await;
        let err = backend
            .presign_get("missing/key", Duration::from_secs(600))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_temp, backend) = make_backend().await;
        backend
            .put("post-photos/p1/x", Bytes::from_static(b"data"), "image/png")
            .await
            .unwrap();

        backend.delete("post-photos/p1/x").await.unwrap();
        // Second delete of the same key, and a delete of a key that never
        // existed, both succeed.
        backend.delete("post-photos/p1/x").await.unwrap();
        backend.delete("never/uploaded").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_traversal_keys() {
        let (_temp, backend) = make_backend().await;
        for bad in ["../escape", "/absolute", "a/../b"] {
            let err = backend
                .put(bad, Bytes::from_static(b"x"), "text/plain")
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "{bad}");
        }
    }

    #[tokio::test]
    async fn put_overwrites_atomically() {
        let (temp, backend) = make_backend().await;
        backend
            .put("k", Bytes::from_static(b"one"), "text/plain")
            .await
            .unwrap();
        backend
            .put("k", Bytes::from_static(b"two"), "text/plain")
            .await
            .unwrap();

        let content = std::fs::read(temp.path().join("k")).unwrap();
        assert_eq!(content, b"two");
        // No temp files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
