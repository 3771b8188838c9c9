pub mod mocks;

use bytes::Bytes;
use darkroom_core::config::AppConfig;
use darkroom_core::event::SessionEvent;
use darkroom_metadata::SqliteStore;
use darkroom_metadata::store::MetadataStore;
use darkroom_notify::{SessionHub, SessionSubscription};
use darkroom_service::{AppState, PostAssetInput};
use mocks::MemoryMediaStore;
use std::sync::Arc;
use std::time::Duration;

/// Build an app state over an in-memory gateway and a temp SQLite store.
///
/// The concrete store is returned alongside the state so tests can assert
/// against the database directly.
pub async fn test_state() -> (
    tempfile::TempDir,
    Arc<MemoryMediaStore>,
    Arc<SqliteStore>,
    AppState,
) {
    let temp = tempfile::tempdir().unwrap();

    let storage = Arc::new(MemoryMediaStore::new());
    let metadata = Arc::new(
        SqliteStore::new(temp.path().join("metadata.db"))
            .await
            .unwrap(),
    );

    let config = AppConfig::for_testing();
    let hub = SessionHub::new(&config.notify);
    let metadata_store: Arc<dyn MetadataStore> = metadata.clone();
    let state = AppState::new(config, storage.clone(), metadata_store, hub);

    (temp, storage, metadata, state)
}

/// Count rows in a metadata table.
#[allow(dead_code)]
pub async fn count_rows(store: &SqliteStore, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[allow(dead_code)]
pub fn photo_input(index: usize) -> PostAssetInput {
    PostAssetInput {
        display_name: format!("photo-{index}.jpg"),
        content_type: "image/jpeg".to_string(),
        data: Bytes::from(format!("photo bytes {index}")),
    }
}

#[allow(dead_code)]
pub fn video_input(index: usize) -> PostAssetInput {
    PostAssetInput {
        display_name: format!("clip-{index}.mp4"),
        content_type: "video/mp4".to_string(),
        data: Bytes::from(format!("video bytes {index}")),
    }
}

/// Receive the next event or panic after a bounded wait.
#[allow(dead_code)]
pub async fn recv_event(sub: &mut SessionSubscription) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("timed out waiting for session event")
        .expect("subscription closed unexpectedly")
}

/// Assert no further event arrives within a short window.
#[allow(dead_code)]
pub async fn assert_no_event(sub: &mut SessionSubscription) {
    let outcome = tokio::time::timeout(Duration::from_millis(100), sub.recv()).await;
    assert!(outcome.is_err(), "unexpected extra event: {outcome:?}");
}
