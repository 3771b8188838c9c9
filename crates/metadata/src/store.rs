//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{MediaAssetRow, PostRow, ProfileMediaRow, ProfileSlot};
use crate::repos::{PostRepo, PostTransaction, ProfileMediaRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: PostRepo + ProfileMediaRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// Schema for the media metadata tables.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    post_id BLOB PRIMARY KEY,
    owner_user_id BLOB NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_owner ON posts(owner_user_id, created_at);

CREATE TABLE IF NOT EXISTS media_assets (
    asset_id BLOB PRIMARY KEY,
    post_id BLOB REFERENCES posts(post_id) ON DELETE CASCADE,
    owner_user_id BLOB NOT NULL,
    object_key TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    display_name TEXT NOT NULL,
    position INTEGER NOT NULL,
    uploaded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_media_assets_post ON media_assets(post_id, position);

CREATE TABLE IF NOT EXISTS profile_media (
    owner_user_id BLOB NOT NULL,
    slot TEXT NOT NULL,
    object_key TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (owner_user_id, slot)
);
"#;

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MetadataError::Config(format!("cannot create {parent:?}: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // A creation transaction stays open across object-store uploads,
            // so a single-connection pool would starve every reader for the
            // whole upload. WAL permits one writer plus concurrent readers;
            // the busy timeout absorbs writer contention.
            .max_connections(5)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        tracing::debug!(path = %path.display(), "sqlite metadata store initialized");
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Post creation transaction over a pooled SQLite connection.
struct SqlitePostTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl PostTransaction for SqlitePostTransaction {
    async fn insert_draft_post(&mut self, post: &PostRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO posts (post_id, owner_user_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post.post_id)
        .bind(post.owner_user_id)
        .bind(&post.content)
        .bind(post.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_assets(&mut self, assets: &[MediaAssetRow]) -> MetadataResult<()> {
        for asset in assets {
            sqlx::query(
                "INSERT INTO media_assets \
                 (asset_id, post_id, owner_user_id, object_key, kind, display_name, position, uploaded_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(asset.asset_id)
            .bind(asset.post_id)
            .bind(asset.owner_user_id)
            .bind(&asset.object_key)
            .bind(&asset.kind)
            .bind(&asset.display_name)
            .bind(asset.position)
            .bind(asset.uploaded_at)
            .execute(&mut *self.tx)
            .await?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> MetadataResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> MetadataResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl PostRepo for SqliteStore {
    async fn begin_post(&self) -> MetadataResult<Box<dyn PostTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqlitePostTransaction { tx }))
    }

    async fn get_post(&self, post_id: Uuid) -> MetadataResult<Option<PostRow>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT post_id, owner_user_id, content, created_at FROM posts WHERE post_id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_post_assets(&self, post_id: Uuid) -> MetadataResult<Vec<MediaAssetRow>> {
        let rows = sqlx::query_as::<_, MediaAssetRow>(
            "SELECT asset_id, post_id, owner_user_id, object_key, kind, display_name, position, uploaded_at \
             FROM media_assets WHERE post_id = ? ORDER BY position",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_post(&self, post_id: Uuid) -> MetadataResult<()> {
        // Single transaction so the post and its asset rows disappear together.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM media_assets WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(MetadataError::NotFound(format!("post {post_id}")));
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileMediaRepo for SqliteStore {
    async fn get_profile_media(
        &self,
        owner_user_id: Uuid,
        slot: ProfileSlot,
    ) -> MetadataResult<Option<ProfileMediaRow>> {
        let row = sqlx::query_as::<_, ProfileMediaRow>(
            "SELECT owner_user_id, slot, object_key, updated_at \
             FROM profile_media WHERE owner_user_id = ? AND slot = ?",
        )
        .bind(owner_user_id)
        .bind(slot.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_profile_media(&self, row: &ProfileMediaRow) -> MetadataResult<Option<String>> {
        // Read-modify-write in one transaction so the replaced key is exact.
        let mut tx = self.pool.begin().await?;

        let previous: Option<String> = sqlx::query_scalar(
            "SELECT object_key FROM profile_media WHERE owner_user_id = ? AND slot = ?",
        )
        .bind(row.owner_user_id)
        .bind(&row.slot)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO profile_media (owner_user_id, slot, object_key, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(owner_user_id, slot) DO UPDATE SET \
             object_key = excluded.object_key, updated_at = excluded.updated_at",
        )
        .bind(row.owner_user_id)
        .bind(&row.slot)
        .bind(&row.object_key)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(previous.filter(|key| key != &row.object_key))
    }

    async fn clear_profile_media(
        &self,
        owner_user_id: Uuid,
        slot: ProfileSlot,
    ) -> MetadataResult<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<String> = sqlx::query_scalar(
            "SELECT object_key FROM profile_media WHERE owner_user_id = ? AND slot = ?",
        )
        .bind(owner_user_id)
        .bind(slot.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if previous.is_some() {
            sqlx::query("DELETE FROM profile_media WHERE owner_user_id = ? AND slot = ?")
                .bind(owner_user_id)
                .bind(slot.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(previous)
    }
}
