//! Signed-URL cache.
//!
//! Maps object keys to previously issued signed URLs so repeated reads of the
//! same asset do not re-sign on every request. The cache is an explicitly
//! constructed, injectable instance owned by the process's dependency graph,
//! with a bounded backing map.
//!
//! # Memory Safety
//!
//! - Configurable maximum entries; at capacity new keys are served uncached
//!   rather than growing the map
//! - Automatic eviction of expired entries, plus an optional background
//!   cleanup task
//!
//! # Concurrency
//!
//! The backing `DashMap` gives per-key atomic replace with no cross-key
//! locking. Concurrent misses for the same key may each call the gateway;
//! the last writer wins, which is always safe because a replacement entry is
//! fresher and longer-lived. No single-flight de-duplication is performed.

use crate::error::StorageResult;
use crate::traits::{MediaStore, SignedUrlEntry};
use darkroom_core::config::MediaConfig;
use darkroom_core::keys::ObjectKey;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

/// Cache hit/miss counters and current size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Bounded cache of signed read URLs, backed by a gateway.
pub struct SignedUrlCache {
    store: Arc<dyn MediaStore>,
    entries: DashMap<String, SignedUrlEntry>,
    /// Lifetime requested for freshly signed URLs.
    url_ttl: Duration,
    /// A cached URL is only served while `now < expires_at - safety_margin`.
    safety_margin: time::Duration,
    /// Maximum entries before new keys are served uncached.
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Whether the at-capacity warning has been logged (prevents log spam).
    at_capacity_warned: AtomicBool,
}

impl SignedUrlCache {
    /// Create a new cache in front of `store`, configured from `config`.
    pub fn new(store: Arc<dyn MediaStore>, config: &MediaConfig) -> Self {
        Self {
            store,
            entries: DashMap::new(),
            url_ttl: config.url_ttl(),
            safety_margin: config.url_safety_margin(),
            max_entries: config.url_cache_max_entries as usize,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            at_capacity_warned: AtomicBool::new(false),
        }
    }

    /// Resolve a signed read URL for `key`.
    ///
    /// Serves the cached entry while it is fresh; otherwise signs a new URL
    /// through the gateway and replaces the entry whole. Every URL returned
    /// satisfies `now < expires_at` at the time of issuance.
    ///
    /// On a refresh failure an existing entry that has not yet passed its
    /// hard expiry is served instead of the error (a soon-to-expire URL beats
    /// no URL); a fully expired entry is dropped and the failure propagates.
    /// Failures are never cached. `NotFound` propagates unchanged.
    pub async fn get_or_create(&self, key: &ObjectKey) -> StorageResult<String> {
        let now = OffsetDateTime::now_utc();

        if let Some(entry) = self.entries.get(key.as_str())
            && entry.is_fresh(now, self.safety_margin)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(entry.url.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        match self.store.presign_get(key.as_str(), self.url_ttl).await {
            Ok(entry) => {
                let url = entry.url.clone();
                self.insert(entry);
                Ok(url)
            }
            Err(err) => {
                let stale_url = self
                    .entries
                    .get(key.as_str())
                    .filter(|entry| !entry.is_expired(now))
                    .map(|entry| entry.url.clone());

                if let Some(url) = stale_url {
                    tracing::warn!(
                        key = %key,
                        error = %err,
                        "signed-url refresh failed, serving existing entry"
                    );
                    return Ok(url);
                }

                // Drop an entry that is past its hard expiry; it must never
                // be handed out.
                self.entries
                    .remove_if(key.as_str(), |_, entry| entry.is_expired(now));
                Err(err)
            }
        }
    }

    /// Seed the cache with a freshly issued entry.
    ///
    /// Used by upload flows to pre-warm the entry for a key that was just
    /// written, so the first read is a hit.
    pub fn seed(&self, entry: SignedUrlEntry) {
        self.insert(entry);
    }

    /// Remove the entry for `key`, if present.
    ///
    /// Returns whether an entry was removed. Called when the underlying
    /// object is deleted or replaced.
    pub fn invalidate(&self, key: &ObjectKey) -> bool {
        self.entries.remove(key.as_str()).is_some()
    }

    /// Evict entries past their hard expiry. Returns the number evicted.
    pub fn evict_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();

        // Collect candidates first, then remove atomically so an entry
        // refreshed in between is not evicted.
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for key in expired {
            if self
                .entries
                .remove_if(&key, |_, entry| entry.is_expired(now))
                .is_some()
            {
                evicted += 1;
            }
        }

        if evicted > 0 {
            self.at_capacity_warned.store(false, Ordering::Relaxed);
            tracing::debug!(
                evicted = evicted,
                remaining = self.entries.len(),
                "signed-url cache evicted expired entries"
            );
        }

        evicted
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Insert or replace the entry for its key, respecting the capacity bound.
    fn insert(&self, entry: SignedUrlEntry) {
        // Capacity check happens outside the entry lock; the worst case is a
        // brief overshoot by the number of concurrent inserters.
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&entry.key) {
            if self.evict_expired() == 0 && self.entries.len() >= self.max_entries {
                if !self.at_capacity_warned.swap(true, Ordering::Relaxed) {
                    tracing::warn!(
                        entries = self.entries.len(),
                        max_entries = self.max_entries,
                        "signed-url cache at capacity, serving new keys uncached. \
                         This warning is logged once per capacity event to prevent log spam."
                    );
                }
                return;
            }
        }

        self.entries.insert(entry.key.clone(), entry);
    }
}

/// Spawn a background task that periodically evicts expired entries.
pub fn spawn_cleanup_task(
    cache: Arc<SignedUrlCache>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let evicted = cache.evict_expired();
            if evicted > 0 {
                tracing::info!(
                    evicted = evicted,
                    "signed-url cache cleanup task evicted expired entries"
                );
            }
        }
    })
}
