//! Prometheus metrics for the darkroom services.
//!
//! Exposes counters for post creation outcomes and asset uploads. The
//! embedding application is responsible for exposing `gather_metrics()`
//! output on a scrape endpoint and restricting access to it.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static POSTS_COMMITTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "darkroom_posts_committed_total",
        "Total number of post creation flows that committed",
    )
    .expect("metric creation failed")
});

pub static POSTS_ROLLED_BACK: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "darkroom_posts_rolled_back_total",
        "Total number of post creation flows that rolled back",
    )
    .expect("metric creation failed")
});

pub static ASSETS_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "darkroom_assets_uploaded_total",
        "Total number of media assets uploaded to the object store",
    )
    .expect("metric creation failed")
});

pub static PROFILE_MEDIA_REPLACED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "darkroom_profile_media_replaced_total",
        "Total number of profile media slots set or replaced",
    )
    .expect("metric creation failed")
});

pub static POST_CREATE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "darkroom_post_create_duration_seconds",
            "Time taken by a post creation flow, commit or rollback included",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("metric creation failed")
});

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry. Idempotent.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(POSTS_COMMITTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(POSTS_ROLLED_BACK.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ASSETS_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PROFILE_MEDIA_REPLACED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(POST_CREATE_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// Encode all registered metrics in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .expect("metrics encoding failed");
    String::from_utf8(buffer).unwrap_or_default()
}
