pub mod mocks;

use darkroom_core::config::MediaConfig;

/// Media config fixture with explicit cache knobs.
#[allow(dead_code)]
pub fn media_config(ttl_secs: u64, margin_secs: u64, max_entries: u32) -> MediaConfig {
    MediaConfig {
        url_ttl_secs: ttl_secs,
        url_safety_margin_secs: margin_secs,
        url_cache_max_entries: max_entries,
        ..Default::default()
    }
}
