//! Per-user session event fan-out for darkroom.
//!
//! This crate provides:
//! - `SessionHub`: subscribe by user identity, publish best-effort events
//! - Bounded per-subscriber queues with drop-oldest overflow
//! - A pluggable cross-process backplane interface

pub mod backplane;
pub mod error;
pub mod hub;

pub use backplane::EventBackplane;
pub use error::{NotifyError, NotifyResult};
pub use hub::{HubStats, SessionHub, SessionSubscription};
