//! Transient session events published while an upload flow runs.
//!
//! Events are a UX convenience delivered best-effort to live subscribers;
//! they are never persisted. The authoritative outcome of a creation flow is
//! its returned result, not these events.

use crate::media::MediaKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event delivered to a user's live sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// One asset of a multi-asset upload finished uploading.
    AssetProgress {
        correlation_id: Uuid,
        /// 1-based index of the asset within the request, in input order.
        asset_index: u32,
        /// Total number of assets in the request.
        asset_total: u32,
        kind: MediaKind,
        /// Display name of the asset, for progress UI.
        name: String,
    },
    /// The whole upload flow finished, successfully or not.
    UploadCompleted { correlation_id: Uuid, success: bool },
}

impl SessionEvent {
    pub fn progress(
        correlation_id: Uuid,
        asset_index: u32,
        asset_total: u32,
        kind: MediaKind,
        name: impl Into<String>,
    ) -> Self {
        Self::AssetProgress {
            correlation_id,
            asset_index,
            asset_total,
            kind,
            name: name.into(),
        }
    }

    pub fn completed(correlation_id: Uuid, success: bool) -> Self {
        Self::UploadCompleted {
            correlation_id,
            success,
        }
    }

    /// Correlation id shared by all events of one flow.
    pub fn correlation_id(&self) -> Uuid {
        match self {
            Self::AssetProgress { correlation_id, .. } => *correlation_id,
            Self::UploadCompleted { correlation_id, .. } => *correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_tags_events() {
        let event = SessionEvent::progress(Uuid::new_v4(), 1, 3, MediaKind::Photo, "beach.jpg");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "asset_progress");
        assert_eq!(json["asset_index"], 1);
        assert_eq!(json["asset_total"], 3);
        assert_eq!(json["kind"], "photo");

        let back: SessionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn correlation_id_is_shared() {
        let id = Uuid::new_v4();
        assert_eq!(SessionEvent::completed(id, true).correlation_id(), id);
        assert_eq!(
            SessionEvent::progress(id, 2, 2, MediaKind::Video, "clip").correlation_id(),
            id
        );
    }
}
