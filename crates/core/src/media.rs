//! Media kinds.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Kind of a stored media asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Stable string form used in the database and in event payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    /// Parse from the stable string form.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "photo" => Ok(Self::Photo),
            "video" => Ok(Self::Video),
            other => Err(Error::InvalidMediaKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        assert_eq!(MediaKind::parse("photo").unwrap(), MediaKind::Photo);
        assert_eq!(MediaKind::parse("video").unwrap(), MediaKind::Video);
        assert!(MediaKind::parse("gif").is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&MediaKind::Video).unwrap();
        assert_eq!(json, "\"video\"");
    }
}
