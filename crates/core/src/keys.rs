//! Object keys and folder-type key templates.
//!
//! Keys are built from a per-folder template by substituting a caller-supplied
//! disambiguator (an owner id or title fragment) and a fresh UUID v4. The
//! random component guarantees keys are never reused; the template mapping is
//! deployment configuration and changing it does not invalidate keys already
//! stored.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Placeholder substituted with the sanitized disambiguator.
const OWNER_PLACEHOLDER: &str = "{owner}";

/// Placeholder substituted with a fresh random component.
const ID_PLACEHOLDER: &str = "{id}";

/// Opaque identifier of a stored blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Wrap a key read back from persistent storage.
    ///
    /// Stored keys were validated at build time; no re-validation happens here.
    pub fn from_stored(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Folder type a media object is stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFolder {
    Avatar,
    Banner,
    PostPhoto,
    PostVideo,
    EventPhoto,
}

impl MediaFolder {
    /// Stable string form used as the template map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Banner => "banner",
            Self::PostPhoto => "post_photo",
            Self::PostVideo => "post_video",
            Self::EventPhoto => "event_photo",
        }
    }
}

impl std::fmt::Display for MediaFolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Folder-type to key-template mapping.
///
/// Templates must contain `{id}`; `{owner}` is optional but present in all
/// defaults. Deployments may override individual entries via configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyTemplates {
    templates: HashMap<String, String>,
}

impl Default for KeyTemplates {
    fn default() -> Self {
        let templates = [
            (MediaFolder::Avatar, "avatars/{owner}/{id}"),
            (MediaFolder::Banner, "banners/{owner}/{id}"),
            (MediaFolder::PostPhoto, "post-photos/{owner}/{id}"),
            (MediaFolder::PostVideo, "post-videos/{owner}/{id}"),
            (MediaFolder::EventPhoto, "event-photos/{owner}/{id}"),
        ]
        .into_iter()
        .map(|(folder, template)| (folder.as_str().to_string(), template.to_string()))
        .collect();

        Self { templates }
    }
}

impl KeyTemplates {
    /// Build a fresh object key for `folder`.
    ///
    /// The disambiguator must be non-empty and restricted to characters that
    /// are safe inside an object key path segment. Collision probability is
    /// that of the UUID v4 random component.
    pub fn build(&self, folder: MediaFolder, disambiguator: &str) -> Result<ObjectKey> {
        let template = self
            .templates
            .get(folder.as_str())
            .ok_or_else(|| Error::InvalidFolder(folder.as_str().to_string()))?;

        validate_disambiguator(disambiguator)?;

        let key = template
            .replace(OWNER_PLACEHOLDER, disambiguator)
            .replace(ID_PLACEHOLDER, &Uuid::new_v4().to_string());

        Ok(ObjectKey(key))
    }

    /// Validate template invariants.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.templates.is_empty() {
            return Err("key template map must not be empty".to_string());
        }
        for (folder, template) in &self.templates {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(format!(
                    "key template for '{folder}' must contain '{{id}}' (got: {template})"
                ));
            }
            if template.starts_with('/') || template.contains("..") {
                return Err(format!(
                    "key template for '{folder}' must be a relative path without '..' (got: {template})"
                ));
            }
        }
        Ok(())
    }
}

/// Reject disambiguators that are empty or would escape the key's path segment.
fn validate_disambiguator(disambiguator: &str) -> Result<()> {
    if disambiguator.is_empty() {
        return Err(Error::InvalidDisambiguator(
            "disambiguator must not be empty".to_string(),
        ));
    }

    let safe = disambiguator
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !safe || disambiguator.contains("..") {
        return Err(Error::InvalidDisambiguator(format!(
            "disambiguator contains unsafe characters: {disambiguator}"
        )));
    }

    Ok(())
}
