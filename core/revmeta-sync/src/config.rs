//! Revision configuration, read from a `revisions.toml` file.
//!
//! ```toml
//! [revisions]
//! tracked-keys = ["color", "subtitle"]
//! change-detection = "ordered"
//! ```

use crate::error::{SyncError, SyncResult};
use crate::registry::KeyRegistry;
use revmeta_model::StaticKeys;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// How value lists are compared when deciding whether a snapshot is due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDetection {
    /// Same values in a different order count as a change.
    #[default]
    Ordered,
    /// Lists are compared as multisets; reordering alone is not a change.
    Unordered,
}

/// Settings for metadata revisioning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionConfig {
    /// Keys tracked from startup. More can be registered at runtime.
    #[serde(default)]
    pub tracked_keys: Vec<String>,
    #[serde(default)]
    pub change_detection: ChangeDetection,
}

impl RevisionConfig {
    /// Loads config from `path`.
    /// Falls back to defaults (nothing tracked) with a warning when the file
    /// is missing or unreadable.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No revision config at {:?}, tracking no metadata keys", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!(
                        "Loaded revision config from {:?} ({} tracked keys)",
                        path,
                        config.tracked_keys.len()
                    );
                    config
                }
                Err(e) => {
                    warn!("Failed to parse revision config {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read revision config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Parses config from TOML text.
    pub fn from_toml_str(contents: &str) -> SyncResult<Self> {
        let file: RevisionFile =
            toml::from_str(contents).map_err(|e| SyncError::Config(e.to_string()))?;
        Ok(file.revisions.into_config())
    }

    /// Builds a registry with the configured keys installed as a provider.
    pub fn registry(&self) -> KeyRegistry {
        let registry = KeyRegistry::new();
        if !self.tracked_keys.is_empty() {
            registry.register(StaticKeys::new(self.tracked_keys.iter().cloned()));
        }
        registry
    }
}

/// Raw TOML structure matching the revisions.toml format.
#[derive(Deserialize)]
struct RevisionFile {
    #[serde(default)]
    revisions: RevisionSection,
}

#[derive(Deserialize, Default)]
struct RevisionSection {
    #[serde(default, rename = "tracked-keys")]
    tracked_keys: Vec<String>,
    #[serde(default, rename = "change-detection")]
    change_detection: ChangeDetection,
}

impl RevisionSection {
    fn into_config(self) -> RevisionConfig {
        RevisionConfig {
            tracked_keys: self.tracked_keys,
            change_detection: self.change_detection,
        }
    }
}
