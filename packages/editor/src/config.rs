use crate::EditorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "tessera.config.json";

/// What undo/redo does when the shape it captured has changed since
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleUndoPolicy {
    /// Fail the step with a recoverable error and leave the document alone
    #[default]
    Reject,
    /// Write the captured value over whatever is live
    Overwrite,
}

/// Editor session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum undo levels (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub stale_undo_policy: StaleUndoPolicy,

    /// Seed for ids minted by this session (clear markers, tool drafts)
    #[serde(default = "default_session_seed")]
    pub session_seed: String,
}

fn default_history_limit() -> usize {
    100
}

fn default_session_seed() -> String {
    "local".to_string()
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            stale_undo_policy: StaleUndoPolicy::default(),
            session_seed: default_session_seed(),
        }
    }
}
