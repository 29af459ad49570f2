//! Avatar bridge configuration.

use super::error::BridgeError;
use super::protocol::{
    COMMAND_EVENT, DEFAULT_SOURCE, DEFAULT_TARGET, HOST_METHOD, HOST_OBJECT,
    PLAY_FINISHED_EVENT, READY_EVENT,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const LABEL: &str = "AvatarBridge";

// ── Bridge config ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// `source` stamped on every outbound command.
    pub source: String,
    /// `target` stamped on every outbound command.
    pub target: String,
    pub host_object: String,
    pub host_method: String,
    /// Destination origin for cross-context posts.
    pub target_origin: String,
    pub command_event: String,
    pub ready_event: String,
    pub play_finished_event: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            target: DEFAULT_TARGET.to_string(),
            host_object: HOST_OBJECT.to_string(),
            host_method: HOST_METHOD.to_string(),
            target_origin: "*".to_string(),
            command_event: COMMAND_EVENT.to_string(),
            ready_event: READY_EVENT.to_string(),
            play_finished_event: PLAY_FINISHED_EVENT.to_string(),
        }
    }
}

/// Load config from disk, falling back to defaults.
pub fn load_config(path: &Path) -> BridgeConfig {
    crate::config::load_json_config(path, LABEL)
}

/// Save config to disk.
pub fn save_config(path: &Path, config: &BridgeConfig) -> Result<(), BridgeError> {
    crate::config::save_json_config(path, config, LABEL)
}
