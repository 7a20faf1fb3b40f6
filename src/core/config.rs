//! Tunables passed in at construction time.
//!
//! Every struct derives serde with `#[serde(default)]` so a partial JSON file
//! only overrides the fields it names.

use super::constants::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub max_slots: usize,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// 0 means the selection never times out.
    pub timeout_ms: u64,
    pub allow_skip: bool,
    pub auto_select_on_timeout: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: SELECTION_TIMEOUT_MS,
            allow_skip: true,
            auto_select_on_timeout: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunTiming {
    pub combat_start_delay_ms: u64,
    pub victory_delay_ms: u64,
    pub room_transition_ms: u64,
}

impl Default for RunTiming {
    fn default() -> Self {
        Self {
            combat_start_delay_ms: COMBAT_START_DELAY_MS,
            victory_delay_ms: VICTORY_DELAY_MS,
            room_transition_ms: ROOM_TRANSITION_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub slots: SlotConfig,
    pub selection: SelectionConfig,
    pub timing: RunTiming,
}

impl AtlasConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AtlasConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file, or returns defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots.max_slots == 0 {
            return Err(ConfigError::Invalid("max_slots must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::default();
        assert_eq!(config.slots.max_slots, 6);
        assert_eq!(config.selection.timeout_ms, 30_000);
        assert!(config.selection.allow_skip);
        assert_eq!(config.timing.combat_start_delay_ms, 3_000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AtlasConfig::from_json(r#"{ "selection": { "timeout_ms": 0 } }"#).unwrap();
        assert_eq!(config.selection.timeout_ms, 0);
        assert!(config.selection.auto_select_on_timeout);
        assert_eq!(config.slots.max_slots, 6);
    }

    #[test]
    fn test_zero_slots_rejected() {
        let result = AtlasConfig::from_json(r#"{ "slots": { "max_slots": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = AtlasConfig::load(Path::new("/nonexistent/atlas.json")).unwrap();
        assert_eq!(config, AtlasConfig::default());
    }
}
