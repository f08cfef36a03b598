// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene configuration.
//!
//! Stored as RON next to the project, the same way project settings are.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum undo history depth
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Default scene length (one minute)
pub const DEFAULT_SCENE_LENGTH_MS: i64 = 60_000;

/// Settings shared by every scene of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Maximum number of undoable operators kept. `0` keeps everything.
    pub max_history: usize,
    /// Directory holding `<name>.json` scene documents
    pub scenes_dir: PathBuf,
    /// Length given to lazily created scene properties, in milliseconds
    pub default_length_ms: i64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            scenes_dir: PathBuf::from(crate::document::SCENES_DIR),
            default_length_ms: DEFAULT_SCENE_LENGTH_MS,
        }
    }
}

impl SceneConfig {
    /// Parse and validate a RON config
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_length_ms < 0 {
            return Err(ConfigError::Invalid(format!(
                "default_length_ms must not be negative, got {}",
                self.default_length_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.max_history, DEFAULT_MAX_HISTORY);
        assert_eq!(config.scenes_dir, PathBuf::from("scenes"));
    }

    #[test]
    fn test_serialization() {
        let config = SceneConfig {
            max_history: 5,
            ..Default::default()
        };
        let ron_str = config.to_ron().unwrap();
        let loaded = SceneConfig::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let loaded = SceneConfig::from_ron("(max_history: 3)").unwrap();
        assert_eq!(loaded.max_history, 3);
        assert_eq!(loaded.default_length_ms, DEFAULT_SCENE_LENGTH_MS);
    }

    #[test]
    fn test_rejects_negative_length() {
        assert!(matches!(
            SceneConfig::from_ron("(default_length_ms: -1)"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
