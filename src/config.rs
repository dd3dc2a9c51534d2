//! Engine Configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty or
//! partial file is valid.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::session::VariableId;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root of the data tree; quest files live under `quests/`
    pub data_dir: PathBuf,
    /// Session variable that is 1 while a cutscene plays
    pub cutscene_variable: VariableId,
    /// Default tracing directive, combined with RUST_LOG
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cutscene_variable: 542,
            log_filter: "quest_helper=info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Load configuration from a file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, String> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;

        Self::from_toml(&content)
            .map(Some)
            .map_err(|e| format!("{:?}: {}", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cutscene_variable, 542);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml("cutscene_variable = 1021\n").unwrap();
        assert_eq!(config.cutscene_variable, 1021);
        assert_eq!(config.log_filter, "quest_helper=info");
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("quest-helper.toml");
        assert_eq!(EngineConfig::load(&path).unwrap(), None);

        std::fs::write(&path, "data_dir = \"/srv/quests\"\nlog_filter = \"debug\"\n").unwrap();
        let config = EngineConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/quests"));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_bad_type_rejected() {
        let err = EngineConfig::from_toml("cutscene_variable = \"many\"").unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }
}
