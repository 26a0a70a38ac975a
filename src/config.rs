//! Editor configuration
//!
//! Loaded from `<config dir>/flowpad/config.json`; every field has a default so
//! a missing or partial file is fine.

use crate::constants::{palette, storage, APP_NAME};
use crate::error::{FlowError, Result};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How new nodes pick their colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPolicy {
    /// Always the first palette entry
    #[default]
    Primary,
    /// Walk the palette in order, one step per existing node
    Cycle,
    /// Uniform random palette entry
    Random,
}

impl ColorPolicy {
    /// Pick a colour for a node created when `existing` nodes are present
    pub fn pick(&self, existing: usize) -> String {
        match self {
            ColorPolicy::Primary => palette::PRIMARY,
            ColorPolicy::Cycle => palette::COLORS[existing % palette::COLORS.len()],
            ColorPolicy::Random => palette::COLORS
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(palette::PRIMARY),
        }
        .to_string()
    }
}

/// Settings for an editor session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Name of the persisted slot
    pub storage_key: String,
    /// Directory holding the slot; platform data dir when unset
    pub storage_dir: Option<PathBuf>,
    pub color_policy: ColorPolicy,
    /// Persist after every settled mutation
    pub autosave: bool,
    /// Default `env_logger` filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_key: storage::DEFAULT_KEY.to_string(),
            storage_dir: None,
            color_policy: ColorPolicy::default(),
            autosave: true,
            log_filter: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.json"))
    }

    /// Load from the default location, falling back to defaults if absent
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| FlowError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Directory holding storage slots
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_NAME)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{ "color_policy": "cycle" }"#).unwrap();
        assert_eq!(config.color_policy, ColorPolicy::Cycle);
        assert_eq!(config.storage_key, storage::DEFAULT_KEY);
        assert!(config.autosave);
    }

    #[test]
    fn test_color_policies() {
        assert_eq!(ColorPolicy::Primary.pick(5), palette::PRIMARY);
        assert_eq!(ColorPolicy::Cycle.pick(0), palette::COLORS[0]);
        assert_eq!(ColorPolicy::Cycle.pick(1), palette::COLORS[1]);
        assert_eq!(ColorPolicy::Cycle.pick(palette::COLORS.len()), palette::COLORS[0]);
        assert!(palette::contains(&ColorPolicy::Random.pick(0)));
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let path = std::env::temp_dir().join(format!("flowpad-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = EditorConfig::load_from(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(FlowError::Config(_))));
    }
}
