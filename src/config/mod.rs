//! Engine configuration.
//!
//! Bounds for the history stacks, with sensible defaults and support
//! for serialization via serde. Configuration can be loaded from a TOML
//! file and falls back to defaults when the file is missing or broken.
//!
//! # Example
//!
//! ```
//! use navquill::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.navigation_limit, 50);
//! assert_eq!(config.history_limit, 200);
//! assert_eq!(config.closed_limit, 20);
//! ```

use serde::{Deserialize, Serialize};

/// Configuration for the history engine.
///
/// # Fields
///
/// * `navigation_limit` - Maximum back/forward stack entries (default: 50)
/// * `history_limit` - Maximum global history entries (default: 200)
/// * `closed_limit` - Maximum recently-closed records (default: 20)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum back/forward navigation stack entries
    #[serde(default = "default_navigation_limit")]
    pub navigation_limit: usize,

    /// Maximum global history entries
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum recently-closed editor records
    #[serde(default = "default_closed_limit")]
    pub closed_limit: usize,
}

/// Returns the default navigation stack bound.
fn default_navigation_limit() -> usize {
    50
}

/// Returns the default global history bound.
fn default_history_limit() -> usize {
    200
}

/// Returns the default recently-closed buffer bound.
fn default_closed_limit() -> usize {
    20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            navigation_limit: default_navigation_limit(),
            history_limit: default_history_limit(),
            closed_limit: default_closed_limit(),
        }
    }
}

impl EngineConfig {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/navquill/config.toml` on all platforms.
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("navquill");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or
    /// can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|_| Self::default()),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to the default config file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, toml_string)?;

        Ok(())
    }
}
