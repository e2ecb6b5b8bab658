//! TOML-based configuration.
//!
//! Supports a config file (modelgraph.toml) with generation and cache
//! settings. Every section and key is optional.
//!
//! Example configuration:
//! ```toml
//! [generation]
//! dialect = "bigquery"             # postgres | bigquery | duckdb
//! mode = "auto"                    # auto | cte | nested
//! root_as_cte = false
//! escape_parameter_markers = false
//!
//! [cache]
//! enabled = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::generate::{GenerateOptions, GenerationMode};
use crate::sql::dialect::Dialect;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "modelgraph.toml";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "MODELGRAPH_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// SQL generation.
    pub generation: GenerationSettings,

    /// Compiled-SQL cache.
    pub cache: CacheSettings,
}

/// SQL generation settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Target dialect.
    pub dialect: Dialect,

    /// CTE chain, nested subqueries, or whatever the dialect prefers.
    pub mode: GenerationMode,

    /// Emit only the CTE list, for embedding into a larger query.
    pub root_as_cte: bool,

    /// Double `%` for drivers that use `%`-style parameters.
    pub escape_parameter_markers: bool,
}

impl GenerationSettings {
    pub fn options(&self) -> GenerateOptions {
        GenerateOptions::new(self.mode)
            .with_root_as_cte(self.root_as_cte)
            .with_escape_parameter_markers(self.escape_parameter_markers)
    }
}

/// Cache settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache compiled SQL per graph fingerprint.
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Settings {
    /// Load settings from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `MODELGRAPH_CONFIG`
    /// 2. `./modelgraph.toml`
    ///
    /// Falls back to defaults when neither exists.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }
}
