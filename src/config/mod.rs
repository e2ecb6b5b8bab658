//! Configuration module.
//!
//! Handles the `modelgraph.toml` settings file.

mod settings;

pub use settings::{
    CacheSettings, GenerationSettings, Settings, SettingsError, CONFIG_ENV, CONFIG_FILE,
};
