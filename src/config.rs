//! Configuration management.
//!
//! Settings are loaded from `config/{name}.toml` and cover the values that
//! were previously hard-coded on the stream type: the namespace every stream
//! name must carry, and the registration timeout handed to the origin server.
//! Per-instrument tables stay free-form (`toml::Value`) so each driver can
//! interpret its own section.

use crate::error::{AppResult, RecorderError};
use crate::logging::Severity;
use config::Config;
use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

/// Top-level application settings.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Root logging level, by name ("data") or numeric value ("15").
    pub log_level: String,
    /// Namespace prefix required on every stream name.
    pub namespace: String,
    /// Origin server connection settings.
    pub server: ServerSettings,
    /// Free-form per-instrument configuration tables.
    #[serde(default)]
    pub instruments: HashMap<String, toml::Value>,
}

/// Settings for the origin server connection.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    /// Timeout passed to the server at stream registration.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            namespace: "Hybrid".to_string(),
            server: ServerSettings {
                timeout: Duration::from_secs(60),
            },
            instruments: HashMap::new(),
        }
    }
}

impl Settings {
    /// Loads settings from `config/{config_name}.toml`, defaulting to
    /// `config/default.toml`.
    pub fn new(config_name: Option<&str>) -> AppResult<Self> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        let s = Config::builder()
            .add_source(config::File::with_name(&config_path))
            .build()
            .map_err(RecorderError::Config)?;

        let settings: Settings = s.try_deserialize().map_err(RecorderError::Config)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from an explicit file path.
    pub fn from_path(path: impl Into<std::path::PathBuf>) -> AppResult<Self> {
        let s = Config::builder()
            .add_source(config::File::from(path.into()))
            .build()
            .map_err(RecorderError::Config)?;

        let settings: Settings = s.try_deserialize().map_err(RecorderError::Config)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Semantic validation beyond what deserialization catches.
    pub fn validate(&self) -> AppResult<()> {
        self.log_level.parse::<Severity>()?;
        if self.namespace.trim().is_empty() {
            return Err(RecorderError::Configuration(
                "namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
