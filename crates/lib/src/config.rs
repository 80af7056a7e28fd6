//! Adapter configuration.
//!
//! A project may carry a `.z80unit.json` file at its root. Every field is
//! optional:
//!
//! ```json
//! {
//!   "engineId": "maziac.z80-debug",
//!   "rootLabel": "z80-unit-tests",
//!   "engineUrl": "http://127.0.0.1:7000"
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::{CONFIG_FILE, DEFAULT_ENGINE_ID, ROOT_SUITE_LABEL};

/// Errors loading an [`AdapterConfig`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {field} must not be empty")]
    EmptyField { field: &'static str },
}

impl ConfigError {
    pub fn is_io_error(&self) -> bool {
        matches!(self, ConfigError::Read { .. })
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, ConfigError::Parse { .. })
    }
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}

/// Per-project adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
    /// Id of the engine to look up in the registry.
    pub engine_id: String,
    /// Display label of the root suite.
    pub root_label: String,
    /// Base URL of an HTTP engine, if the engine is remote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_url: Option<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            engine_id: DEFAULT_ENGINE_ID.to_string(),
            root_label: ROOT_SUITE_LABEL.to_string(),
            engine_url: None,
        }
    }
}

impl AdapterConfig {
    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AdapterConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `<root>/.z80unit.json`, or the defaults if the project has none.
    pub fn discover(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = root.as_ref().join(CONFIG_FILE);
        if !path.is_file() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        debug!(path = %path.display(), "Loading config file");
        Self::load(path)
    }

    pub fn with_engine_url(mut self, url: impl Into<String>) -> Self {
        self.engine_url = Some(url.into());
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine_id.is_empty() {
            return Err(ConfigError::EmptyField { field: "engineId" });
        }
        if self.root_label.is_empty() {
            return Err(ConfigError::EmptyField { field: "rootLabel" });
        }
        Ok(())
    }
}
