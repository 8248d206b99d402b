//! Configuration file handling

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Session worker settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Options handed to the listener's `init`
    #[serde(default)]
    pub options: ListenerOptions,
}

/// Session worker settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session, used for the worker's tracing span
    #[serde(default = "default_name")]
    pub name: String,

    /// Abort the worker when its handle is dropped
    #[serde(default = "default_link")]
    pub link: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            link: default_link(),
        }
    }
}

fn default_name() -> String {
    "listener".to_string()
}

fn default_link() -> bool {
    true
}

/// Opaque options table passed to `Listener::init`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ListenerOptions(Map<String, Value>);

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Boolean option, `false` when absent or not a boolean
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
