//! Configuration types for userdesk.
//!
//! Configuration is read from an optional YAML file (`userdesk.yaml`) and then
//! overlaid with environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `DATABASE_URL` | `database.url` |
//! | `OPENROUTER_DOMAIN` | `completion.endpoint` |
//! | `OPENROUTER_API_KEY` | `completion.api_key` |
//! | `USERDESK_DEFAULT_MODEL` | `completion.default_model` |

pub mod completion;
pub mod database;
pub mod mcp;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use completion::{CompletionConfig, DEFAULT_MODEL};
pub use database::DatabaseConfig;
pub use mcp::{McpConfig, Transport};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const COMPLETION_ENDPOINT_ENV: &str = "OPENROUTER_DOMAIN";
pub const COMPLETION_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_MODEL_ENV: &str = "USERDESK_DEFAULT_MODEL";

/// Complete userdesk configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// MCP server configuration.
    #[serde(default)]
    pub mcp: McpConfig,

    /// Postgres connection.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Completion endpoint.
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(DATABASE_URL_ENV) {
            self.database.url = Some(url);
        }
        if let Some(endpoint) = get(COMPLETION_ENDPOINT_ENV) {
            self.completion.endpoint = Some(endpoint);
        }
        if let Some(key) = get(COMPLETION_API_KEY_ENV) {
            self.completion.api_key = Some(key);
        }
        if let Some(model) = get(DEFAULT_MODEL_ENV) {
            self.completion.default_model = model;
        }
    }

    /// Check that everything needed to start the server is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_none() {
            return Err(ConfigError::Config(format!(
                "database URL is not set (set {} or database.url)",
                DATABASE_URL_ENV
            )));
        }
        if self.completion.endpoint.is_none() {
            return Err(ConfigError::Config(format!(
                "completion endpoint is not set (set {} or completion.endpoint)",
                COMPLETION_ENDPOINT_ENV
            )));
        }
        if self.completion.default_model.trim().is_empty() {
            return Err(ConfigError::Config("completion.default_model is empty".to_string()));
        }
        Ok(())
    }
}
