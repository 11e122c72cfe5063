//! CLI command implementations for the userdesk MCP server.

pub mod check;
pub mod serve;
pub mod tools;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;
use userdesk_core::AppConfig;

/// Load the config file (if present) and overlay the environment.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = if path.exists() {
        AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?
    } else {
        warn!(config = %path.display(), "Config file not found, using defaults and environment");
        AppConfig::default()
    };
    config.apply_env();
    Ok(config)
}
