//! `userdesk check` command implementation.
//!
//! Validates the resolved configuration and, unless `--offline` is given,
//! connects to the database and confirms the `users` table is readable.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use userdesk_adapter_pg::{PostgresUserStore, PostgresUserStoreOptions};
use userdesk_core::AppConfig;

/// Arguments for `userdesk check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Only validate configuration; do not connect to the database.
    #[arg(long)]
    pub offline: bool,
}

/// Configuration problems worth reporting, as `(severity, message)` lines.
pub fn config_findings(config: &AppConfig) -> Vec<(&'static str, String)> {
    let mut findings = Vec::new();
    if let Err(e) = config.validate() {
        findings.push(("ERROR", e.to_string()));
    }
    if config.completion.api_key.is_none() {
        findings.push(("WARN", "no completion API key set (OPENROUTER_API_KEY)".to_string()));
    }
    if config.completion.timeout_secs == 0 {
        findings.push(("WARN", "completion.timeout_secs is 0".to_string()));
    }
    findings
}

pub async fn execute(config_path: &Path, args: CheckArgs) -> Result<()> {
    let config = super::load_config(config_path)?;

    let findings = config_findings(&config);
    for (severity, message) in &findings {
        println!("{:5} {}", severity, message);
    }
    if findings.iter().any(|(severity, _)| *severity == "ERROR") {
        anyhow::bail!("configuration check failed");
    }
    println!("✓ configuration OK");

    if args.offline {
        return Ok(());
    }

    let database_url = config.database.url.as_deref().unwrap_or_default();
    let store = PostgresUserStore::connect(
        database_url,
        PostgresUserStoreOptions::from(&config.database),
    )
    .await
    .context("Failed to connect to database")?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(store.pool())
        .await
        .context("Failed to read the users table")?;
    println!("✓ database OK ({} users)", count);

    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_reports_missing_settings() {
        let findings = config_findings(&AppConfig::default());
        assert!(findings.iter().any(|(s, _)| *s == "ERROR"));
        assert!(findings.iter().any(|(s, m)| *s == "WARN" && m.contains("API key")));
    }

    #[test]
    fn test_complete_config_has_no_findings() {
        let mut config = AppConfig::default();
        config.database.url = Some("postgres://localhost/users".to_string());
        config.completion.endpoint =
            Some("https://openrouter.ai/api/v1/chat/completions".to_string());
        config.completion.api_key = Some("sk-test".to_string());

        assert!(config_findings(&config).is_empty());
    }
}
