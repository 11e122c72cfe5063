//! `userdesk serve` - start the MCP server.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use userdesk_adapter_pg::{PostgresUserStore, PostgresUserStoreOptions};
use userdesk_core::{AppConfig, Transport};
use userdesk_llm::OpenRouterClient;
use userdesk_mcp::McpServer;

/// Arguments for `userdesk serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport type (stdio or http). Overrides config file.
    #[arg(long)]
    pub transport: Option<Transport>,

    /// HTTP port (only for http transport). Overrides config file.
    #[arg(long)]
    pub port: Option<u16>,

    /// Default model for create-random-users. Overrides config and environment.
    #[arg(long)]
    pub model: Option<String>,
}

/// Apply command-line overrides on top of file and environment values.
pub fn apply_overrides(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(transport) = args.transport {
        config.mcp.transport = transport;
    }
    if let Some(port) = args.port {
        config.mcp.port = port;
    }
    if let Some(model) = &args.model {
        config.completion.default_model = model.clone();
    }
}

pub async fn execute(config_path: &Path, args: ServeArgs) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    if config.completion.api_key.is_none() {
        warn!(
            "No completion API key set (OPENROUTER_API_KEY); \
             create-random-users will likely fail"
        );
    }

    // validate() guarantees the URL is present
    let database_url = config.database.url.as_deref().unwrap_or_default();
    let store = PostgresUserStore::connect(
        database_url,
        PostgresUserStoreOptions::from(&config.database),
    )
    .await
    .context("Failed to connect to database")?;

    let completion = OpenRouterClient::from_config(&config.completion)
        .context("Failed to build completion client")?;

    info!(
        transport = ?config.mcp.transport,
        addr = %config.mcp.bind_addr(),
        model = %config.completion.default_model,
        "Starting userdesk MCP server"
    );

    let server = McpServer::new(config.mcp.clone(), Arc::new(store.clone()), Arc::new(completion))
        .with_default_model(config.completion.default_model.clone());

    let result = tokio::select! {
        result = server.run() => result.context("MCP server failed"),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            Ok(())
        }
    };

    store.close().await;
    result
}
