use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{check::CheckArgs, serve::ServeArgs};

#[derive(Parser, Debug)]
#[command(name = "userdesk", version, about = "MCP server for the users table")]
struct Cli {
    /// Configuration file. Missing files fall back to defaults and environment.
    #[arg(short, long, global = true, default_value = "userdesk.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the MCP server.
    Serve(ServeArgs),

    /// Validate configuration and check database connectivity.
    Check(CheckArgs),

    /// Print the tool definitions the server exposes.
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("warning: failed to load .env: {}", e);
    }

    // stdout belongs to the stdio transport; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve(args) => commands::serve::execute(&cli.config, args).await?,
        Command::Check(args) => commands::check::execute(&cli.config, args).await?,
        Command::Tools => commands::tools::execute()?,
    }

    Ok(())
}
