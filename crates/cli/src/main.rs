//! Askgate CLI
//!
//! Main entry point for the askgate binary. Runs the query-answering
//! gateway (`serve`) or a single-shot question against the same backends
//! (`ask`).

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand};
use askgate_core::{logging, AppResult, GatewayConfig};
use std::path::PathBuf;

/// Askgate - retrieval-augmented question answering gateway
#[derive(Parser, Debug)]
#[command(name = "askgate")]
#[command(about = "Retrieval-augmented question answering gateway", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML config file (environment variables take precedence)
    #[arg(short, long, global = true, env = "ASKGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway
    Serve(ServeCommand),

    /// Ask a single question (no server lifecycle)
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose && cli.log_level.is_none() {
        Some("debug".to_string())
    } else {
        cli.log_level.clone()
    };
    logging::init_logging(log_level.as_deref(), cli.no_color)?;

    let config = GatewayConfig::load(cli.config.as_ref())?;

    tracing::info!("Askgate starting");
    tracing::debug!(index = %config.search.index, "Configuration loaded");

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
