//! Serve command handler.

use askgate_core::{AppResult, GatewayConfig};
use clap::Args;

/// Run the HTTP gateway
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Bind host override
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port override
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, mut config: GatewayConfig) -> AppResult<()> {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }

        // Fail fast: a missing backend setting never becomes a stream of
        // per-request 500s.
        config.validate()?;

        askgate_gateway::serve(config).await
    }
}
