//! MotherDuck MCP - DuckDB / MotherDuck SQL server over stdio
//!
//! Resolves the configured database, validates the connection, then serves
//! MCP over stdio until the client disconnects or Ctrl-C. The persistent
//! connection is closed on every exit path.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use motherduck_mcp::cli::Cli;
use motherduck_mcp::{DuckDbEngine, MotherDuckMcpServer, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    mcp_common::init_tracing("motherduck_mcp", mcp_common::verbosity_level(cli.verbose))?;

    let config = cli.load_config().context("Failed to load configuration")?;
    tracing::debug!(?config, "Effective configuration");

    let engine = Arc::new(DuckDbEngine::new(config.home_dir.clone()));
    let state = ServerState::start(&config, engine)
        .await
        .with_context(|| format!("Failed to open database `{}`", config.db_path))?;
    let state = Arc::new(state);

    tracing::info!("Starting MotherDuck MCP server");

    let server = MotherDuckMcpServer::new(Arc::clone(&state));
    mcp_common::serve_stdio(server, || async move {
        if let Err(e) = state.shutdown().await {
            tracing::warn!("Failed to close database connection: {}", e);
        }
    })
    .await
}
