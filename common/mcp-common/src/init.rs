//! Server initialization utilities
//!
//! Tracing setup plus the stdio serve loop shared by the MCP servers.

use std::future::Future;

use rmcp::{ServerHandler, ServiceExt};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map a `-v` count to a log level: 0 → info, 1 → debug, 2+ → trace.
pub fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialize tracing/logging for MCP servers
///
/// Logs go to stderr (stdout is reserved for MCP protocol). `RUST_LOG`
/// directives are honoured, and `<crate_name>=<level>` is always added.
///
/// Set `LOG_FORMAT=json` for structured JSON output.
pub fn init_tracing(crate_name: &str, level: Level) -> anyhow::Result<()> {
    let directive = format!("{}={}", crate_name, level.as_str().to_lowercase());
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

/// Serve `server` over stdio until the client disconnects or Ctrl-C arrives.
///
/// `on_shutdown` always runs before this returns, including when the
/// transport fails, so servers can release engine handles on every exit path.
pub async fn serve_stdio<S, F, Fut>(server: S, on_shutdown: F) -> anyhow::Result<()>
where
    S: ServerHandler,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let outcome = run_until_closed(server).await;

    tracing::info!("Server shutting down");
    on_shutdown().await;

    outcome
}

async fn run_until_closed<S: ServerHandler>(server: S) -> anyhow::Result<()> {
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!("Server running, waiting for requests...");

    tokio::select! {
        quit = service.waiting() => {
            quit?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Received Ctrl-C");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(verbosity_level(0), Level::INFO);
        assert_eq!(verbosity_level(1), Level::DEBUG);
        assert_eq!(verbosity_level(2), Level::TRACE);
        assert_eq!(verbosity_level(9), Level::TRACE);
    }
}
