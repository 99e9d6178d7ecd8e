//! Octosearch HTTP server binary.
//!
//! Reads configuration from the environment (and the TOML file named by
//! `OCTOSEARCH_CONFIG`, if set), registers the GitHub and Gitea backends,
//! and serves until Ctrl-C. Tracing output goes to stderr.

use octosearch::startup::{build_aggregator, build_registry};
use octosearch::{AppState, SearchServer, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("octosearch=info,repo_search=info")
            }),
        )
        .init();

    tracing::info!("octosearch starting");

    let config = ServiceConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        anyhow::anyhow!("octosearch failed to load config: {e}")
    })?;

    let registry = build_registry(&config)?;
    let aggregator = build_aggregator(&config);
    let server = SearchServer::start(AppState::new(registry, aggregator), &config.server).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!(addr = %server.addr(), "shutdown requested");
    server.shutdown().await;

    tracing::info!("octosearch shut down cleanly");
    Ok(())
}
