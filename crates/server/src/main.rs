//! lectio cover server entry point.
//!
//! Serves book covers over HTTP. Logs are JSON on stderr, filtered by `RUST_LOG`.

use anyhow::{Context, Result};
use lectio_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod error;
mod paths;
mod rate_limit;
mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let bind_addr = config.bind_addr.clone();

    tokio::fs::create_dir_all(&config.cache_dir)
        .await
        .with_context(|| format!("creating cover cache directory {}", config.cache_dir.display()))?;

    let state = state::AppState::from_config(config)?;
    let sweeper = state.rate_limiter.spawn_sweeper();
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Starting lectio cover server on {}", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    sweeper.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
