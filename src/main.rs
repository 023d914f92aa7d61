use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use route_sync::{config, handlers, logging, services::StraightLineProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("route_sync=debug,tower_http=debug");

    // Load configuration
    dotenv::dotenv().ok();
    let config = config::Config::from_env().context("Failed to load configuration")?;

    info!("Starting path service");

    let app = handlers::router(Arc::new(StraightLineProvider));

    let addr: std::net::SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .context("Invalid listen address")?;
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    info!("Shutting down...");
    Ok(())
}
