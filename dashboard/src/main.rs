use anyhow::Context;
use axum::{routing::get, Router};
use dashboard::config::Config;
use dashboard::source::DataService;
use dashboard::{metrics, rest};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    info!("Starting cold-chain dashboard");
    info!("HTTP server: {}", config.http_addr);
    for device in &config.devices {
        info!("Device {}: {}", device.info.id, device.url);
    }
    info!("Alerts: {}", config.alerts_url);
    info!("Track: {}", config.track_url);

    // Initialize metrics
    metrics::init_metrics().context("failed to register metrics")?;

    let http_addr = config.http_addr.clone();
    let service = Arc::new(DataService::from_config(config).context("failed to build HTTP client")?);

    // Build HTTP app with REST API and metrics endpoint
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(service));

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind to {}", http_addr))?;

    info!("HTTP server listening on {}", http_addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Received shutdown signal");
    });

    if let Err(e) = server.await {
        error!("HTTP server error: {}", e);
    }

    info!("Shutting down");
    Ok(())
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
