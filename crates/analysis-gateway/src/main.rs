//! Analysis Gateway Service
//!
//! REST API in front of the multimodal inference provider

use analysis_gateway::{create_router, AnalysisGateway, AppState, Config};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analysis_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Analysis Gateway");
    info!("Provider: {}", config.base_url);
    info!(
        "Models: pro={}, flash={}, image={}",
        config.models.pro, config.models.flash, config.models.image
    );
    info!("Provider timeout: {}s", config.provider_timeout_secs);

    let provider = Arc::new(config.provider()?);
    let gateway = AnalysisGateway::new(provider, config.models.clone());

    let state = Arc::new(AppState::new(gateway));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Analysis Gateway running on http://{}", config.api_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Analysis Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
