//! Violation Ledger Service
//!
//! REST API over the hash-chained violation ledger

use anyhow::{Context, Result};
use ledger_store::{create_router, AppState, Config, LedgerStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledger_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Starting Violation Ledger Service");
    info!("Backend: {:?}, ledger key: {}", config.backend, config.ledger_key);
    info!("Listening on {}", config.api_address());

    // A ledger that cannot be loaded is fatal at startup
    let backend = config.open_backend().await?;
    let mut ledger = LedgerStore::new(backend, config.ledger_key.clone()).with_seed(config.seed);
    ledger
        .initialize()
        .await
        .context("Failed to initialize ledger")?;
    info!("Ledger holds {} violations", ledger.list().len());

    let state = Arc::new(AppState::new(ledger));
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Violation Ledger Service running on http://{}", config.api_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state
        .ledger
        .lock()
        .await
        .teardown()
        .await
        .context("Failed to persist ledger on shutdown")?;
    info!("Violation Ledger Service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
