//! CampusHub API server
//!
//! Main application entry point

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use CampusHub::{
    config::Settings,
    database::connect_store,
    utils::logging,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate().context("Invalid configuration")?;

    // Initialize logging
    let _guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", CampusHub::info());

    // Initialize storage
    info!(backend = ?settings.storage.backend, "Connecting to store...");
    let store = connect_store(&settings).await?;
    store.health_check().await.context("Store health check failed")?;

    let addr = settings.bind_address();
    let app = CampusHub::create_router(AppState::new(store, settings));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("CampusHub API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("CampusHub has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
