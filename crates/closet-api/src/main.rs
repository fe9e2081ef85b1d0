//! Closet API Service
//!
//! Serves the wardrobe over HTTP, persisting locally for guests and to the
//! configured cloud store for signed-in users.

use anyhow::{Context, Result};
use closet_api::config::Config;
use closet_api::{connect_cloud, create_router, AppState};
use closet_backend::{Closet, ClothingVision, FileStorage, GeminiVision, NoVision};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,closet_api=debug,closet_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Closet API Service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Local storage: {}", config.local_storage_dir.display());

    let storage = FileStorage::open(&config.local_storage_dir)
        .context("Failed to open local storage")?;
    let cloud = connect_cloud(&config).await;

    let vision: Arc<dyn ClothingVision> = match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiVision::new(Some(key.clone()), config.gemini_url.clone())),
        None => {
            info!("GEMINI_API_KEY not set, vision features disabled");
            Arc::new(NoVision)
        }
    };

    let closet = Arc::new(Closet::new(Arc::new(storage), cloud));
    let state = AppState::new(closet, vision);

    // Nobody is signed in at startup
    state
        .resolve_auth(None)
        .await
        .context("Failed to load guest closet")?;

    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Closet API listening on {}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Closet API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
