//! Spyglass HTTP Server
//!
//! Serves the Spyglass read operations over HTTP with API-key
//! authentication. A thin shell over `spyglass-engine`: handlers parse the
//! request, call the source manager, and map engine errors onto status
//! codes. One source manager is constructed at startup and shared across
//! handlers.

pub mod auth;
pub mod config;
pub mod handlers;

use handlers::AppState;
use spyglass_engine::SourceManager;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use config::{ConfigError, ServerConfig};

/// Server startup error
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failed to bind or serve
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the HTTP server and serve until shutdown.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    let bind_addr = config.bind_addr();
    let manager = Arc::new(SourceManager::new(config.engine.clone()));
    let state = AppState {
        manager,
        config: Arc::new(config),
    };

    let app = handlers::create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Spyglass server listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
