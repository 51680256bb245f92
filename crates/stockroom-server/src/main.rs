//! Stockroom Server Binary
//!
//! Standalone HTTP server for the inventory API.

use std::sync::Arc;

use stockroom_core::StockroomConfig;
use stockroom_server::{serve, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = StockroomConfig::load_standard()?;
    let state = Arc::new(AppState::from_config(&config)?);

    serve(&config.server.addr, state).await
}
