//! Stockroom Server - Inventory API
//!
//! JSON endpoints over an [`Inventory`] plus a server-sent event stream of
//! full snapshots.

pub mod http;
pub mod stream;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stockroom_core::{
    Backend, Inventory, ItemStore, LocationCatalog, MemoryItemStore, StockroomConfig,
};

/// Shared application state
pub struct AppState {
    pub inventory: Inventory<dyn ItemStore>,
    pub feed: stream::SnapshotFeed,
}

impl AppState {
    pub fn new(inventory: Inventory<dyn ItemStore>) -> Self {
        Self {
            inventory,
            feed: stream::SnapshotFeed::new(),
        }
    }

    /// An empty in-memory inventory on the built-in catalog.
    pub fn in_memory() -> Self {
        let store: Arc<dyn ItemStore> = Arc::new(MemoryItemStore::new());
        Self::new(Inventory::new(store, Arc::new(LocationCatalog::builtin())))
    }

    /// Open the store and catalog named by `config`.
    pub fn from_config(config: &StockroomConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let catalog = match &config.catalog.path {
            Some(path) => LocationCatalog::load(path)?,
            None => LocationCatalog::builtin(),
        };
        let store: Arc<dyn ItemStore> = match config.database.backend {
            Backend::Memory => Arc::new(MemoryItemStore::new()),
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => Arc::new(stockroom_core::SqliteItemStore::open(
                &config.database.path,
            )?),
            #[cfg(not(feature = "sqlite"))]
            Backend::Sqlite => return Err("built without sqlite support".into()),
        };
        tracing::info!(backend = ?config.database.backend, "opened item store");
        Ok(Self::new(Inventory::new(store, Arc::new(catalog))))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Catalog
        .route("/locations", get(http::list_locations))
        // Items
        .route(
            "/items",
            get(http::list_items)
                .post(http::add_item)
                .put(http::update_items),
        )
        .route("/items/stream", get(stream::stream_items))
        .route("/items/{id}", get(http::get_item).delete(http::delete_item))
        .route("/items/{id}/status", put(http::set_status))
        .route("/items/{id}/location", put(http::change_location))
        .route("/items/{id}/memo", put(http::update_memo))
        .route("/items/{id}/swap", post(http::swap_locations))
        // System
        .route("/status", get(http::get_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Stockroom server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
