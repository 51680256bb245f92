//! Server-sent event stream of inventory snapshots
//!
//! One feed thread per server reads the blocking store subscription and fans
//! snapshots out over a tokio broadcast channel, so SSE clients hold no
//! thread of their own.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::thread;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};

use stockroom_core::{Inventory, InventoryError, ItemStore, Snapshot, StoreError};

use crate::http::{api_error, ApiError};
use crate::AppState;

/// Snapshots buffered per client before it starts skipping.
const FEED_CAPACITY: usize = 16;

/// Shared fan-out of store snapshots to async consumers.
#[derive(Default)]
pub struct SnapshotFeed {
    sender: Mutex<Option<broadcast::Sender<Snapshot>>>,
}

impl SnapshotFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every snapshot published after this call.
    ///
    /// The feed thread starts on first use and runs until the store closes.
    pub fn subscribe(
        &self,
        inventory: &Inventory<dyn ItemStore>,
    ) -> Result<broadcast::Receiver<Snapshot>, InventoryError> {
        let mut sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(tx) = sender.as_ref() {
            return Ok(tx.subscribe());
        }

        let subscription = inventory.subscribe()?;
        let (tx, rx) = broadcast::channel(FEED_CAPACITY);
        let forward = tx.clone();
        thread::Builder::new()
            .name("snapshot-feed".to_string())
            .spawn(move || {
                for snapshot in subscription {
                    // No receivers is fine; the next client starts from a fresh snapshot.
                    let _ = forward.send(snapshot);
                }
                tracing::debug!("snapshot feed ended");
            })
            .map_err(|e| StoreError::Storage(format!("snapshot feed: {}", e)))?;
        *sender = Some(tx);
        Ok(rx)
    }

    pub fn receiver_count(&self) -> usize {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map_or(0, |tx| tx.receiver_count())
    }
}

struct ClientState {
    pending: Option<Snapshot>,
    feed: broadcast::Receiver<Snapshot>,
    last_version: u64,
}

/// Stream every snapshot as a `snapshot` event, starting with the current one
pub async fn stream_items(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Join the feed before reading the current snapshot so nothing is missed.
    let feed = state
        .feed
        .subscribe(&state.inventory)
        .map_err(api_error)?;
    let current = state.inventory.snapshot().map_err(api_error)?;

    let client = ClientState {
        last_version: current.version,
        pending: Some(current),
        feed,
    };
    let events = stream::unfold(client, |mut client| async move {
        if let Some(snapshot) = client.pending.take() {
            return Some((Ok(snapshot_event(&snapshot)), client));
        }
        loop {
            match client.feed.recv().await {
                Ok(snapshot) if snapshot.version <= client.last_version => continue,
                Ok(snapshot) => {
                    client.last_version = snapshot.version;
                    return Some((Ok(snapshot_event(&snapshot)), client));
                }
                // Snapshots are total, so the next one covers whatever was skipped.
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "slow stream client skipped snapshots");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn snapshot_event(snapshot: &Snapshot) -> Event {
    let event = Event::default()
        .event("snapshot")
        .id(snapshot.version.to_string());
    match event.json_data(snapshot) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, version = snapshot.version, "failed to encode snapshot");
            Event::default().event("error").data(e.to_string())
        }
    }
}
