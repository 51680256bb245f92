use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{Item, ItemId};

/// The full item collection at one point in time.
///
/// Every store change produces a new snapshot with a higher `version`.
/// Snapshots are total: consumers replace their state, never merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub items: Vec<Item>,
}

impl Snapshot {
    /// Repair flag/time pairs on every item.
    pub fn normalized(mut self, now: DateTime<Utc>) -> Self {
        for item in &mut self.items {
            item.normalize_status(now);
        }
        self
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// The trait that all storage backends implement.
pub trait ItemStore: Send + Sync {
    /// Subscribe to the collection. The current snapshot is delivered
    /// immediately, then one snapshot per change until the handle is dropped.
    fn subscribe(&self) -> Result<Subscription, StoreError>;

    /// All items in store order.
    fn list(&self) -> Result<Vec<Item>, StoreError>;

    /// Get an item by ID.
    fn get(&self, id: &str) -> Result<Option<Item>, StoreError>;

    /// Create-or-replace every item in one all-or-nothing batch.
    ///
    /// Items with an empty id are created under a fresh id. Returns the ids
    /// in input order.
    fn upsert_batch(&self, items: Vec<Item>) -> Result<Vec<ItemId>, StoreError>;

    /// Delete an item by ID.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Insert or replace a single item.
    fn upsert(&self, item: Item) -> Result<ItemId, StoreError> {
        self.upsert_batch(vec![item])?
            .pop()
            .ok_or_else(|| StoreError::Storage("upsert returned no id".to_string()))
    }
}

impl<S: ItemStore + ?Sized> ItemStore for Arc<S> {
    fn subscribe(&self) -> Result<Subscription, StoreError> {
        (**self).subscribe()
    }

    fn list(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list()
    }

    fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        (**self).get(id)
    }

    fn upsert_batch(&self, items: Vec<Item>) -> Result<Vec<ItemId>, StoreError> {
        (**self).upsert_batch(items)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}

/// Errors from the item store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Subscription closed")]
    Closed,
}

/// Generate an id for a newly created item.
pub fn new_item_id() -> ItemId {
    uuid::Uuid::new_v4().to_string()
}

type Transform = Box<dyn Fn(Snapshot) -> Snapshot + Send>;

/// Live handle on a store's snapshot stream.
///
/// Dropping the handle (or calling [`Subscription::cancel`]) unsubscribes.
pub struct Subscription {
    id: u64,
    rx: Receiver<Snapshot>,
    hub: Weak<Mutex<HubState>>,
    transform: Option<Transform>,
}

impl Subscription {
    /// Apply `f` to every snapshot delivered from now on.
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(Snapshot) -> Snapshot + Send + 'static,
    {
        self.transform = Some(match self.transform.take() {
            Some(prev) => Box::new(move |s| f(prev(s))),
            None => Box::new(f),
        });
        self
    }

    fn apply(&self, snapshot: Snapshot) -> Snapshot {
        match &self.transform {
            Some(f) => f(snapshot),
            None => snapshot,
        }
    }

    /// Block until the next snapshot.
    pub fn recv(&self) -> Result<Snapshot, StoreError> {
        self.rx
            .recv()
            .map(|s| self.apply(s))
            .map_err(|_| StoreError::Closed)
    }

    /// Next snapshot if one is already waiting.
    pub fn try_recv(&self) -> Result<Option<Snapshot>, StoreError> {
        match self.rx.try_recv() {
            Ok(s) => Ok(Some(self.apply(s))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(StoreError::Closed),
        }
    }

    /// Wait up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Snapshot>, StoreError> {
        match self.rx.recv_timeout(timeout) {
            Ok(s) => Ok(Some(self.apply(s))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(StoreError::Closed),
        }
    }

    /// Drain everything queued and return only the newest snapshot.
    pub fn latest(&self) -> Option<Snapshot> {
        let mut newest = None;
        while let Ok(s) = self.rx.try_recv() {
            newest = Some(s);
        }
        newest.map(|s| self.apply(s))
    }

    /// Stop receiving snapshots.
    pub fn cancel(self) {}
}

impl Iterator for Subscription {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        self.recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            lock_hub(&hub).subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscribers: Vec<(u64, Sender<Snapshot>)>,
}

fn lock_hub(hub: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    // Sender bookkeeping stays valid even if a holder panicked.
    hub.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fan-out of snapshots to live subscribers, shared by the store backends.
///
/// Backends call [`SnapshotHub::subscribe`] and [`SnapshotHub::publish`]
/// while holding their own data lock so snapshots arrive in version order.
#[derive(Default)]
pub struct SnapshotHub {
    inner: Arc<Mutex<HubState>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and hand it `current` straight away.
    pub fn subscribe(&self, current: Snapshot) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(current);
        let mut state = lock_hub(&self.inner);
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, tx));
        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
            transform: None,
        }
    }

    /// Send a snapshot to every subscriber, pruning those that went away.
    pub fn publish(&self, snapshot: Snapshot) {
        let mut state = lock_hub(&self.inner);
        state
            .subscribers
            .retain(|(_, tx)| tx.send(snapshot.clone()).is_ok());
        tracing::trace!(
            version = snapshot.version,
            subscribers = state.subscribers.len(),
            "published snapshot"
        );
    }

    pub fn subscriber_count(&self) -> usize {
        lock_hub(&self.inner).subscribers.len()
    }
}
