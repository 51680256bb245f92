use std::sync::{Mutex, MutexGuard};

use crate::item::{Item, ItemId};
use crate::store::{new_item_id, ItemStore, Snapshot, SnapshotHub, StoreError, Subscription};

/// In-process implementation of the ItemStore trait.
///
/// Items keep insertion order. Useful for tests and for running the CLI or
/// server without a database file.
pub struct MemoryItemStore {
    state: Mutex<MemoryState>,
    hub: SnapshotHub,
}

#[derive(Default)]
struct MemoryState {
    items: Vec<Item>,
    version: u64,
    fail_next: Option<String>,
}

impl MemoryState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            items: self.items.clone(),
        }
    }

    fn take_failure(&mut self) -> Result<(), StoreError> {
        match self.fail_next.take() {
            Some(msg) => Err(StoreError::Storage(msg)),
            None => Ok(()),
        }
    }
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            hub: SnapshotHub::new(),
        }
    }

    /// A store pre-filled with `items`; empty ids are assigned.
    pub fn with_items(items: Vec<Item>) -> Result<Self, StoreError> {
        let store = Self::new();
        if !items.is_empty() {
            store.upsert_batch(items)?;
        }
        Ok(store)
    }

    /// Make the next write (upsert or delete) fail with `message`.
    pub fn fail_next_write(&self, message: &str) {
        if let Ok(mut state) = self.lock() {
            state.fail_next = Some(message.to_string());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|e| StoreError::Storage(e.to_string()))
    }
}

impl Default for MemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore for MemoryItemStore {
    fn subscribe(&self) -> Result<Subscription, StoreError> {
        let state = self.lock()?;
        Ok(self.hub.subscribe(state.snapshot()))
    }

    fn list(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.lock()?.items.clone())
    }

    fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.lock()?.items.iter().find(|i| i.id == id).cloned())
    }

    fn upsert_batch(&self, items: Vec<Item>) -> Result<Vec<ItemId>, StoreError> {
        let mut state = self.lock()?;
        state.take_failure()?;

        // Stage on a copy so a rejected batch leaves nothing behind.
        let mut staged = state.items.clone();
        let mut ids = Vec::with_capacity(items.len());
        for mut item in items {
            if item.name.trim().is_empty() {
                return Err(StoreError::Validation("item name is empty".to_string()));
            }
            if item.id.is_empty() {
                item.id = new_item_id();
            }
            ids.push(item.id.clone());
            match staged.iter_mut().find(|i| i.id == item.id) {
                Some(existing) => *existing = item,
                None => staged.push(item),
            }
        }

        state.items = staged;
        state.version += 1;
        self.hub.publish(state.snapshot());
        Ok(ids)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.take_failure()?;
        let pos = state
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        state.items.remove(pos);
        state.version += 1;
        self.hub.publish(state.snapshot());
        Ok(())
    }
}
