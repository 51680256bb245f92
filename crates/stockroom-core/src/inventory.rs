//! Inventory operations over an [`ItemStore`].
//!
//! `Inventory` is the single entry point the CLI, the HTTP server and the
//! seeding tools use to read and change items. It owns the catalog used for
//! validation and the clock used for status timestamps.

use std::sync::Arc;

use crate::catalog::{LocationCatalog, LocationError};
use crate::clock::{Clock, SystemClock};
use crate::item::{Item, ItemId, NewItem, StatusKind};
use crate::location::{LocationPath, StorageLocation};
use crate::store::{ItemStore, Snapshot, StoreError, Subscription};
use crate::workflow::LocationChange;

/// Prompt shown before an item is deleted.
pub const DELETE_PROMPT: &str = "정말로 이 아이템을 삭제하시겠습니까?";

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid location: {0}")]
    Location(#[from] LocationError),

    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, InventoryError>;

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

pub struct Inventory<S: ItemStore + ?Sized> {
    store: Arc<S>,
    catalog: Arc<LocationCatalog>,
    clock: Arc<dyn Clock>,
}

impl<S: ItemStore + ?Sized> Clone for Inventory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: ItemStore + ?Sized> Inventory<S> {
    pub fn new(store: Arc<S>, catalog: Arc<LocationCatalog>) -> Self {
        Self::with_clock(store, catalog, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, catalog: Arc<LocationCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            catalog,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<LocationCatalog> {
        &self.catalog
    }

    /// Live snapshots with status pairs repaired on the way out.
    pub fn subscribe(&self) -> Result<Subscription> {
        let clock = Arc::clone(&self.clock);
        Ok(self
            .store
            .subscribe()?
            .map(move |s| s.normalized(clock.now())))
    }

    /// The current collection, normalized.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let sub = self.subscribe()?;
        Ok(sub.recv()?)
    }

    pub fn get(&self, id: &str) -> Result<Item> {
        self.store
            .get(id)?
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))
    }

    /// Write every item in one all-or-nothing batch.
    pub fn update_items(&self, items: Vec<Item>) -> Result<Vec<ItemId>> {
        let count = items.len();
        self.store.upsert_batch(items).map_err(|e| {
            tracing::error!(error = %e, count, "failed to update items");
            e.into()
        })
    }

    pub fn delete_item(&self, id: &str) -> Result<()> {
        self.store.delete(id).map_err(|e| {
            tracing::error!(error = %e, id, "failed to delete item");
            e.into()
        })
    }

    /// Validate and create an item with both status flags cleared.
    pub fn add_item(&self, new: NewItem) -> Result<ItemId> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(InventoryError::Validation("item name is required".to_string()));
        }
        if new.location.main.is_empty() {
            return Err(InventoryError::Validation(
                "item location is required".to_string(),
            ));
        }
        self.catalog.validate(&new.location)?;
        if !new.storage_location.is_empty() {
            self.catalog.validate(&new.storage_location.as_path())?;
        }

        let item = Item::from_new(NewItem { name, ..new });
        let name = item.name.clone();
        let id = self.store.upsert(item)?;
        tracing::info!(id = %id, name = %name, "added item");
        Ok(id)
    }

    /// Set one status flag and its timestamp together.
    pub fn set_status(&self, id: &str, kind: StatusKind, value: bool) -> Result<Item> {
        let now = self.clock.now();
        self.modify(id, |item| item.set_status(kind, value, now))
    }

    /// Exchange the sales and storage paths of an item.
    pub fn swap_locations(&self, id: &str) -> Result<Item> {
        self.modify(id, Item::swap_locations)
    }

    /// Replace the memo; blank text removes it.
    pub fn update_memo(&self, id: &str, memo: &str) -> Result<Item> {
        self.modify(id, |item| item.set_memo(memo))
    }

    /// Move an item to new sales and storage paths.
    pub fn change_location(
        &self,
        id: &str,
        location: LocationPath,
        storage: StorageLocation,
    ) -> Result<Item> {
        self.catalog.validate(&location)?;
        if !storage.is_empty() {
            self.catalog.validate(&storage.as_path())?;
        }
        self.modify(id, move |item| {
            item.location = location;
            item.storage_location = storage;
        })
    }

    /// Commit a saved location edit.
    pub fn apply_location_change(&self, change: LocationChange) -> Result<Item> {
        self.change_location(&change.item_id, change.location, change.storage_location)
    }

    /// Delete after asking `confirm`. A declined prompt touches nothing.
    pub fn delete_with_confirmation(
        &self,
        id: &str,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome> {
        if !confirm.confirm(DELETE_PROMPT) {
            tracing::debug!(id, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }
        self.delete_item(id)?;
        tracing::info!(id, "deleted item");
        Ok(DeleteOutcome::Deleted)
    }

    fn modify<F>(&self, id: &str, f: F) -> Result<Item>
    where
        F: FnOnce(&mut Item),
    {
        let mut item = self.get(id)?;
        f(&mut item);
        self.store.upsert(item.clone())?;
        Ok(item)
    }
}
