//! Shared fixtures for stockroom-core integration tests

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use stockroom_core::{
    FixedClock, Inventory, LocationCatalog, LocationPath, MemoryItemStore, NewItem,
    StorageLocation,
};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 15, 0).unwrap()
}

/// An empty in-memory inventory on the built-in catalog with a fixed clock.
pub fn inventory() -> Inventory<MemoryItemStore> {
    Inventory::with_clock(
        Arc::new(MemoryItemStore::new()),
        Arc::new(LocationCatalog::builtin()),
        Arc::new(FixedClock(fixed_now())),
    )
}

#[allow(dead_code)]
pub fn new_item(name: &str, main: &str, sub: &str, final_: &str) -> NewItem {
    NewItem {
        name: name.to_string(),
        location: LocationPath::new(main, sub, final_),
        storage_location: StorageLocation::default(),
    }
}
