pub mod catalog;
pub mod clock;
pub mod config;
pub mod inventory;
pub mod item;
pub mod location;
pub mod memory_store;
pub mod store;
pub mod view;
pub mod workflow;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;

pub use catalog::*;
pub use clock::*;
pub use config::*;
pub use inventory::{Confirm, DeleteOutcome, Inventory, InventoryError, DELETE_PROMPT};
pub use item::*;
pub use location::*;
pub use memory_store::MemoryItemStore;
pub use store::*;
pub use view::*;
pub use workflow::*;

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteItemStore;
