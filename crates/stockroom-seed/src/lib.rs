//! Offline data tooling for stockroom.
//!
//! - [`csv_import`]: convert a product CSV export into seed JSON
//! - [`upload`]: write seed items to a store in bounded batches
//! - [`migrate`]: normalize legacy location documents
//! - [`generate`]: random but valid test items

pub mod csv_import;
pub mod error;
pub mod generate;
pub mod migrate;
pub mod upload;

pub use csv_import::{convert, read_json, write_json, SeedItem};
pub use error::{Result, SeedError};
pub use generate::TestDataGenerator;
pub use migrate::{migrate_documents, normalize_location};
pub use upload::{upload_items, upload_seed, UploadReport, DEFAULT_BATCH_SIZE};

#[cfg(feature = "sqlite")]
pub use migrate::migrate_store;
