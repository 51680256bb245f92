//! Error types for stockroom-seed

use stockroom_core::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeedError>;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Missing CSV column: {0}")]
    MissingColumn(&'static str),

    #[error("CSV error at line {line}: {message}")]
    Row { line: u64, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
