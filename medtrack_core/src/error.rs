//! Error types for the medtrack_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medtrack_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored value could not be read or parsed.
    ///
    /// Callers recover from this by treating the key as absent.
    #[error("Failed to read '{key}' from storage: {reason}")]
    StorageRead { key: String, reason: String },

    /// A write did not commit; prior stored content is unchanged
    #[error("Failed to write '{key}' to storage: {reason}")]
    StorageWrite { key: String, reason: String },

    /// Storage key contains characters that cannot be mapped to a file name
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Attempt to set stock to a negative value
    #[error("Stock may not be negative (got {0})")]
    InvalidStock(i64),

    /// Add-medicine input rejected before persistence
    #[error("Invalid medicine: {0}")]
    Validation(String),

    /// No medicine with the given id
    #[error("No medicine with id {0:?}")]
    NotFound(String),
}
