//! Error types for repairhub-bus.

use thiserror::Error;

/// Bus error types.
#[derive(Debug, Error)]
pub enum BusError {
    /// The underlying shared store rejected the write.
    #[error("store error: {0}")]
    Store(#[from] repairhub_store::StoreError),

    /// A payload could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
