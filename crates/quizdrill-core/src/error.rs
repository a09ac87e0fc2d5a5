//! Storage error types.
//!
//! These errors are produced by `StateStore` implementations. The typed
//! helpers in [`crate::store`] absorb them, so the drill components never see
//! a storage failure as an error: a failed load falls back to the default and
//! a failed save leaves the in-memory state authoritative.

use thiserror::Error;

/// Errors that can occur when reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying medium failed (disk, permissions, ...).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key cannot be represented by this store.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The store is unavailable (lock poisoned, backend closed).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if the failure came from malformed stored data rather
    /// than from the storage medium.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, StoreError::Serialization(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
