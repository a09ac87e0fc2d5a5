//! Persistent state store capability.
//!
//! The drill components persist opaque JSON blobs under caller-chosen keys.
//! Implementations only move strings around; the typed `load`/`save`/`remove`
//! helpers own serialization and absorb every failure, so a broken store
//! degrades to "state lives in memory until the next successful save".

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

// ---------------------------------------------------------------------------
// StateStore trait
// ---------------------------------------------------------------------------

/// Key → blob storage backend.
pub trait StateStore: Send + Sync {
    /// Human-readable backend name (e.g. "memory", "file").
    fn name(&self) -> &str;

    /// Read the raw value stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// All stored keys starting with `prefix`, sorted.
    fn keys(&self, prefix: &str) -> StoreResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Typed helpers
// ---------------------------------------------------------------------------

/// Load the value under `key`, falling back to `default` when the key is
/// absent or the stored value cannot be read back into `T`.
pub fn load<T: DeserializeOwned>(store: &dyn StateStore, key: &str, default: T) -> T {
    match store.read(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, store = store.name(), "discarding unreadable value: {e}");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            tracing::warn!(key, store = store.name(), "load failed: {e}");
            default
        }
    }
}

/// Serialize `value` and persist it under `key`. Returns `false` on failure.
pub fn save<T: Serialize + ?Sized>(store: &dyn StateStore, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|raw| store.write(key, &raw));
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, store = store.name(), "save failed: {e}");
            false
        }
    }
}

/// Remove `key`. Returns `false` on failure.
pub fn remove(store: &dyn StateStore, key: &str) -> bool {
    match store.delete(key) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, store = store.name(), "remove failed: {e}");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A store that keeps everything in a map. Used by tests and by callers that
/// do not need durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn guard(&self) -> StoreResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl StateStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.guard()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        self.guard()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.guard()?.remove(key);
        Ok(())
    }

    fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .guard()?
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
