//! Snapshot export and import.
//!
//! A snapshot is every key under a prefix, with each value kept as parsed
//! JSON so the file stays readable:
//! ```json
//! { "version": "2.0", "exportedAt": 1700000000000, "count": 2,
//!   "data": { "capitals_score": 53, "capitals_states": { ... } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use quizdrill_core::store::StateStore;

/// Format version written into new snapshots.
pub const SNAPSHOT_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub exported_at: DateTime<Utc>,
    pub count: usize,
    pub data: BTreeMap<String, serde_json::Value>,
}

/// Collect every key starting with `prefix`. Values that are not valid JSON
/// are skipped with a warning.
pub fn export_snapshot(store: &dyn StateStore, prefix: &str) -> Result<Snapshot> {
    let mut data = BTreeMap::new();
    for key in store
        .keys(prefix)
        .with_context(|| format!("failed to list keys in {} store", store.name()))?
    {
        let Some(raw) = store
            .read(&key)
            .with_context(|| format!("failed to read key: {key}"))?
        else {
            continue;
        };
        match serde_json::from_str(&raw) {
            Ok(value) => {
                data.insert(key, value);
            }
            Err(e) => tracing::warn!(key = %key, "skipping unreadable value: {e}"),
        }
    }

    tracing::debug!(prefix, count = data.len(), "exported snapshot");
    Ok(Snapshot {
        version: SNAPSHOT_VERSION.to_string(),
        exported_at: Utc::now(),
        count: data.len(),
        data,
    })
}

/// Write every entry of `snapshot` into `store`, overwriting existing keys.
/// Returns the number of keys written.
pub fn import_snapshot(store: &dyn StateStore, snapshot: &Snapshot) -> Result<usize> {
    if snapshot.version != SNAPSHOT_VERSION {
        tracing::warn!(
            version = %snapshot.version,
            expected = SNAPSHOT_VERSION,
            "importing snapshot with a different version"
        );
    }
    for (key, value) in &snapshot.data {
        store
            .write(key, &value.to_string())
            .with_context(|| format!("failed to write key: {key}"))?;
    }
    Ok(snapshot.data.len())
}

/// Delete every key starting with `prefix`. Returns the number deleted.
pub fn clear_prefix(store: &dyn StateStore, prefix: &str) -> Result<usize> {
    let keys = store
        .keys(prefix)
        .with_context(|| format!("failed to list keys in {} store", store.name()))?;
    for key in &keys {
        store
            .delete(key)
            .with_context(|| format!("failed to delete key: {key}"))?;
    }
    Ok(keys.len())
}

/// Write `value` as pretty JSON to `path`.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Read a JSON file into `T`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}
