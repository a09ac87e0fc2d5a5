//! JSON-file state store.
//!
//! Layout under the data directory:
//! ```text
//! data/
//! ├── capitals_states.json
//! ├── capitals_stats.json
//! └── capitals_score.json
//! ```
//! Writes go to a hidden temp file first and are renamed into place.
//!
//! Keys are percent-encoded into file names, so any namespace is storable:
//! `world capitals_score` lands in `world%20capitals_score.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quizdrill_core::error::{StoreError, StoreResult};
use quizdrill_core::store::StateStore;

const EXTENSION: &str = "json";

/// Stores each key as `<key>.json` inside one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(format!("{}.{EXTENSION}", encode_key(key)?)))
    }
}

/// Map a key to a file stem. Bytes outside `[A-Za-z0-9_-]` become `%XX`,
/// which keeps separators, dots and non-ASCII text out of the path.
fn encode_key(key: &str) -> StoreResult<String> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    Ok(encoded)
}

/// Inverse of [`encode_key`]. Returns `None` for stems this store did not write.
fn decode_key(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&first, tail)) = rest.split_first() {
        if first == b'%' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(first);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}

impl StateStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let stem = encode_key(key)?;
        let path = self.root.join(format!("{stem}.{EXTENSION}"));
        let tmp = self.root.join(format!(".{stem}.{EXTENSION}.tmp"));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || !path.extension().is_some_and(|ext| ext == EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            match decode_key(stem) {
                Some(key) if key.starts_with(prefix) => keys.push(key),
                Some(_) => {}
                None => tracing::debug!(file = %path.display(), "skipping foreign file"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use quizdrill_core::config::{CounterPersistence, DrillConfig};
    use quizdrill_core::engine::DrillEngine;
    use quizdrill_core::stats::{SessionPolicy, SessionTracker};
    use quizdrill_core::store;
    use quizdrill_core::tracker::{ItemState, ItemTracker, WeightPolicy};

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn read_write_delete() {
        let (_dir, s) = temp_store();
        assert_eq!(s.read("deck_score").unwrap(), None);
        s.write("deck_score", "42").unwrap();
        assert_eq!(s.read("deck_score").unwrap().as_deref(), Some("42"));
        assert!(s.root().join("deck_score.json").is_file());

        s.write("deck_score", "43").unwrap();
        assert_eq!(s.read("deck_score").unwrap().as_deref(), Some("43"));

        s.delete("deck_score").unwrap();
        s.delete("deck_score").unwrap();
        assert_eq!(s.read("deck_score").unwrap(), None);
    }

    #[test]
    fn rejects_only_empty_key() {
        let (_dir, s) = temp_store();
        assert!(matches!(s.write("", "1"), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn path_like_keys_stay_inside_root() {
        let (dir, s) = temp_store();
        for key in ["../escape", "a/b", ".hidden", "..", "50%_off"] {
            s.write(key, "1").unwrap();
            assert_eq!(s.read(key).unwrap().as_deref(), Some("1"), "key {key:?}");
        }
        assert!(!dir.path().join("escape.json").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(s.root().join("%2E%2E%2Fescape.json").is_file());

        let mut expected = vec!["../escape", "a/b", ".hidden", "..", "50%_off"];
        expected.sort();
        assert_eq!(s.keys("").unwrap(), expected);
    }

    #[test]
    fn namespaces_with_spaces_and_unicode_round_trip() {
        let (_dir, s) = temp_store();
        s.write("world capitals_score", "1").unwrap();
        s.write("世界首都_score", "2").unwrap();
        s.write("world_score", "3").unwrap();

        assert!(s.root().join("world%20capitals_score.json").is_file());
        assert_eq!(
            s.read("world capitals_score").unwrap().as_deref(),
            Some("1")
        );
        assert_eq!(s.read("世界首都_score").unwrap().as_deref(), Some("2"));
        assert_eq!(
            s.keys("world capitals_").unwrap(),
            vec!["world capitals_score"]
        );
        assert_eq!(s.keys("世界首都_").unwrap(), vec!["世界首都_score"]);

        s.delete("world capitals_score").unwrap();
        assert!(s.keys("world capitals_").unwrap().is_empty());
    }

    #[test]
    fn engine_progress_survives_reopen_with_spaced_namespace() {
        let (_dir, s) = temp_store();
        let s: Arc<dyn StateStore> = Arc::new(s);
        let config = DrillConfig {
            seed: Some(3),
            ..DrillConfig::default()
        };
        {
            let mut engine = DrillEngine::new(Arc::clone(&s), "world capitals", &config).unwrap();
            engine.initialize(&["fr", "jp"]);
            engine.submit_answer("fr", true).unwrap();
            engine.submit_answer("jp", false).unwrap();
            assert_eq!(engine.ledger().score(), 1);
        }

        let mut engine = DrillEngine::new(Arc::clone(&s), "world capitals", &config).unwrap();
        engine.initialize(&["fr", "jp"]);
        assert_eq!(engine.ledger().score(), 1);
        assert_eq!(engine.tracker().len(), 2);
        assert_eq!(engine.tracker().weight("fr"), Some(8));
        assert!(engine.wrong_book().contains("jp"));
    }

    #[test]
    fn keys_filter_by_prefix_and_skip_temp_files() {
        let (_dir, s) = temp_store();
        s.write("capitals_states", "{}").unwrap();
        s.write("capitals_score", "0").unwrap();
        s.write("math_score", "0").unwrap();
        fs::write(s.root().join(".capitals_score.json.tmp"), "9").unwrap();
        fs::write(s.root().join("notes.txt"), "x").unwrap();

        assert_eq!(
            s.keys("capitals_").unwrap(),
            vec!["capitals_score", "capitals_states"]
        );
        assert_eq!(s.keys("").unwrap().len(), 3);
    }

    #[test]
    fn tracker_state_round_trips_through_files() {
        let (_dir, s) = temp_store();
        let s: Arc<dyn StateStore> = Arc::new(s);
        {
            let mut tracker = ItemTracker::new(
                Arc::clone(&s),
                "deck_states",
                WeightPolicy::default(),
                CounterPersistence::Session,
            );
            tracker.initialize(&["a", "b"]);
            tracker.record_outcome("a", true);

            let mut session = SessionTracker::new(
                Arc::clone(&s),
                "deck_stats",
                SessionPolicy::default(),
                CounterPersistence::Session,
            );
            session.record_answer(true);
            session.check_milestones(session.stats().accuracy_rate);
        }

        let tracker = ItemTracker::new(
            Arc::clone(&s),
            "deck_states",
            WeightPolicy::default(),
            CounterPersistence::Session,
        );
        assert_eq!(tracker.weight("a"), Some(8));
        assert_eq!(tracker.weight("b"), Some(10));

        let session = SessionTracker::new(
            Arc::clone(&s),
            "deck_stats",
            SessionPolicy::default(),
            CounterPersistence::Session,
        );
        assert_eq!(session.stats().total, 1);
        assert!(session.milestone_reached(99));
    }

    #[test]
    fn corrupt_file_loads_default() {
        let (_dir, s) = temp_store();
        fs::write(s.root().join("deck_states.json"), "{ not json").unwrap();
        let loaded: BTreeMap<String, ItemState> = store::load(&s, "deck_states", BTreeMap::new());
        assert!(loaded.is_empty());
    }
}
