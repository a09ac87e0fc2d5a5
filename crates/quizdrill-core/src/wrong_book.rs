//! Wrong book: outstanding mistakes per item.
//!
//! A miss adds one to the item's count, a correct answer takes one away, and
//! the entry disappears when the count reaches zero. The engine uses the book
//! to run review rounds over previously missed items only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{self, StateStore};

/// One item with outstanding mistakes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongBookEntry {
    pub question_id: String,
    pub wrong_count: u32,
    #[serde(rename = "lastWrongTime", with = "chrono::serde::ts_milliseconds")]
    pub last_wrong_at: DateTime<Utc>,
}

pub struct WrongBook {
    store: Arc<dyn StateStore>,
    storage_key: String,
    entries: Vec<WrongBookEntry>,
}

impl WrongBook {
    pub fn new(store: Arc<dyn StateStore>, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let entries = store::load(store.as_ref(), &storage_key, Vec::new());
        Self {
            store,
            storage_key,
            entries,
        }
    }

    /// Record a miss for `question_id`.
    pub fn add_wrong(&mut self, question_id: &str) {
        self.record_miss(question_id, Utc::now());
    }

    fn record_miss(&mut self, question_id: &str, at: DateTime<Utc>) {
        match self.position(question_id) {
            Some(i) => {
                let entry = &mut self.entries[i];
                entry.wrong_count = entry.wrong_count.saturating_add(1);
                entry.last_wrong_at = at;
            }
            None => self.entries.push(WrongBookEntry {
                question_id: question_id.to_string(),
                wrong_count: 1,
                last_wrong_at: at,
            }),
        }
        self.save();
    }

    /// Retire one mistake for `question_id`. Unknown ids are ignored.
    pub fn remove_wrong(&mut self, question_id: &str) {
        let Some(i) = self.position(question_id) else {
            return;
        };
        let entry = &mut self.entries[i];
        entry.wrong_count = entry.wrong_count.saturating_sub(1);
        if entry.wrong_count == 0 {
            self.entries.remove(i);
            tracing::debug!(question_id, "cleared from wrong book");
        }
        self.save();
    }

    /// Overwrite the mistake count of an existing entry. A count of zero
    /// removes the entry.
    pub fn update_wrong_count(&mut self, question_id: &str, count: u32) {
        let Some(i) = self.position(question_id) else {
            return;
        };
        if count == 0 {
            self.entries.remove(i);
        } else {
            let entry = &mut self.entries[i];
            entry.wrong_count = count;
            entry.last_wrong_at = Utc::now();
        }
        self.save();
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[WrongBookEntry] {
        &self.entries
    }

    pub fn get(&self, question_id: &str) -> Option<&WrongBookEntry> {
        self.entries.iter().find(|e| e.question_id == question_id)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.position(question_id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.save();
    }

    /// Entries ordered by mistake count, most-missed first. Ties keep
    /// insertion order.
    pub fn sorted_by_wrong_count(&self) -> Vec<WrongBookEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.wrong_count.cmp(&a.wrong_count));
        sorted
    }

    fn position(&self, question_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.question_id == question_id)
    }

    fn save(&self) {
        store::save(self.store.as_ref(), &self.storage_key, &self.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn book_with(store: Arc<MemoryStore>) -> WrongBook {
        WrongBook::new(store, "deck_wrong_book")
    }

    fn book() -> WrongBook {
        book_with(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn misses_accumulate_and_corrects_retire() {
        let mut b = book();
        b.add_wrong("q1");
        b.add_wrong("q1");
        assert_eq!(b.get("q1").unwrap().wrong_count, 2);

        b.remove_wrong("q1");
        assert_eq!(b.get("q1").unwrap().wrong_count, 1);
        b.remove_wrong("q1");
        assert!(!b.contains("q1"));
        assert_eq!(b.count(), 0);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut b = book();
        b.add_wrong("q1");
        b.remove_wrong("nope");
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn update_wrong_count() {
        let mut b = book();
        b.add_wrong("q1");
        b.update_wrong_count("q1", 5);
        assert_eq!(b.get("q1").unwrap().wrong_count, 5);
        b.update_wrong_count("missing", 3);
        assert!(!b.contains("missing"));
        b.update_wrong_count("q1", 0);
        assert!(!b.contains("q1"));
    }

    #[test]
    fn sorted_by_wrong_count_is_stable() {
        let mut b = book();
        b.add_wrong("a");
        b.add_wrong("b");
        b.add_wrong("b");
        b.add_wrong("c");
        let ids: Vec<String> = b
            .sorted_by_wrong_count()
            .into_iter()
            .map(|e| e.question_id)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        // The stored order is untouched.
        assert_eq!(b.entries()[0].question_id, "a");
    }

    #[test]
    fn persisted_shape_and_reload() {
        let store = Arc::new(MemoryStore::new());
        let mut b = book_with(store.clone());
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        b.record_miss("q7", at);

        let raw = store.read("deck_wrong_book").unwrap().unwrap();
        assert_eq!(
            raw,
            r#"[{"questionId":"q7","wrongCount":1,"lastWrongTime":1700000000000}]"#
        );

        let reloaded = book_with(store);
        assert_eq!(reloaded.entries(), b.entries());
    }

    #[test]
    fn clear_empties_book() {
        let store = Arc::new(MemoryStore::new());
        let mut b = book_with(store.clone());
        b.add_wrong("a");
        b.clear();
        assert_eq!(b.count(), 0);
        assert_eq!(book_with(store).count(), 0);
    }
}
