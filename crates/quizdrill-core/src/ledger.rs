//! Persisted score total.

use std::sync::Arc;

use crate::store::{self, StateStore};

/// Accumulates reward points for one namespace.
pub struct ScoreLedger {
    store: Arc<dyn StateStore>,
    storage_key: String,
    total: u64,
}

impl ScoreLedger {
    pub fn new(store: Arc<dyn StateStore>, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let total = store::load(store.as_ref(), &storage_key, 0u64);
        Self {
            store,
            storage_key,
            total,
        }
    }

    /// Add points and return the new total.
    pub fn add_score(&mut self, points: u32) -> u64 {
        self.total = self.total.saturating_add(u64::from(points));
        self.save();
        self.total
    }

    pub fn score(&self) -> u64 {
        self.total
    }

    pub fn reset(&mut self) {
        self.total = 0;
        self.save();
    }

    fn save(&self) {
        store::save(self.store.as_ref(), &self.storage_key, &self.total);
    }
}
