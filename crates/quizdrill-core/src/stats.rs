//! Session statistics: running accuracy, the settlement counter, and
//! one-time accuracy milestones.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::CounterPersistence;
use crate::store::{self, StateStore};

/// Answers between two settlements.
pub const SETTLEMENT_INTERVAL: u32 = 20;

/// Accuracy thresholds that each fire once.
pub const DEFAULT_MILESTONES: [u32; 7] = [80, 90, 95, 96, 97, 98, 99];

/// `round(part / whole * 100)` with halves rounded up; 0 when `whole` is 0.
pub fn rounded_percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = (u128::from(part) * 200 + u128::from(whole)) / (u128::from(whole) * 2);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Persisted running totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub correct: u64,
    pub total: u64,
    pub accuracy_rate: u32,
}

/// Settlement and milestone parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
    pub settlement_interval: u32,
    pub milestones: Vec<u32>,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            settlement_interval: SETTLEMENT_INTERVAL,
            milestones: DEFAULT_MILESTONES.to_vec(),
        }
    }
}

/// Tracks accuracy and milestones for one namespace.
pub struct SessionTracker {
    store: Arc<dyn StateStore>,
    storage_key: String,
    policy: SessionPolicy,
    counters: CounterPersistence,
    stats: SessionStats,
    milestones: BTreeMap<u32, bool>,
    answer_count: u32,
}

impl SessionTracker {
    pub fn new(
        store: Arc<dyn StateStore>,
        storage_key: impl Into<String>,
        policy: SessionPolicy,
        counters: CounterPersistence,
    ) -> Self {
        let storage_key = storage_key.into();
        let stats = store::load(store.as_ref(), &storage_key, SessionStats::default());

        let mut milestones = armed_milestones(&policy.milestones);
        let stored: BTreeMap<u32, bool> =
            store::load(store.as_ref(), &milestones_key(&storage_key), BTreeMap::new());
        for (threshold, fired) in stored {
            if let Some(flag) = milestones.get_mut(&threshold) {
                *flag = fired;
            }
        }

        let answer_count = match counters {
            CounterPersistence::Persisted => {
                store::load(store.as_ref(), &answer_count_key(&storage_key), 0u32)
            }
            CounterPersistence::Session => 0,
        };

        Self {
            store,
            storage_key,
            policy,
            counters,
            stats,
            milestones,
            answer_count,
        }
    }

    /// Record one answer and recompute accuracy.
    pub fn record_answer(&mut self, is_correct: bool) {
        self.stats.total += 1;
        if is_correct {
            self.stats.correct += 1;
        }
        self.stats.accuracy_rate = rounded_percent(self.stats.correct, self.stats.total);
        self.answer_count = self.answer_count.saturating_add(1);

        self.save_stats();
        self.save_answer_count();
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// True when the answer count sits on a positive multiple of the
    /// settlement interval. Stays true until the count moves on or is reset.
    pub fn should_settle(&self) -> bool {
        self.answer_count > 0 && self.answer_count % self.policy.settlement_interval == 0
    }

    /// Fire every not-yet-fired milestone at or below `accuracy_rate`,
    /// returning the newly fired thresholds in ascending order.
    pub fn check_milestones(&mut self, accuracy_rate: u32) -> Vec<u32> {
        let mut fired = Vec::new();
        for (threshold, done) in self.milestones.iter_mut() {
            if accuracy_rate >= *threshold && !*done {
                *done = true;
                fired.push(*threshold);
            }
        }
        if !fired.is_empty() {
            tracing::info!(accuracy_rate, ?fired, "accuracy milestones reached");
            self.save_milestones();
        }
        fired
    }

    /// Whether a milestone has already fired. Unknown thresholds report false.
    pub fn milestone_reached(&self, threshold: u32) -> bool {
        self.milestones.get(&threshold).copied().unwrap_or(false)
    }

    pub fn milestones(&self) -> &BTreeMap<u32, bool> {
        &self.milestones
    }

    /// Clear stats and the answer counter. Milestones stay as they are.
    pub fn reset(&mut self) {
        self.stats = SessionStats::default();
        self.answer_count = 0;
        self.save_stats();
        self.save_answer_count();
    }

    /// Re-arm every milestone. Stats stay as they are.
    pub fn reset_milestones(&mut self) {
        self.milestones = armed_milestones(&self.policy.milestones);
        self.save_milestones();
    }

    pub fn reset_answer_count(&mut self) {
        self.answer_count = 0;
        self.save_answer_count();
    }

    pub fn answer_count(&self) -> u32 {
        self.answer_count
    }

    fn save_stats(&self) {
        store::save(self.store.as_ref(), &self.storage_key, &self.stats);
    }

    fn save_milestones(&self) {
        store::save(
            self.store.as_ref(),
            &milestones_key(&self.storage_key),
            &self.milestones,
        );
    }

    fn save_answer_count(&self) {
        if self.counters == CounterPersistence::Persisted {
            store::save(
                self.store.as_ref(),
                &answer_count_key(&self.storage_key),
                &self.answer_count,
            );
        }
    }
}

fn armed_milestones(thresholds: &[u32]) -> BTreeMap<u32, bool> {
    thresholds.iter().map(|t| (*t, false)).collect()
}

fn milestones_key(storage_key: &str) -> String {
    format!("{storage_key}_milestones")
}

fn answer_count_key(storage_key: &str) -> String {
    format!("{storage_key}_answer_count")
}
