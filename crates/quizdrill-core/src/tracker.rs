//! Per-item progress tracking and mastery.
//!
//! Each item carries an exposure weight that drops slowly on correct answers
//! and snaps back to the default on a miss, so missed items resurface quickly
//! while items heading toward mastery fade from rotation. An item is mastered
//! once its consecutive-correct count reaches the mastery threshold.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::CounterPersistence;
use crate::stats::rounded_percent;
use crate::store::{self, StateStore};

/// Starting (and maximum) weight of an item.
pub const DEFAULT_WEIGHT: u32 = 10;
/// Weight floor.
pub const MIN_WEIGHT: u32 = 1;
/// Weight removed on each correct answer.
pub const WEIGHT_DECREMENT: u32 = 2;
/// Consecutive correct answers needed to master an item.
pub const MASTERY_THRESHOLD: u32 = 3;

/// Anything that can be drilled: it only needs a stable id.
pub trait DrillItem {
    fn item_id(&self) -> &str;
}

impl DrillItem for str {
    fn item_id(&self) -> &str {
        self
    }
}

impl DrillItem for String {
    fn item_id(&self) -> &str {
        self
    }
}

impl<T: DrillItem + ?Sized> DrillItem for &T {
    fn item_id(&self) -> &str {
        (**self).item_id()
    }
}

/// Persisted progress of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemState {
    /// Exposure weight used by the selector.
    #[serde(rename = "frequency")]
    pub weight: u32,
    pub consecutive_correct: u32,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub total_attempts: u32,
}

impl ItemState {
    pub fn new(weight: u32) -> Self {
        Self {
            weight,
            consecutive_correct: 0,
            correct_count: 0,
            total_attempts: 0,
        }
    }
}

/// Weight and mastery parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightPolicy {
    pub default_weight: u32,
    pub min_weight: u32,
    pub weight_decrement: u32,
    pub mastery_threshold: u32,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            default_weight: DEFAULT_WEIGHT,
            min_weight: MIN_WEIGHT,
            weight_decrement: WEIGHT_DECREMENT,
            mastery_threshold: MASTERY_THRESHOLD,
        }
    }
}

impl WeightPolicy {
    /// Apply one answer to an item's state.
    pub fn apply(&self, state: &mut ItemState, is_correct: bool) {
        state.total_attempts = state.total_attempts.saturating_add(1);
        if is_correct {
            state.consecutive_correct = state.consecutive_correct.saturating_add(1);
            state.correct_count = state.correct_count.saturating_add(1);
            state.weight = state
                .weight
                .saturating_sub(self.weight_decrement)
                .max(self.min_weight);
        } else {
            state.consecutive_correct = 0;
            state.weight = self.default_weight;
        }
    }

    pub fn is_mastered(&self, state: &ItemState) -> bool {
        state.consecutive_correct >= self.mastery_threshold
    }
}

/// Mastery progress over a set of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub mastered: usize,
    pub learning: usize,
    pub total: usize,
}

/// Aggregate answer statistics over every tracked item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSummary {
    pub mastered: usize,
    pub total: usize,
    pub correct: u64,
    pub attempts: u64,
    /// Rounded percentage of correct attempts.
    pub accuracy: u32,
}

/// Tracks every item's state plus the global streak for one namespace.
pub struct ItemTracker {
    store: Arc<dyn StateStore>,
    storage_key: String,
    policy: WeightPolicy,
    counters: CounterPersistence,
    states: BTreeMap<String, ItemState>,
    global_streak: u32,
}

impl ItemTracker {
    /// Create a tracker, loading any state persisted under `storage_key`.
    pub fn new(
        store: Arc<dyn StateStore>,
        storage_key: impl Into<String>,
        policy: WeightPolicy,
        counters: CounterPersistence,
    ) -> Self {
        let storage_key = storage_key.into();
        let mut states: BTreeMap<String, ItemState> =
            store::load(store.as_ref(), &storage_key, BTreeMap::new());
        for (id, state) in states.iter_mut() {
            let clamped = state
                .weight
                .min(policy.default_weight)
                .max(policy.min_weight);
            if clamped != state.weight {
                tracing::warn!(
                    key = %storage_key,
                    item = %id,
                    weight = state.weight,
                    clamped,
                    "stored weight out of range"
                );
                state.weight = clamped;
            }
        }
        let global_streak = match counters {
            CounterPersistence::Persisted => {
                store::load(store.as_ref(), &streak_key(&storage_key), 0u32)
            }
            CounterPersistence::Session => 0,
        };
        tracing::debug!(
            key = %storage_key,
            items = states.len(),
            "loaded item states"
        );
        Self {
            store,
            storage_key,
            policy,
            counters,
            states,
            global_streak,
        }
    }

    pub fn policy(&self) -> &WeightPolicy {
        &self.policy
    }

    /// Create default state for every item not seen before. Existing state is
    /// never overwritten.
    pub fn initialize<T: DrillItem>(&mut self, items: &[T]) {
        let default_weight = self.policy.default_weight;
        let mut added = 0usize;
        for item in items {
            if !self.states.contains_key(item.item_id()) {
                self.states
                    .insert(item.item_id().to_string(), ItemState::new(default_weight));
                added += 1;
            }
        }
        if added > 0 {
            tracing::debug!(added, "initialized item states");
            self.save_states();
        }
    }

    /// Record an answer for `item_id` and return the updated state.
    ///
    /// Unknown ids are ignored (the global streak is left alone too) and
    /// yield `None`.
    pub fn record_outcome(&mut self, item_id: &str, is_correct: bool) -> Option<ItemState> {
        let Some(state) = self.states.get_mut(item_id) else {
            tracing::debug!(item_id, "ignoring answer for untracked item");
            return None;
        };

        self.policy.apply(state, is_correct);
        let updated = *state;

        self.global_streak = if is_correct {
            self.global_streak.saturating_add(1)
        } else {
            0
        };

        tracing::debug!(
            item_id,
            is_correct,
            weight = updated.weight,
            streak = updated.consecutive_correct,
            global_streak = self.global_streak,
            "recorded outcome"
        );

        self.save_states();
        if self.counters == CounterPersistence::Persisted {
            store::save(
                self.store.as_ref(),
                &streak_key(&self.storage_key),
                &self.global_streak,
            );
        }
        Some(updated)
    }

    pub fn state(&self, item_id: &str) -> Option<&ItemState> {
        self.states.get(item_id)
    }

    /// Current weight of a tracked item. `None` means "no state", which is
    /// distinct from any stored weight.
    pub fn weight(&self, item_id: &str) -> Option<u32> {
        self.states.get(item_id).map(|s| s.weight)
    }

    /// Consecutive correct answers for an item (0 if untracked).
    pub fn consecutive_correct(&self, item_id: &str) -> u32 {
        self.states
            .get(item_id)
            .map(|s| s.consecutive_correct)
            .unwrap_or(0)
    }

    /// Consecutive correct answers across all items.
    pub fn global_streak(&self) -> u32 {
        self.global_streak
    }

    pub fn is_mastered(&self, item_id: &str) -> bool {
        self.states
            .get(item_id)
            .is_some_and(|s| self.policy.is_mastered(s))
    }

    pub fn mastered_ids(&self) -> BTreeSet<String> {
        self.states
            .iter()
            .filter(|(_, s)| self.policy.is_mastered(s))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Mastery progress. `total` defaults to the number of tracked items.
    pub fn progress(&self, total: Option<usize>) -> Progress {
        let mastered = self
            .states
            .values()
            .filter(|s| self.policy.is_mastered(s))
            .count();
        let total = total.unwrap_or(self.states.len());
        Progress {
            mastered,
            learning: total.saturating_sub(mastered),
            total,
        }
    }

    /// True when exactly `total` items are mastered and none are learning.
    pub fn is_all_mastered(&self, total: usize) -> bool {
        let progress = self.progress(Some(total));
        progress.learning == 0 && progress.mastered == total
    }

    pub fn summary(&self) -> TrackerSummary {
        let mut summary = TrackerSummary {
            mastered: 0,
            total: self.states.len(),
            correct: 0,
            attempts: 0,
            accuracy: 0,
        };
        for state in self.states.values() {
            if self.policy.is_mastered(state) {
                summary.mastered += 1;
            }
            summary.correct += u64::from(state.correct_count);
            summary.attempts += u64::from(state.total_attempts);
        }
        summary.accuracy = rounded_percent(summary.correct, summary.attempts);
        summary
    }

    /// Tracked items in id order.
    pub fn states(&self) -> impl Iterator<Item = (&str, &ItemState)> {
        self.states.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget every item and the global streak.
    pub fn reset(&mut self) {
        self.states.clear();
        self.global_streak = 0;
        store::remove(self.store.as_ref(), &self.storage_key);
        if self.counters == CounterPersistence::Persisted {
            store::remove(self.store.as_ref(), &streak_key(&self.storage_key));
        }
        tracing::debug!(key = %self.storage_key, "item states reset");
    }

    fn save_states(&self) {
        store::save(self.store.as_ref(), &self.storage_key, &self.states);
    }
}

fn streak_key(storage_key: &str) -> String {
    format!("{storage_key}_global_streak")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tracker_with(store: Arc<MemoryStore>, counters: CounterPersistence) -> ItemTracker {
        ItemTracker::new(store, "deck_states", WeightPolicy::default(), counters)
    }

    fn tracker() -> ItemTracker {
        tracker_with(Arc::new(MemoryStore::new()), CounterPersistence::Session)
    }

    #[test]
    fn initialize_creates_defaults_without_overwriting() {
        let mut t = tracker();
        t.initialize(&["a", "b"]);
        t.record_outcome("a", true);
        t.initialize(&["a", "b", "c"]);

        assert_eq!(t.len(), 3);
        assert_eq!(t.state("a").unwrap().correct_count, 1);
        assert_eq!(*t.state("c").unwrap(), ItemState::new(DEFAULT_WEIGHT));
    }

    #[test]
    fn correct_answers_decay_weight_to_floor() {
        let mut t = tracker();
        t.initialize(&["a"]);
        let weights: Vec<u32> = (0..6)
            .map(|_| t.record_outcome("a", true).unwrap().weight)
            .collect();
        assert_eq!(weights, vec![8, 6, 4, 2, 1, 1]);

        let state = t.state("a").unwrap();
        assert_eq!(state.consecutive_correct, 6);
        assert_eq!(state.correct_count, 6);
        assert_eq!(state.total_attempts, 6);
    }

    #[test]
    fn wrong_answer_resets_streak_and_weight() {
        let mut t = tracker();
        t.initialize(&["a"]);
        t.record_outcome("a", true);
        t.record_outcome("a", true);
        let state = t.record_outcome("a", false).unwrap();

        assert_eq!(state.consecutive_correct, 0);
        assert_eq!(state.weight, DEFAULT_WEIGHT);
        assert_eq!(state.correct_count, 2);
        assert_eq!(state.total_attempts, 3);
    }

    #[test]
    fn weight_stays_in_bounds_for_mixed_sequences() {
        let mut t = tracker();
        t.initialize(&["a"]);
        let pattern = [true, true, false, true, true, true, true, true, false, true];
        for (i, ok) in pattern.iter().cycle().take(200).enumerate() {
            let s = t.record_outcome("a", *ok).unwrap();
            assert!(
                (MIN_WEIGHT..=DEFAULT_WEIGHT).contains(&s.weight),
                "step {i}: weight {} out of range",
                s.weight
            );
            assert!(s.consecutive_correct <= s.total_attempts);
        }
    }

    #[test]
    fn mastery_at_threshold_until_miss() {
        let mut t = tracker();
        t.initialize(&["a", "b"]);
        t.record_outcome("a", true);
        t.record_outcome("a", true);
        assert!(!t.is_mastered("a"));
        t.record_outcome("a", true);
        assert!(t.is_mastered("a"));
        t.record_outcome("a", true);
        assert!(t.is_mastered("a"));
        assert_eq!(t.mastered_ids().into_iter().collect::<Vec<_>>(), vec!["a"]);

        t.record_outcome("a", false);
        assert!(!t.is_mastered("a"));
        assert!(t.mastered_ids().is_empty());
    }

    #[test]
    fn unknown_item_is_silent_noop() {
        let mut t = tracker();
        t.initialize(&["a"]);
        t.record_outcome("a", true);
        assert!(t.record_outcome("ghost", false).is_none());
        assert_eq!(t.global_streak(), 1);
        assert_eq!(t.consecutive_correct("ghost"), 0);
        assert!(!t.is_mastered("ghost"));
        assert!(t.weight("ghost").is_none());
    }

    #[test]
    fn global_streak_spans_items() {
        let mut t = tracker();
        t.initialize(&["a", "b"]);
        t.record_outcome("a", true);
        t.record_outcome("b", true);
        t.record_outcome("a", true);
        assert_eq!(t.global_streak(), 3);
        assert_eq!(t.consecutive_correct("a"), 2);
        t.record_outcome("b", false);
        assert_eq!(t.global_streak(), 0);
        assert_eq!(t.consecutive_correct("a"), 2);
    }

    #[test]
    fn progress_and_all_mastered() {
        let mut t = tracker();
        t.initialize(&["a", "b"]);
        for _ in 0..3 {
            t.record_outcome("a", true);
        }
        let p = t.progress(None);
        assert_eq!((p.mastered, p.learning, p.total), (1, 1, 2));
        let p = t.progress(Some(5));
        assert_eq!((p.mastered, p.learning, p.total), (1, 4, 5));
        assert!(!t.is_all_mastered(2));

        for _ in 0..3 {
            t.record_outcome("b", true);
        }
        assert!(t.is_all_mastered(2));
        assert!(!t.is_all_mastered(3));
    }

    #[test]
    fn summary_aggregates_items() {
        let mut t = tracker();
        t.initialize(&["a", "b"]);
        t.record_outcome("a", true);
        t.record_outcome("a", true);
        t.record_outcome("a", true);
        t.record_outcome("b", false);
        let s = t.summary();
        assert_eq!(s.mastered, 1);
        assert_eq!(s.total, 2);
        assert_eq!(s.correct, 3);
        assert_eq!(s.attempts, 4);
        assert_eq!(s.accuracy, 75);
    }

    #[test]
    fn state_round_trips_through_store() {
        let store = Arc::new(MemoryStore::new());
        let mut t = tracker_with(store.clone(), CounterPersistence::Session);
        t.initialize(&["a", "b"]);
        t.record_outcome("a", true);
        t.record_outcome("b", false);

        let reloaded = tracker_with(store, CounterPersistence::Session);
        assert_eq!(reloaded.state("a"), t.state("a"));
        assert_eq!(reloaded.state("b"), t.state("b"));
        assert_eq!(reloaded.global_streak(), 0);
    }

    #[test]
    fn persisted_shape_uses_frequency_field() {
        let store = Arc::new(MemoryStore::new());
        let mut t = tracker_with(store.clone(), CounterPersistence::Session);
        t.initialize(&["q1"]);
        let raw = store.read("deck_states").unwrap().unwrap();
        assert_eq!(
            raw,
            r#"{"q1":{"frequency":10,"consecutiveCorrect":0,"correctCount":0,"totalAttempts":0}}"#
        );
    }

    #[test]
    fn global_streak_persistence_is_configurable() {
        let store = Arc::new(MemoryStore::new());
        let mut t = tracker_with(store.clone(), CounterPersistence::Persisted);
        t.initialize(&["a"]);
        t.record_outcome("a", true);
        t.record_outcome("a", true);
        assert_eq!(
            tracker_with(store.clone(), CounterPersistence::Persisted).global_streak(),
            2
        );
        assert_eq!(
            tracker_with(store, CounterPersistence::Session).global_streak(),
            0
        );
    }

    #[test]
    fn reset_clears_everything() {
        let store = Arc::new(MemoryStore::new());
        let mut t = tracker_with(store.clone(), CounterPersistence::Persisted);
        t.initialize(&["a"]);
        t.record_outcome("a", true);
        t.reset();

        assert!(t.is_empty());
        assert_eq!(t.global_streak(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn out_of_range_weights_clamped_on_load() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(
                "deck_states",
                r#"{"a":{"frequency":99,"consecutiveCorrect":0},
                    "b":{"frequency":0,"consecutiveCorrect":1},
                    "c":{"frequency":6,"consecutiveCorrect":2}}"#,
            )
            .unwrap();

        let t = tracker_with(Arc::clone(&store), CounterPersistence::Session);
        assert_eq!(t.weight("a"), Some(10));
        assert_eq!(t.weight("b"), Some(1));
        assert_eq!(t.weight("c"), Some(6));
        assert_eq!(t.consecutive_correct("b"), 1);
    }
}
