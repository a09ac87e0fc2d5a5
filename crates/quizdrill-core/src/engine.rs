//! Central drill engine.
//!
//! Owns every component for one storage namespace and runs the per-answer
//! flow: item progress → reward → score → wrong book → session stats →
//! milestones/settlement → observer.

use std::sync::Arc;

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::DrillConfig;
use crate::ledger::ScoreLedger;
use crate::reward::{Celebration, RewardPolicy, SettlementReward};
use crate::selector;
use crate::stats::SessionTracker;
use crate::store::StateStore;
use crate::tracker::{DrillItem, ItemTracker};
use crate::wrong_book::WrongBook;

/// Storage keys used by one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub states: String,
    pub stats: String,
    pub score: String,
    pub wrong_book: String,
}

impl StorageKeys {
    pub fn for_namespace(namespace: &str) -> Self {
        Self {
            states: format!("{namespace}_states"),
            stats: format!("{namespace}_stats"),
            score: format!("{namespace}_score"),
            wrong_book: format!("{namespace}_wrong_book"),
        }
    }
}

/// Everything that happened as a result of one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub item_id: String,
    pub is_correct: bool,
    /// Consecutive correct answers for this item after the update.
    pub item_streak: u32,
    /// Consecutive correct answers across all items.
    pub global_streak: u32,
    pub mastered: bool,
    pub points: u32,
    pub celebration: Celebration,
    pub total_score: u64,
    /// Accuracy milestones crossed by this answer, ascending.
    pub milestones: Vec<u32>,
    pub accuracy_rate: u32,
    /// A settlement is waiting for [`DrillEngine::acknowledge_settlement`].
    pub settlement_due: bool,
}

/// Notification hooks for presentation and sync collaborators.
///
/// Called synchronously; implementations must return promptly and hand any
/// slow work off elsewhere.
pub trait DrillObserver: Send + Sync {
    fn on_answer(&self, outcome: &AnswerOutcome);
    fn on_milestone(&self, threshold: u32, accuracy_rate: u32);
    fn on_settlement(&self, reward: &SettlementReward, total_score: u64);
    fn on_victory(&self, points: u32, total_score: u64);
}

/// No-op observer.
pub struct NoopObserver;

impl DrillObserver for NoopObserver {
    fn on_answer(&self, _: &AnswerOutcome) {}
    fn on_milestone(&self, _: u32, _: u32) {}
    fn on_settlement(&self, _: &SettlementReward, _: u64) {}
    fn on_victory(&self, _: u32, _: u64) {}
}

/// The drill engine for one namespace.
pub struct DrillEngine {
    namespace: String,
    tracker: ItemTracker,
    session: SessionTracker,
    rewards: RewardPolicy,
    ledger: ScoreLedger,
    wrong_book: WrongBook,
    rng: ChaCha8Rng,
    observer: Box<dyn DrillObserver>,
    victory_claimed: bool,
}

impl DrillEngine {
    /// Build an engine, loading persisted state for `namespace` from `store`.
    pub fn new(
        store: Arc<dyn StateStore>,
        namespace: impl Into<String>,
        config: &DrillConfig,
    ) -> Result<Self> {
        let namespace = namespace.into();
        anyhow::ensure!(!namespace.is_empty(), "namespace must not be empty");
        config.policy.validate()?;

        let keys = StorageKeys::for_namespace(&namespace);
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        tracing::debug!(
            namespace = %namespace,
            store = store.name(),
            seeded = config.seed.is_some(),
            "opening drill engine"
        );

        Ok(Self {
            tracker: ItemTracker::new(
                Arc::clone(&store),
                keys.states,
                config.policy.weight_policy(),
                config.counter_persistence,
            ),
            session: SessionTracker::new(
                Arc::clone(&store),
                keys.stats,
                config.policy.session_policy(),
                config.counter_persistence,
            ),
            rewards: config.policy.reward_policy()?,
            ledger: ScoreLedger::new(Arc::clone(&store), keys.score),
            wrong_book: WrongBook::new(store, keys.wrong_book),
            rng,
            observer: Box::new(NoopObserver),
            victory_claimed: false,
            namespace,
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn DrillObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Create state for items not seen before.
    pub fn initialize<T: DrillItem>(&mut self, items: &[T]) {
        self.tracker.initialize(items);
    }

    /// Pick the next item, or `None` when every item is mastered.
    pub fn select_question<'a, T: DrillItem>(&mut self, items: &'a [T]) -> Option<&'a T> {
        selector::select(&mut self.tracker, items, &mut self.rng)
    }

    /// Pick the next item among those with outstanding mistakes.
    pub fn select_review_question<'a, T: DrillItem>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let pool: Vec<&'a T> = items
            .iter()
            .filter(|item| self.wrong_book.contains(item.item_id()))
            .collect();
        selector::select(&mut self.tracker, &pool, &mut self.rng).copied()
    }

    /// Record an answer. Returns `None` (and records nothing) when the item
    /// has no tracked state.
    pub fn submit_answer(&mut self, item_id: &str, is_correct: bool) -> Option<AnswerOutcome> {
        let state = self.tracker.record_outcome(item_id, is_correct)?;
        let mastered = self.tracker.is_mastered(item_id);

        let points = if is_correct {
            self.rewards
                .points_for_streak(state.consecutive_correct, mastered)
        } else {
            0
        };
        let total_score = if points > 0 {
            self.ledger.add_score(points)
        } else {
            self.ledger.score()
        };

        if mastered {
            // Mastered items leave selection, so they can no longer be reviewed.
            self.wrong_book.update_wrong_count(item_id, 0);
        } else if is_correct {
            self.wrong_book.remove_wrong(item_id);
        } else {
            self.wrong_book.add_wrong(item_id);
        }

        self.session.record_answer(is_correct);
        let accuracy_rate = self.session.stats().accuracy_rate;
        let milestones = self.session.check_milestones(accuracy_rate);
        let settlement_due = self.session.should_settle();

        let outcome = AnswerOutcome {
            item_id: item_id.to_string(),
            is_correct,
            item_streak: state.consecutive_correct,
            global_streak: self.tracker.global_streak(),
            mastered,
            points,
            celebration: self
                .rewards
                .celebration(state.consecutive_correct, mastered),
            total_score,
            milestones,
            accuracy_rate,
            settlement_due,
        };

        self.observer.on_answer(&outcome);
        for threshold in &outcome.milestones {
            self.observer.on_milestone(*threshold, accuracy_rate);
        }
        Some(outcome)
    }

    /// Pay out a due settlement and restart the settlement counter.
    pub fn acknowledge_settlement(&mut self) -> Option<SettlementReward> {
        if !self.session.should_settle() {
            return None;
        }
        let accuracy_rate = self.session.stats().accuracy_rate;
        let reward = self.rewards.settlement_reward(accuracy_rate);
        let total_score = if reward.points > 0 {
            self.ledger.add_score(reward.points)
        } else {
            self.ledger.score()
        };
        self.session.reset_answer_count();

        tracing::info!(
            namespace = %self.namespace,
            accuracy_rate,
            tier = %reward.tier,
            points = reward.points,
            "settlement"
        );
        self.observer.on_settlement(&reward, total_score);
        Some(reward)
    }

    /// Pay the victory reward once every one of `total_items` is mastered.
    /// Pays at most once until the next reset.
    pub fn claim_victory(&mut self, total_items: usize) -> Option<u32> {
        if self.victory_claimed || !self.tracker.is_all_mastered(total_items) {
            return None;
        }
        let points = self.rewards.victory_reward();
        let total_score = self.ledger.add_score(points);
        self.victory_claimed = true;

        tracing::info!(namespace = %self.namespace, points, "all items mastered");
        self.observer.on_victory(points, total_score);
        Some(points)
    }

    pub fn tracker(&self) -> &ItemTracker {
        &self.tracker
    }

    pub fn session(&self) -> &SessionTracker {
        &self.session
    }

    pub fn rewards(&self) -> &RewardPolicy {
        &self.rewards
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn wrong_book(&self) -> &WrongBook {
        &self.wrong_book
    }

    /// Re-arm accuracy milestones.
    pub fn reset_milestones(&mut self) {
        self.session.reset_milestones();
    }

    /// Forget item progress and session stats. Score, milestones and the
    /// wrong book are kept.
    pub fn reset_progress(&mut self) {
        self.tracker.reset();
        self.session.reset();
        self.victory_claimed = false;
        tracing::info!(namespace = %self.namespace, "progress reset");
    }

    /// Reset everything in the namespace.
    pub fn reset_all(&mut self) {
        self.reset_progress();
        self.session.reset_milestones();
        self.ledger.reset();
        self.wrong_book.clear();
    }
}
