//! Reward calculation: streak points, settlement tiers, and the victory bonus.
//!
//! Everything here is pure. The streak banding table is a named value so the
//! five-tier and three-tier schemes (or a custom table from config) can be
//! swapped without touching the calculator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat bonus added when the answered item is mastered.
pub const MASTERY_BONUS: u32 = 50;

/// Points for completing every item in a deck.
pub const VICTORY_POINTS: u32 = 500;

// ---------------------------------------------------------------------------
// Streak bands
// ---------------------------------------------------------------------------

/// One row of a streak table: streaks of at least `min` earn `points`,
/// until the next band starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakBand {
    pub min: u32,
    pub points: u32,
}

/// Ordered streak → points table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakBands {
    bands: Vec<StreakBand>,
}

impl StreakBands {
    /// Build a table from arbitrary bands. Bands are sorted by `min`; a band
    /// starting at 0 is rejected because a zero streak is a wrong answer.
    pub fn new(mut bands: Vec<StreakBand>) -> Result<Self, String> {
        if bands.is_empty() {
            return Err("streak table needs at least one band".into());
        }
        if bands.iter().any(|b| b.min == 0) {
            return Err("streak bands must start at 1 or above".into());
        }
        bands.sort_by_key(|b| b.min);
        if bands.windows(2).any(|w| w[0].min == w[1].min) {
            return Err("streak bands must have distinct minimums".into());
        }
        Ok(Self { bands })
    }

    /// `[1,2]→1, [3,4]→3, [5,9]→5, [10,19]→10, [20,∞)→20`.
    pub fn five_tier() -> Self {
        Self {
            bands: vec![
                StreakBand { min: 1, points: 1 },
                StreakBand { min: 3, points: 3 },
                StreakBand { min: 5, points: 5 },
                StreakBand { min: 10, points: 10 },
                StreakBand { min: 20, points: 20 },
            ],
        }
    }

    /// `[1,4]→1, [5,9]→5, [10,∞)→10`.
    pub fn three_tier() -> Self {
        Self {
            bands: vec![
                StreakBand { min: 1, points: 1 },
                StreakBand { min: 5, points: 5 },
                StreakBand { min: 10, points: 10 },
            ],
        }
    }

    /// Points for a streak, ignoring any mastery bonus.
    pub fn points_for(&self, streak: u32) -> u32 {
        self.bands
            .iter()
            .rev()
            .find(|b| streak >= b.min)
            .map(|b| b.points)
            .unwrap_or(0)
    }

    pub fn bands(&self) -> &[StreakBand] {
        &self.bands
    }
}

impl Default for StreakBands {
    fn default() -> Self {
        Self::five_tier()
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Reward tier granted at a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementTier {
    Gold,
    Silver,
    Bronze,
    None,
}

impl SettlementTier {
    /// Display label for the tier.
    pub fn label(&self) -> &'static str {
        match self {
            SettlementTier::Gold => "Gold reward",
            SettlementTier::Silver => "Silver reward",
            SettlementTier::Bronze => "Bronze reward",
            SettlementTier::None => "No reward",
        }
    }
}

impl fmt::Display for SettlementTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementTier::Gold => write!(f, "gold"),
            SettlementTier::Silver => write!(f, "silver"),
            SettlementTier::Bronze => write!(f, "bronze"),
            SettlementTier::None => write!(f, "none"),
        }
    }
}

/// Accuracy floor (inclusive) for a settlement tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRule {
    pub min_accuracy: u32,
    pub tier: SettlementTier,
    pub points: u32,
}

/// The result of a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReward {
    pub tier: SettlementTier,
    pub points: u32,
    pub label: String,
}

impl SettlementReward {
    fn none() -> Self {
        Self {
            tier: SettlementTier::None,
            points: 0,
            label: SettlementTier::None.label().to_string(),
        }
    }
}

/// `>=95 gold 200`, `>=85 silver 100`, `>=70 bronze 50`.
pub fn default_settlement_rules() -> Vec<SettlementRule> {
    vec![
        SettlementRule {
            min_accuracy: 95,
            tier: SettlementTier::Gold,
            points: 200,
        },
        SettlementRule {
            min_accuracy: 85,
            tier: SettlementTier::Silver,
            points: 100,
        },
        SettlementRule {
            min_accuracy: 70,
            tier: SettlementTier::Bronze,
            points: 50,
        },
    ]
}

// ---------------------------------------------------------------------------
// Celebrations
// ---------------------------------------------------------------------------

/// What a presentation layer should celebrate after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Celebration {
    Miss,
    Correct,
    Streak3,
    Streak5,
    Streak10,
    Mastered,
}

// ---------------------------------------------------------------------------
// Reward policy
// ---------------------------------------------------------------------------

/// The full reward configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardPolicy {
    pub streak_bands: StreakBands,
    pub mastery_bonus: u32,
    /// Sorted by descending `min_accuracy`.
    settlement_rules: Vec<SettlementRule>,
    pub victory_points: u32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self::new(
            StreakBands::default(),
            MASTERY_BONUS,
            default_settlement_rules(),
            VICTORY_POINTS,
        )
    }
}

impl RewardPolicy {
    pub fn new(
        streak_bands: StreakBands,
        mastery_bonus: u32,
        mut settlement_rules: Vec<SettlementRule>,
        victory_points: u32,
    ) -> Self {
        settlement_rules.sort_by(|a, b| b.min_accuracy.cmp(&a.min_accuracy));
        Self {
            streak_bands,
            mastery_bonus,
            settlement_rules,
            victory_points,
        }
    }

    /// Points for a correct answer that brought the item streak to
    /// `consecutive_correct`.
    pub fn points_for_streak(&self, consecutive_correct: u32, is_mastered: bool) -> u32 {
        let base = self.streak_bands.points_for(consecutive_correct);
        if is_mastered {
            base.saturating_add(self.mastery_bonus)
        } else {
            base
        }
    }

    /// Reward for a settlement at the given accuracy (0–100).
    pub fn settlement_reward(&self, accuracy_rate: u32) -> SettlementReward {
        self.settlement_rules
            .iter()
            .find(|r| accuracy_rate >= r.min_accuracy)
            .map(|r| SettlementReward {
                tier: r.tier,
                points: r.points,
                label: r.tier.label().to_string(),
            })
            .unwrap_or_else(SettlementReward::none)
    }

    /// Reward for mastering every item.
    pub fn victory_reward(&self) -> u32 {
        self.victory_points
    }

    pub fn settlement_rules(&self) -> &[SettlementRule] {
        &self.settlement_rules
    }

    /// Celebration for an answer outcome.
    pub fn celebration(&self, consecutive_correct: u32, is_mastered: bool) -> Celebration {
        match (consecutive_correct, is_mastered) {
            (0, _) => Celebration::Miss,
            (_, true) => Celebration::Mastered,
            (n, _) if n >= 10 => Celebration::Streak10,
            (n, _) if n >= 5 => Celebration::Streak5,
            (n, _) if n >= 3 => Celebration::Streak3,
            _ => Celebration::Correct,
        }
    }
}
