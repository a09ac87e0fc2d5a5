//! Drill configuration and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::reward::{
    default_settlement_rules, RewardPolicy, SettlementRule, StreakBand, StreakBands,
    MASTERY_BONUS, VICTORY_POINTS,
};
use crate::stats::{SessionPolicy, DEFAULT_MILESTONES, SETTLEMENT_INTERVAL};
use crate::tracker::{
    WeightPolicy, DEFAULT_WEIGHT, MASTERY_THRESHOLD, MIN_WEIGHT, WEIGHT_DECREMENT,
};

/// Whether the session counters (global streak, settlement answer count)
/// survive a reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterPersistence {
    /// Counters live only as long as the engine instance.
    #[default]
    Session,
    /// Counters are written to the store next to the state they belong to.
    Persisted,
}

/// Named streak tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BandPreset {
    FiveTier,
    ThreeTier,
}

/// Streak table selection: a preset name or an explicit list of bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreakBandsConfig {
    Preset(BandPreset),
    Custom(Vec<StreakBand>),
}

impl Default for StreakBandsConfig {
    fn default() -> Self {
        StreakBandsConfig::Preset(BandPreset::FiveTier)
    }
}

impl StreakBandsConfig {
    pub fn build(&self) -> Result<StreakBands> {
        match self {
            StreakBandsConfig::Preset(BandPreset::FiveTier) => Ok(StreakBands::five_tier()),
            StreakBandsConfig::Preset(BandPreset::ThreeTier) => Ok(StreakBands::three_tier()),
            StreakBandsConfig::Custom(bands) => {
                StreakBands::new(bands.clone()).map_err(|e| anyhow::anyhow!("{e}"))
            }
        }
    }
}

/// Numeric policy for selection, mastery, settlement, and rewards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_weight")]
    pub default_weight: u32,
    #[serde(default = "min_weight")]
    pub min_weight: u32,
    #[serde(default = "weight_decrement")]
    pub weight_decrement: u32,
    #[serde(default = "mastery_threshold")]
    pub mastery_threshold: u32,
    #[serde(default = "settlement_interval")]
    pub settlement_interval: u32,
    #[serde(default = "default_milestones")]
    pub milestones: Vec<u32>,
    #[serde(default = "mastery_bonus")]
    pub mastery_bonus: u32,
    #[serde(default = "victory_points")]
    pub victory_points: u32,
    #[serde(default)]
    pub streak_bands: StreakBandsConfig,
    #[serde(default = "default_settlement_rules")]
    pub settlement_tiers: Vec<SettlementRule>,
}

fn default_weight() -> u32 {
    DEFAULT_WEIGHT
}
fn min_weight() -> u32 {
    MIN_WEIGHT
}
fn weight_decrement() -> u32 {
    WEIGHT_DECREMENT
}
fn mastery_threshold() -> u32 {
    MASTERY_THRESHOLD
}
fn settlement_interval() -> u32 {
    SETTLEMENT_INTERVAL
}
fn default_milestones() -> Vec<u32> {
    DEFAULT_MILESTONES.to_vec()
}
fn mastery_bonus() -> u32 {
    MASTERY_BONUS
}
fn victory_points() -> u32 {
    VICTORY_POINTS
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_weight: default_weight(),
            min_weight: min_weight(),
            weight_decrement: weight_decrement(),
            mastery_threshold: mastery_threshold(),
            settlement_interval: settlement_interval(),
            milestones: default_milestones(),
            mastery_bonus: mastery_bonus(),
            victory_points: victory_points(),
            streak_bands: StreakBandsConfig::default(),
            settlement_tiers: default_settlement_rules(),
        }
    }
}

impl PolicyConfig {
    /// Check the policy for values the algorithms cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.min_weight >= 1, "min_weight must be at least 1");
        anyhow::ensure!(
            self.default_weight >= self.min_weight,
            "default_weight must be >= min_weight"
        );
        anyhow::ensure!(
            self.mastery_threshold >= 1,
            "mastery_threshold must be at least 1"
        );
        anyhow::ensure!(
            self.settlement_interval >= 1,
            "settlement_interval must be at least 1"
        );
        anyhow::ensure!(
            self.milestones.iter().all(|m| *m <= 100),
            "milestones must be accuracy percentages (0-100)"
        );
        self.streak_bands.build()?;
        Ok(())
    }

    pub fn weight_policy(&self) -> WeightPolicy {
        WeightPolicy {
            default_weight: self.default_weight,
            min_weight: self.min_weight,
            weight_decrement: self.weight_decrement,
            mastery_threshold: self.mastery_threshold,
        }
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            settlement_interval: self.settlement_interval,
            milestones: self.milestones.clone(),
        }
    }

    pub fn reward_policy(&self) -> Result<RewardPolicy> {
        Ok(RewardPolicy::new(
            self.streak_bands.build()?,
            self.mastery_bonus,
            self.settlement_tiers.clone(),
            self.victory_points,
        ))
    }
}

/// Top-level quizdrill configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillConfig {
    /// Directory holding persisted drill state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Fixed seed for question selection. Unset means a fresh seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Whether streak/answer counters survive a reload.
    #[serde(default)]
    pub counter_persistence: CounterPersistence,
    /// Selection and reward policy.
    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./quizdrill-data")
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            seed: None,
            counter_persistence: CounterPersistence::default(),
            policy: PolicyConfig::default(),
        }
    }
}

/// Parse a config from TOML text.
pub fn parse_config_str(content: &str) -> Result<DrillConfig> {
    let config: DrillConfig = toml::from_str(content).context("failed to parse config TOML")?;
    config.policy.validate()?;
    Ok(config)
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizdrill.toml` in the current directory
/// 2. `~/.config/quizdrill/config.toml`
///
/// Environment variable overrides: `QUIZDRILL_DATA_DIR`, `QUIZDRILL_SEED`.
pub fn load_config() -> Result<DrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<DrillConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizdrill.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            global.exists().then_some(global)
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(p) => {
            tracing::debug!("loading config from {}", p.display());
            let content = std::fs::read_to_string(&p)
                .with_context(|| format!("failed to read config: {}", p.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("invalid config: {}", p.display()))?
        }
        None => DrillConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Apply `QUIZDRILL_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut DrillConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup("QUIZDRILL_DATA_DIR").filter(|d| !d.is_empty()) {
        config.data_dir = PathBuf::from(dir);
    }
    if let Some(seed) = lookup("QUIZDRILL_SEED").filter(|s| !s.is_empty()) {
        let seed = seed
            .parse::<u64>()
            .with_context(|| format!("QUIZDRILL_SEED is not an integer: {seed}"))?;
        config.seed = Some(seed);
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizdrill"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::SettlementTier;

    #[test]
    fn default_config() {
        let config = DrillConfig::default();
        assert_eq!(config.policy.default_weight, 10);
        assert_eq!(config.policy.min_weight, 1);
        assert_eq!(config.policy.mastery_threshold, 3);
        assert_eq!(config.policy.settlement_interval, 20);
        assert_eq!(config.counter_persistence, CounterPersistence::Session);
        assert!(config.seed.is_none());
        config.policy.validate().unwrap();
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config, DrillConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
data_dir = "/tmp/drill"
seed = 42
counter_persistence = "persisted"

[policy]
mastery_threshold = 4
settlement_interval = 10
milestones = [75, 90]
streak_bands = "three-tier"

[[policy.settlement_tiers]]
min_accuracy = 90
tier = "gold"
points = 300
"#;
        let config = parse_config_str(toml_str).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/drill"));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.counter_persistence, CounterPersistence::Persisted);
        assert_eq!(config.policy.mastery_threshold, 4);
        assert_eq!(config.policy.milestones, vec![75, 90]);
        assert_eq!(
            config.policy.streak_bands,
            StreakBandsConfig::Preset(BandPreset::ThreeTier)
        );

        let rewards = config.policy.reward_policy().unwrap();
        assert_eq!(rewards.points_for_streak(4, false), 1);
        assert_eq!(rewards.settlement_reward(92).tier, SettlementTier::Gold);
        assert_eq!(rewards.settlement_reward(92).points, 300);
        assert_eq!(rewards.settlement_reward(80).tier, SettlementTier::None);
    }

    #[test]
    fn parse_custom_bands() {
        let toml_str = r#"
[policy]
streak_bands = [{ min = 1, points = 2 }, { min = 6, points = 12 }]
"#;
        let config = parse_config_str(toml_str).unwrap();
        let rewards = config.policy.reward_policy().unwrap();
        assert_eq!(rewards.points_for_streak(5, false), 2);
        assert_eq!(rewards.points_for_streak(6, false), 12);
    }

    #[test]
    fn invalid_policy_rejected() {
        assert!(parse_config_str("[policy]\nmin_weight = 0\n").is_err());
        assert!(parse_config_str("[policy]\ndefault_weight = 1\nmin_weight = 2\n").is_err());
        assert!(parse_config_str("[policy]\nsettlement_interval = 0\n").is_err());
        assert!(parse_config_str("[policy]\nstreak_bands = [{ min = 0, points = 1 }]\n").is_err());
    }

    #[test]
    fn env_overrides() {
        let mut config = DrillConfig::default();
        apply_env_overrides(&mut config, |name| match name {
            "QUIZDRILL_DATA_DIR" => Some("/var/drill".into()),
            "QUIZDRILL_SEED" => Some("7".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/drill"));
        assert_eq!(config.seed, Some(7));

        let bad = apply_env_overrides(&mut config, |name| {
            (name == "QUIZDRILL_SEED").then(|| "seven".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn load_from_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizdrill.toml");
        std::fs::write(&path, "seed = 3\n[policy]\nmastery_bonus = 25\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.policy.mastery_bonus, 25);
    }
}
