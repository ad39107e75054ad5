//! Engine tuning loaded from JSON, with every field defaulted.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_ALTERNATIVE_HUNT_TYPE, DEFAULT_ALTERNATIVE_MIN_ODDS, DEFAULT_ALTERNATIVE_UNIT_MIN_ODDS,
    DEFAULT_MAX_ODDS_HEADROOM, DEFAULT_MAX_RESULTS, DEFAULT_TIER_EXCELLENT, DEFAULT_TIER_GOOD,
    DEFAULT_TIER_MODERATE, PERCENT_MAX,
};
use crate::query::Residency;
use crate::recommend::Severity;

/// Errors raised when engine configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be between 0 and 100 (got {value})")]
    PercentRange { field: &'static str, value: u8 },
    #[error("max_results must be at least 1")]
    EmptyResultCap,
    #[error(
        "odds tiers must be strictly descending: excellent {excellent}, good {good}, moderate {moderate}"
    )]
    TierOrder { excellent: u8, good: u8, moderate: u8 },
    #[error("alternative_hunt_type must not be empty")]
    EmptyAlternativeHuntType,
    #[error("engine config is not valid JSON: {0}")]
    Parse(String),
}

/// Which [`crate::OddsAnalyzer`] implementation serves queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Engine,
    External,
}

/// Lower bounds of the primary recommendation tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "TierThresholds::default_excellent")]
    pub excellent: u8,
    #[serde(default = "TierThresholds::default_good")]
    pub good: u8,
    #[serde(default = "TierThresholds::default_moderate")]
    pub moderate: u8,
}

impl TierThresholds {
    const fn default_excellent() -> u8 {
        DEFAULT_TIER_EXCELLENT
    }

    const fn default_good() -> u8 {
        DEFAULT_TIER_GOOD
    }

    const fn default_moderate() -> u8 {
        DEFAULT_TIER_MODERATE
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: Self::default_excellent(),
            good: Self::default_good(),
            moderate: Self::default_moderate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Added to resolved odds to produce `max_odds` on ranked opportunities.
    #[serde(default = "EngineConfig::default_max_odds_headroom")]
    pub max_odds_headroom: u8,
    /// Upper bound on the number of ranked opportunities returned.
    #[serde(default = "EngineConfig::default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub strategy_residency: Residency,
    #[serde(default)]
    pub tiers: TierThresholds,
    /// Severity of the "good odds" tier. Historically `warning`.
    #[serde(default = "EngineConfig::default_good_tier_severity")]
    pub good_tier_severity: Severity,
    #[serde(default = "EngineConfig::default_alternative_hunt_type")]
    pub alternative_hunt_type: String,
    #[serde(default = "EngineConfig::default_alternative_min_odds")]
    pub alternative_min_odds: u8,
    #[serde(default = "EngineConfig::default_alternative_unit_min_odds")]
    pub alternative_unit_min_odds: u8,
    #[serde(default)]
    pub analysis: AnalysisMode,
}

impl EngineConfig {
    const fn default_max_odds_headroom() -> u8 {
        DEFAULT_MAX_ODDS_HEADROOM
    }

    const fn default_max_results() -> usize {
        DEFAULT_MAX_RESULTS
    }

    const fn default_good_tier_severity() -> Severity {
        Severity::Warning
    }

    fn default_alternative_hunt_type() -> String {
        DEFAULT_ALTERNATIVE_HUNT_TYPE.to_string()
    }

    const fn default_alternative_min_odds() -> u8 {
        DEFAULT_ALTERNATIVE_MIN_ODDS
    }

    const fn default_alternative_unit_min_odds() -> u8 {
        DEFAULT_ALTERNATIVE_UNIT_MIN_ODDS
    }

    /// Parse and validate a config document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value violates an invariant.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_odds_headroom", self.max_odds_headroom),
            ("alternative_min_odds", self.alternative_min_odds),
            ("alternative_unit_min_odds", self.alternative_unit_min_odds),
            ("tiers.excellent", self.tiers.excellent),
        ] {
            if value > PERCENT_MAX {
                return Err(ConfigError::PercentRange { field, value });
            }
        }
        if self.max_results == 0 {
            return Err(ConfigError::EmptyResultCap);
        }
        let TierThresholds {
            excellent,
            good,
            moderate,
        } = self.tiers;
        if !(excellent > good && good > moderate) {
            return Err(ConfigError::TierOrder {
                excellent,
                good,
                moderate,
            });
        }
        if self.alternative_hunt_type.trim().is_empty() {
            return Err(ConfigError::EmptyAlternativeHuntType);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_odds_headroom: Self::default_max_odds_headroom(),
            max_results: Self::default_max_results(),
            strategy_residency: Residency::Resident,
            tiers: TierThresholds::default(),
            good_tier_severity: Self::default_good_tier_severity(),
            alternative_hunt_type: Self::default_alternative_hunt_type(),
            alternative_min_odds: Self::default_alternative_min_odds(),
            alternative_unit_min_odds: Self::default_alternative_unit_min_odds(),
            analysis: AnalysisMode::Engine,
        }
    }
}
