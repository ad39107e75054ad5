//! Application strategies: selection, secondary filter policy, profiles and tips.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    AGGRESSIVE_MAX_ODDS, BALANCED_MIN_ODDS, CONSERVATIVE_MIN_ODDS, POINTS_BUILDER_SLACK,
    TIP_BALANCED_EXCELLENT_AVG, TIP_BALANCED_GOOD_AVG,
};
use crate::data::Quality;
use crate::query::QueryError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
    PointsBuilder,
}

impl Strategy {
    pub const ALL: [Self; 4] = [
        Self::Conservative,
        Self::Balanced,
        Self::Aggressive,
        Self::PointsBuilder,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::PointsBuilder => "points-builder",
        }
    }

    /// Secondary filter applied after the minimum-odds cut.
    #[must_use]
    pub fn admits(
        self,
        odds: u8,
        quality: Quality,
        min_points: u32,
        applicant_points: u32,
    ) -> bool {
        match self {
            Self::Conservative => odds >= CONSERVATIVE_MIN_ODDS,
            Self::Aggressive => quality == Quality::Premium || odds <= AGGRESSIVE_MAX_ODDS,
            Self::PointsBuilder => {
                min_points <= applicant_points.saturating_add(POINTS_BUILDER_SLACK)
            }
            Self::Balanced => odds >= BALANCED_MIN_ODDS,
        }
    }

    #[must_use]
    pub fn profile(self) -> StrategyProfile {
        match self {
            Self::Conservative => StrategyProfile {
                strategy: self,
                name: "Conservative Point Builder",
                description: "Focus on building points with occasional high-odds applications",
                risk: RiskLevel::Low,
                recommended_points: "5-10",
                target_odds: "70%+",
                preferred_quality: &[Quality::Good, Quality::High],
            },
            Self::Balanced => StrategyProfile {
                strategy: self,
                name: "Balanced Hunter",
                description: "Mix of point building and hunting opportunities",
                risk: RiskLevel::Medium,
                recommended_points: "3-7",
                target_odds: "40%+",
                preferred_quality: &[Quality::Good, Quality::High, Quality::Premium],
            },
            Self::Aggressive => StrategyProfile {
                strategy: self,
                name: "Aggressive Hunter",
                description: "Apply for premium units with lower odds",
                risk: RiskLevel::High,
                recommended_points: "8-15",
                target_odds: "15%+",
                preferred_quality: &[Quality::Premium, Quality::Excellent],
            },
            Self::PointsBuilder => StrategyProfile {
                strategy: self,
                name: "Opportunistic Hunter",
                description: "Focus on highest odds available",
                risk: RiskLevel::Low,
                recommended_points: "0-3",
                target_odds: "60%+",
                preferred_quality: &[Quality::Good],
            },
        }
    }

    /// One-line advice for a result set with the given average odds.
    #[must_use]
    pub fn tip(self, average_odds: f64) -> &'static str {
        match self {
            Self::Conservative => {
                "Focus on the highest odds opportunities to maximize your chances of hunting this year."
            }
            Self::Aggressive => {
                "These premium hunts require patience, but offer world-class hunting experiences."
            }
            Self::PointsBuilder => {
                "Build points strategically while applying for some huntable opportunities."
            }
            Self::Balanced if average_odds >= TIP_BALANCED_EXCELLENT_AVG => {
                "Excellent mix of opportunities! Consider applying for multiple hunts."
            }
            Self::Balanced if average_odds >= TIP_BALANCED_GOOD_AVG => {
                "Good balance of risk and reward. Mix high and moderate odds applications."
            }
            Self::Balanced => {
                "Consider including some higher odds backup options in your strategy."
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Strategy {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key() == wanted || strategy.key().replace('-', "_") == wanted)
            .ok_or(QueryError::UnknownStrategy(wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Descriptive card for a strategy, shown next to its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyProfile {
    pub strategy: Strategy,
    pub name: &'static str,
    pub description: &'static str,
    pub risk: RiskLevel,
    pub recommended_points: &'static str,
    pub target_odds: &'static str,
    pub preferred_quality: &'static [Quality],
}
