//! Rule-based advisory messages for a resolved odds value.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::config::EngineConfig;
use crate::constants::{
    ALTERNATIVE_TRIGGER_HUNT_TYPE, FALLBACK_POINTS_NEEDED_FLOOR, MAX_ALTERNATIVE_UNITS,
    POINTS_AHEAD_MARGIN, POINTS_BEHIND_MARGIN,
};
use crate::data::{HuntStats, ReferenceData};
use crate::odds::{hunt_type_display_name, resolve_odds};
use crate::query::OddsQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Danger,
    Info,
}

impl Severity {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub title: String,
    pub text: String,
}

impl Recommendation {
    fn new(severity: Severity, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Ordered advice: primary odds tier first, then point advice, then alternatives.
pub type Recommendations = SmallVec<[Recommendation; 4]>;

/// Primary tier message plus point-level advice.
#[must_use]
pub fn generate_recommendations(
    odds: u8,
    points: u32,
    stats: Option<&HuntStats>,
    config: &EngineConfig,
) -> Recommendations {
    let mut recs = Recommendations::new();
    recs.push(primary_assessment(odds, config));
    if let Some(advice) = stats.and_then(|stats| point_advice(points, stats)) {
        recs.push(advice);
    }
    recs
}

/// Query and dataset needed to look for better alternatives.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationContext<'a> {
    pub data: &'a ReferenceData,
    pub query: &'a OddsQuery,
}

/// Full recommendation list including best-effort alternatives.
#[must_use]
pub fn generate_with_context(
    odds: u8,
    stats: Option<&HuntStats>,
    ctx: RecommendationContext<'_>,
    config: &EngineConfig,
) -> Recommendations {
    let mut recs = generate_recommendations(odds, ctx.query.points, stats, config);
    recs.extend(alternative_recommendations(odds, ctx, config));
    recs
}

fn primary_assessment(odds: u8, config: &EngineConfig) -> Recommendation {
    let tiers = config.tiers;
    if odds >= tiers.excellent {
        Recommendation::new(
            Severity::Success,
            "Excellent Draw Odds",
            "You have very high chances of drawing this tag. This is a great application choice!",
        )
    } else if odds >= tiers.good {
        Recommendation::new(
            config.good_tier_severity,
            "Good Draw Odds",
            "You have decent chances of drawing. Consider this as part of a balanced strategy.",
        )
    } else if odds >= tiers.moderate {
        Recommendation::new(
            Severity::Warning,
            "Moderate Draw Odds",
            "This is a competitive hunt. Consider building more points or look for backup options.",
        )
    } else {
        Recommendation::new(
            Severity::Danger,
            "Low Draw Odds",
            "This is a very competitive hunt. Consider this only if you're playing the long game.",
        )
    }
}

fn point_advice(points: u32, stats: &HuntStats) -> Option<Recommendation> {
    let typical = stats
        .points_needed_floor()
        .unwrap_or(FALLBACK_POINTS_NEEDED_FLOOR);
    if points.saturating_add(POINTS_BEHIND_MARGIN) < typical {
        Some(Recommendation::new(
            Severity::Warning,
            "Build More Points",
            format!(
                "Consider building points for 2-3 more years. Typical successful applicants have {} points.",
                stats.points_needed
            ),
        ))
    } else if points >= typical.saturating_add(POINTS_AHEAD_MARGIN) {
        Some(Recommendation::new(
            Severity::Success,
            "Great Point Level",
            "You have more points than typical successful applicants. Great time to apply!",
        ))
    } else {
        None
    }
}

/// Other hunt types in the same unit and sibling units with better odds
/// than `current_odds`.
///
/// Missing data simply produces fewer suggestions.
#[must_use]
pub fn alternative_recommendations(
    current_odds: u8,
    ctx: RecommendationContext<'_>,
    config: &EngineConfig,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    let query = ctx.query;

    let alternative = config.alternative_hunt_type.as_str();
    if query.hunt_type == ALTERNATIVE_TRIGGER_HUNT_TYPE
        && alternative != query.hunt_type
        && ctx
            .data
            .species(&query.jurisdiction, &query.species)
            .is_some_and(|profile| profile.offers_hunt_type(alternative))
        && let Some(odds) = resolve_odds(
            ctx.data,
            &query.with_hunt_type(alternative).odds_key(),
            query.points,
        )
        && odds > config.alternative_min_odds
    {
        let name = hunt_type_display_name(alternative);
        recs.push(Recommendation::new(
            Severity::Info,
            format!("Consider {name} Season"),
            format!(
                "{name} season for this unit has {odds}% draw odds, which may offer better chances."
            ),
        ));
    }

    let mut siblings: Vec<(u8, &str, &str, &str)> = ctx
        .data
        .units(&query.jurisdiction, &query.species)
        .filter(|(unit, _)| *unit != query.unit)
        .filter_map(|(unit, info)| {
            let odds = resolve_odds(ctx.data, &query.with_unit(unit).odds_key(), query.points)?;
            (odds > config.alternative_unit_min_odds && odds > current_odds).then_some((
                odds,
                unit,
                info.name.as_str(),
                info.quality.label(),
            ))
        })
        .collect();
    siblings.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    for (odds, _, name, quality) in siblings.into_iter().take(MAX_ALTERNATIVE_UNITS) {
        recs.push(Recommendation::new(
            Severity::Info,
            format!("Consider {name} Unit"),
            format!("The {name} unit has {odds}% draw odds ({quality} quality)."),
        ));
    }

    recs
}
