//! Cross-jurisdiction opportunity scan, strategy filtering and ranking.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::config::EngineConfig;
use crate::data::{Access, HuntStats, OddsKey, Quality, ReferenceData};
use crate::numbers::mean_percent;
use crate::odds::resolve_odds;
use crate::query::{QueryError, check_percent};
use crate::strategy::Strategy;

/// What the applicant is looking for. Empty jurisdiction or species sets
/// produce an empty result; an empty hunt-type set means "any".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StrategyCriteria {
    pub jurisdictions: Vec<String>,
    pub species: Vec<String>,
    #[serde(default)]
    pub hunt_types: Vec<String>,
    pub min_odds: u8,
    pub points: u32,
}

impl StrategyCriteria {
    fn admits_hunt_type(&self, hunt_type: &str) -> bool {
        self.hunt_types.is_empty() || self.hunt_types.iter().any(|h| h == hunt_type)
    }

    #[must_use]
    pub fn has_targets(&self) -> bool {
        !self.jurisdictions.is_empty() && !self.species.is_empty()
    }

    /// Reject a minimum above 100 and identifiers the dataset has never heard of.
    /// Empty sets pass.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value or unknown identifier.
    pub fn check(&self, data: &ReferenceData) -> Result<(), QueryError> {
        check_percent("min_odds", u32::from(self.min_odds))?;
        if let Some(unknown) = self
            .jurisdictions
            .iter()
            .find(|id| data.jurisdiction(id).is_none())
        {
            return Err(QueryError::UnknownJurisdiction(unknown.clone()));
        }
        if let Some(unknown) = self.species.iter().find(|id| !data.knows_species(id)) {
            return Err(QueryError::UnknownSpeciesId(unknown.clone()));
        }
        if let Some(unknown) = self.hunt_types.iter().find(|id| !data.knows_hunt_type(id)) {
            return Err(QueryError::UnknownHuntType(unknown.clone()));
        }
        Ok(())
    }

    /// Whether an opportunity from any source falls inside the targets, meets
    /// the minimum odds and passes the strategy filter.
    #[must_use]
    pub fn accepts(&self, opportunity: &StrategicOpportunity, strategy: Strategy) -> bool {
        self.jurisdictions.contains(&opportunity.jurisdiction)
            && self.species.contains(&opportunity.species)
            && self.admits_hunt_type(&opportunity.hunt_type)
            && opportunity.odds >= self.min_odds
            && strategy.admits(
                opportunity.odds,
                opportunity.quality,
                opportunity.min_points,
                self.points,
            )
    }
}

/// A ranked hunt that passed both the minimum-odds cut and the strategy filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategicOpportunity {
    pub jurisdiction: String,
    pub species: String,
    pub unit: String,
    pub unit_name: String,
    pub hunt_type: String,
    pub odds: u8,
    /// `odds` plus the configured reporting headroom. Not capped at 100.
    pub max_odds: u8,
    pub min_points: u32,
    pub quality: Quality,
    pub access: Access,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicants: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_needed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl StrategicOpportunity {
    pub(crate) fn ranking(a: &Self, b: &Self) -> Ordering {
        b.odds
            .cmp(&a.odds)
            .then_with(|| a.jurisdiction.cmp(&b.jurisdiction))
            .then_with(|| a.species.cmp(&b.species))
            .then_with(|| a.unit.cmp(&b.unit))
            .then_with(|| a.hunt_type.cmp(&b.hunt_type))
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn stats_field(stats: Option<&HuntStats>, pick: impl Fn(&HuntStats) -> &str) -> Option<String> {
    stats.and_then(|s| non_empty(pick(s)))
}

/// Scan every unit and hunt type of the requested jurisdictions and species,
/// keep those meeting the minimum odds and the strategy filter, and return the
/// best `config.max_results` by odds.
#[must_use]
pub fn find_opportunities(
    data: &ReferenceData,
    criteria: &StrategyCriteria,
    strategy: Strategy,
    config: &EngineConfig,
) -> Vec<StrategicOpportunity> {
    let jurisdictions: BTreeSet<&str> = criteria.jurisdictions.iter().map(String::as_str).collect();
    let species: BTreeSet<&str> = criteria.species.iter().map(String::as_str).collect();

    let mut scanned = 0_usize;
    let mut resolved = 0_usize;
    let mut above_min = 0_usize;
    let mut found = Vec::new();

    for &jurisdiction in &jurisdictions {
        for &sp in &species {
            for (unit, info) in data.units(jurisdiction, sp) {
                for hunt_type in data.hunt_types(jurisdiction, sp) {
                    if !criteria.admits_hunt_type(hunt_type) {
                        continue;
                    }
                    scanned += 1;
                    let key = OddsKey::new(
                        jurisdiction,
                        sp,
                        unit,
                        hunt_type,
                        config.strategy_residency,
                    );
                    let Some(odds) = resolve_odds(data, &key, criteria.points) else {
                        continue;
                    };
                    resolved += 1;
                    if odds < criteria.min_odds {
                        continue;
                    }
                    above_min += 1;

                    let stats = data.hunt_stats(&key.stats_key());
                    let min_points = stats
                        .and_then(HuntStats::points_needed_floor)
                        .unwrap_or(criteria.points);
                    if !strategy.admits(odds, info.quality, min_points, criteria.points) {
                        continue;
                    }

                    found.push(StrategicOpportunity {
                        jurisdiction: jurisdiction.to_string(),
                        species: sp.to_string(),
                        unit: unit.to_string(),
                        unit_name: info.name.clone(),
                        hunt_type: hunt_type.clone(),
                        odds,
                        max_odds: odds.saturating_add(config.max_odds_headroom),
                        min_points,
                        quality: info.quality,
                        access: info.access,
                        tags: stats.map(|s| s.tags),
                        applicants: stats.map(|s| s.applicants),
                        points_needed: stats_field(stats, |s| s.points_needed.as_str()),
                        trend: stats_field(stats, |s| s.trend.as_str()),
                        success: stats_field(stats, |s| s.success.as_str()),
                        avg_size: stats_field(stats, |s| s.avg_size.as_str()),
                        difficulty: stats_field(stats, |s| s.difficulty.as_str()),
                    });
                }
            }
        }
    }

    log::debug!(
        "{strategy} scan: {scanned} combinations, {resolved} with odds, {above_min} >= {}%, {} kept",
        criteria.min_odds,
        found.len()
    );

    found.sort_by(StrategicOpportunity::ranking);
    found.truncate(config.max_results);
    found
}

/// Headline numbers shown under a ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySummary {
    pub strategy: Strategy,
    pub count: usize,
    pub average_odds: f64,
    pub tip: String,
}

#[must_use]
pub fn summarize(opportunities: &[StrategicOpportunity], strategy: Strategy) -> OpportunitySummary {
    let odds: Vec<u8> = opportunities.iter().map(|o| o.odds).collect();
    let average_odds = mean_percent(&odds);
    OpportunitySummary {
        strategy,
        count: opportunities.len(),
        average_odds,
        tip: strategy.tip(average_odds).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(
        jurisdictions: &[&str],
        species: &[&str],
        min_odds: u8,
        points: u32,
    ) -> StrategyCriteria {
        StrategyCriteria {
            jurisdictions: jurisdictions.iter().map(ToString::to_string).collect(),
            species: species.iter().map(ToString::to_string).collect(),
            hunt_types: Vec::new(),
            min_odds,
            points,
        }
    }

    fn bundled() -> ReferenceData {
        ReferenceData::load_from_static().unwrap()
    }

    #[test]
    fn conservative_antelope_keeps_only_high_odds() {
        let data = bundled();
        let found = find_opportunities(
            &data,
            &criteria(&["wyoming"], &["antelope"], 80, 0),
            Strategy::Conservative,
            &EngineConfig::default(),
        );
        assert_eq!(found.len(), 1);
        let top = &found[0];
        assert_eq!(top.unit, "area19");
        assert_eq!(top.hunt_type, "rifle");
        assert_eq!(top.odds, 85);
        assert_eq!(top.max_odds, 95);
        assert_eq!(top.min_points, 0);
        assert_eq!(top.quality, Quality::Good);
        assert_eq!(top.points_needed.as_deref(), Some("0-1"));
    }

    #[test]
    fn empty_sets_yield_empty_results() {
        let data = bundled();
        let cfg = EngineConfig::default();
        for wanted in [
            criteria(&[], &["elk"], 0, 5),
            criteria(&["utah"], &[], 0, 5),
            criteria(&["idaho"], &["goat"], 0, 5),
        ] {
            assert!(find_opportunities(&data, &wanted, Strategy::Balanced, &cfg).is_empty());
        }
    }

    #[test]
    fn results_are_sorted_and_capped() {
        let data = bundled();
        let cfg = EngineConfig {
            max_results: 3,
            ..EngineConfig::default()
        };
        let found = find_opportunities(
            &data,
            &criteria(&["utah", "colorado", "wyoming"], &["elk", "deer"], 0, 10),
            Strategy::Balanced,
            &cfg,
        );
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].odds >= w[1].odds));
        assert!(found.iter().all(|o| o.odds >= 30));
    }

    #[test]
    fn ties_break_on_identifiers() {
        let data = bundled();
        let found = find_opportunities(
            &data,
            &criteria(&["utah"], &["elk"], 0, 10),
            Strategy::Balanced,
            &EngineConfig::default(),
        );
        for pair in found.windows(2) {
            assert_ne!(StrategicOpportunity::ranking(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn hunt_type_filter_restricts_scan() {
        let data = bundled();
        let mut wanted = criteria(&["utah"], &["elk"], 0, 5);
        wanted.hunt_types = vec!["archery".to_string()];
        let found =
            find_opportunities(&data, &wanted, Strategy::Balanced, &EngineConfig::default());
        assert!(!found.is_empty());
        assert!(found.iter().all(|o| o.hunt_type == "archery"));
    }

    #[test]
    fn points_builder_uses_typical_floor() {
        let data = bundled();
        let found = find_opportunities(
            &data,
            &criteria(&["utah"], &["elk"], 0, 2),
            Strategy::PointsBuilder,
            &EngineConfig::default(),
        );
        assert!(!found.is_empty());
        assert!(found.iter().all(|o| o.min_points <= 3));
        assert!(found.iter().all(|o| o.unit == "manti"));
    }

    #[test]
    fn min_odds_of_one_hundred_is_empty_not_error() {
        let data = bundled();
        let found = find_opportunities(
            &data,
            &criteria(&["utah"], &["elk"], 100, 10),
            Strategy::Balanced,
            &EngineConfig::default(),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn summary_carries_average_and_tip() {
        let data = bundled();
        let found = find_opportunities(
            &data,
            &criteria(&["wyoming"], &["antelope"], 0, 0),
            Strategy::Balanced,
            &EngineConfig::default(),
        );
        let summary = summarize(&found, Strategy::Balanced);
        assert_eq!(summary.count, 2);
        assert!((summary.average_odds - 75.0).abs() < f64::EPSILON);
        assert!(summary.tip.starts_with("Excellent mix"));

        let empty = summarize(&[], Strategy::Balanced);
        assert_eq!(empty.count, 0);
        assert!(empty.tip.starts_with("Consider including"));
    }
}
