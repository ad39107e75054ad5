//! Odds resolution: exact lookup with linear interpolation between known point levels.
use num_traits::cast::cast;
use serde::{Deserialize, Serialize};

use crate::constants::{CHART_POINT_LEVELS, PERCENT_MAX};
use crate::data::{OddsKey, OddsTable, ReferenceData};
use crate::numbers::{points_to_f64, round_f64_to_percent};

impl OddsTable {
    /// Odds at a (possibly fractional) point count.
    ///
    /// An exact entry wins. Otherwise the nearest known levels on either side
    /// are interpolated linearly. With no known level on one side the result
    /// is `None`, as is any negative or non-finite input.
    #[must_use]
    pub fn odds_at(&self, points: f64) -> Option<u8> {
        if !points.is_finite() || points < 0.0 {
            return None;
        }
        let floor = cast::<f64, u32>(points.floor())?;
        let ceil = cast::<f64, u32>(points.ceil())?;

        if floor == ceil
            && let Some(odds) = self.exact(floor)
        {
            return Some(odds.min(PERCENT_MAX));
        }

        let (lo_points, lo_odds) = self.floor_level(floor)?;
        let (hi_points, hi_odds) = self.ceil_level(ceil)?;
        if lo_points == hi_points {
            return Some(lo_odds.min(PERCENT_MAX));
        }

        let lo = f64::from(lo_odds);
        let hi = f64::from(hi_odds);
        let span = points_to_f64(hi_points) - points_to_f64(lo_points);
        let ratio = (points - points_to_f64(lo_points)) / span;
        let odds = round_f64_to_percent(lo + (hi - lo) * ratio);
        log::trace!(
            "interpolated {points} points between {lo_points}:{lo_odds} and {hi_points}:{hi_odds} -> {odds}"
        );
        Some(odds)
    }
}

/// Resolve odds for a fully keyed hunt at an integer point count.
///
/// `None` means the dataset has no history for this combination; callers
/// present that as "no historical data" rather than as a failure.
#[must_use]
pub fn resolve_odds(data: &ReferenceData, key: &OddsKey, points: u32) -> Option<u8> {
    resolve_odds_at(data, key, points_to_f64(points))
}

#[must_use]
pub fn resolve_odds_at(data: &ReferenceData, key: &OddsKey, points: f64) -> Option<u8> {
    data.odds_table(key)?.odds_at(points)
}

/// One bar of the odds-by-points chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub points: u32,
    pub odds: u8,
}

/// Odds at the standard chart point levels, skipping levels without data.
#[must_use]
pub fn odds_by_point_level(data: &ReferenceData, key: &OddsKey) -> Vec<ChartPoint> {
    let last = CHART_POINT_LEVELS[CHART_POINT_LEVELS.len() - 1];
    CHART_POINT_LEVELS
        .iter()
        .filter_map(|&points| {
            let odds = resolve_odds(data, key, points).filter(|&odds| odds > 0)?;
            let label = if points == last {
                format!("{points}+")
            } else {
                format!("{points}-{}", points + 1)
            };
            Some(ChartPoint {
                label,
                points,
                odds,
            })
        })
        .collect()
}

/// Chance of drawing at least one of several independent applications.
#[must_use]
pub fn combined_odds(odds: &[u8]) -> u8 {
    let miss_all = odds.iter().fold(1.0_f64, |acc, &p| {
        acc * (1.0 - f64::from(p.min(PERCENT_MAX)) / 100.0)
    });
    round_f64_to_percent((1.0 - miss_all) * 100.0)
}

/// Human-readable label for a hunt type id; unknown ids pass through unchanged.
#[must_use]
pub fn hunt_type_display_name(hunt_type: &str) -> &str {
    match hunt_type {
        "archery" => "Archery",
        "muzzleloader" => "Muzzleloader",
        "rifle" => "Any Weapon/Rifle",
        "rifle-1" => "Rifle Season 1",
        "rifle-2" => "Rifle Season 2",
        "rifle-3" => "Rifle Season 3",
        "rifle-early" => "Early Rifle",
        "rifle-late" => "Late Rifle",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Residency;

    fn cache_archery() -> OddsKey {
        OddsKey::new("utah", "elk", "cache", "archery", Residency::Resident)
    }

    fn sparse_data() -> ReferenceData {
        ReferenceData::from_json(
            r#"{
                "jurisdictions": { "utah": { "name": "Utah", "species": { "elk": {
                    "units": { "cache": { "name": "Cache", "quality": "High", "access": "Good" } },
                    "hunt_types": ["archery"]
                } } } },
                "odds": { "utah": { "elk": { "cache": { "archery": {
                    "resident": { "0": 20, "5": 67, "10": 95 }
                } } } } }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn exact_levels_are_returned_verbatim() {
        let data = sparse_data();
        assert_eq!(resolve_odds(&data, &cache_archery(), 0), Some(20));
        assert_eq!(resolve_odds(&data, &cache_archery(), 5), Some(67));
        assert_eq!(resolve_odds(&data, &cache_archery(), 10), Some(95));
    }

    #[test]
    fn gaps_interpolate_between_neighbors() {
        let data = sparse_data();
        assert_eq!(resolve_odds(&data, &cache_archery(), 7), Some(78));
        assert_eq!(resolve_odds(&data, &cache_archery(), 1), Some(29));
        let table = OddsTable::from_levels([(3, 45), (5, 65)]);
        assert_eq!(table.odds_at(4.0), Some(55));
        assert_eq!(table.odds_at(3.5), Some(50));
    }

    #[test]
    fn outside_known_range_is_not_found() {
        let data = sparse_data();
        assert_eq!(resolve_odds(&data, &cache_archery(), 11), None);
        let table = OddsTable::from_levels([(3, 45), (5, 65)]);
        assert_eq!(table.odds_at(2.0), None);
        assert_eq!(table.odds_at(-1.0), None);
        assert_eq!(table.odds_at(f64::NAN), None);
    }

    #[test]
    fn missing_table_is_not_found() {
        let data = sparse_data();
        let rifle = OddsKey::new("utah", "elk", "cache", "rifle", Residency::Resident);
        assert_eq!(resolve_odds(&data, &rifle, 3), None);
        let nonres = OddsKey::new("utah", "elk", "cache", "archery", Residency::Nonresident);
        assert_eq!(resolve_odds(&data, &nonres, 3), None);
    }

    #[test]
    fn zero_points_resolves_against_zero_level() {
        let table = OddsTable::from_levels([(0, 0), (1, 10)]);
        assert_eq!(table.odds_at(0.0), Some(0));
    }

    #[test]
    fn oversized_entries_are_clamped() {
        let table = OddsTable::from_levels([(0, 120), (2, 140)]);
        assert_eq!(table.odds_at(0.0), Some(100));
        assert_eq!(table.odds_at(1.0), Some(100));
    }

    #[test]
    fn chart_uses_standard_levels_and_labels() {
        let data = sparse_data();
        let chart = odds_by_point_level(&data, &cache_archery());
        let labels: Vec<_> = chart.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["0-1", "2-3", "4-5", "6-7", "8-9", "10+"]);
        assert_eq!(chart[0].odds, 20);
        assert_eq!(chart[5].odds, 95);
        let missing = OddsKey::new("utah", "elk", "cache", "rifle", Residency::Resident);
        assert!(odds_by_point_level(&data, &missing).is_empty());
    }

    #[test]
    fn combined_odds_compounds_independent_draws() {
        assert_eq!(combined_odds(&[]), 0);
        assert_eq!(combined_odds(&[50]), 50);
        assert_eq!(combined_odds(&[50, 50]), 75);
        assert_eq!(combined_odds(&[40, 25, 60]), 82);
        assert_eq!(combined_odds(&[100, 10]), 100);
    }

    #[test]
    fn hunt_type_names_fall_back_to_id() {
        assert_eq!(hunt_type_display_name("rifle"), "Any Weapon/Rifle");
        assert_eq!(hunt_type_display_name("rifle-2"), "Rifle Season 2");
        assert_eq!(hunt_type_display_name("crossbow"), "crossbow");
    }
}
