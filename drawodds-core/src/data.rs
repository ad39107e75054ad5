//! Reference data store: jurisdictions, units, per-point odds tables and hunt statistics.
//!
//! The on-disk form nests everything by jurisdiction, species, unit and hunt
//! type. It is flattened into typed keys on load so lookups never have to
//! split hyphenated identifiers such as `rifle-1`.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::constants::{BUNDLED_REFERENCE_DATA, PERCENT_MAX};
use crate::query::{OddsQuery, QueryError, Residency};
use crate::validate::{IssueKind, validate_reference};

/// Errors raised while loading the reference data store.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("reference data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("reference data failed validation with {count} structural issue(s); first: {first}")]
    Invalid { count: usize, first: String },
}

/// Trophy/experience tier of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Good,
    High,
    Premium,
    Excellent,
}

impl Quality {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::High => "High",
            Self::Premium => "Premium",
            Self::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// How hard a unit is to get into and hunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    Easy,
    Good,
    Moderate,
    Difficult,
    #[serde(rename = "Very Difficult")]
    VeryDifficult,
}

impl Access {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Difficult => "Difficult",
            Self::VeryDifficult => "Very Difficult",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub name: String,
    pub quality: Quality,
    pub access: Access,
}

pub type HuntTypeList = SmallVec<[String; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpeciesProfile {
    #[serde(default)]
    pub units: BTreeMap<String, UnitInfo>,
    #[serde(default)]
    pub hunt_types: HuntTypeList,
}

impl SpeciesProfile {
    #[must_use]
    pub fn offers_hunt_type(&self, hunt_type: &str) -> bool {
        self.hunt_types.iter().any(|h| h == hunt_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jurisdiction {
    pub id: String,
    pub name: String,
    pub species: BTreeMap<String, SpeciesProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct JurisdictionNoId {
    pub name: String,
    #[serde(default)]
    pub species: BTreeMap<String, SpeciesProfile>,
}

impl Jurisdiction {
    fn with_id(id: String, j: JurisdictionNoId) -> Self {
        Self {
            id,
            name: j.name,
            species: j.species,
        }
    }
}

/// Sparse point-level to percentage table for one hunt and residency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct OddsTable {
    levels: BTreeMap<u32, u8>,
}

impl OddsTable {
    #[must_use]
    pub fn from_levels(levels: impl IntoIterator<Item = (u32, u8)>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn exact(&self, points: u32) -> Option<u8> {
        self.levels.get(&points).copied()
    }

    /// Greatest known level at or below `points`.
    #[must_use]
    pub fn floor_level(&self, points: u32) -> Option<(u32, u8)> {
        self.levels
            .range(..=points)
            .next_back()
            .map(|(&p, &o)| (p, o))
    }

    /// Smallest known level at or above `points`.
    #[must_use]
    pub fn ceil_level(&self, points: u32) -> Option<(u32, u8)> {
        self.levels.range(points..).next().map(|(&p, &o)| (p, o))
    }

    pub fn levels(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.levels.iter().map(|(&p, &o)| (p, o))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// First adjacent pair of known levels where odds drop as points rise.
    #[must_use]
    pub fn first_decrease(&self) -> Option<((u32, u8), (u32, u8))> {
        let mut prev: Option<(u32, u8)> = None;
        for (points, odds) in self.levels() {
            if let Some(before) = prev
                && odds < before.1
            {
                return Some((before, (points, odds)));
            }
            prev = Some((points, odds));
        }
        None
    }

    #[must_use]
    pub fn max_percent(&self) -> Option<u8> {
        self.levels.values().copied().max()
    }
}

/// Descriptive statistics surfaced next to a resolved odds value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HuntStats {
    #[serde(default)]
    pub tags: u32,
    #[serde(default)]
    pub applicants: u32,
    #[serde(default)]
    pub points_needed: String,
    #[serde(default)]
    pub trend: String,
    #[serde(default)]
    pub quality: String,
    #[serde(default)]
    pub success: String,
    #[serde(default)]
    pub avg_size: String,
    #[serde(default)]
    pub difficulty: String,
}

impl HuntStats {
    /// Lower bound of the typical points-needed range ("5-7" -> 5, "20+" -> 20).
    #[must_use]
    pub fn points_needed_floor(&self) -> Option<u32> {
        let digits: String = self
            .points_needed
            .trim_start()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

/// Application calendar for one jurisdiction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApplicationInfo {
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub draw_date: String,
    #[serde(default)]
    pub results_date: String,
    #[serde(default)]
    pub hunt_seasons: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatsKey {
    pub jurisdiction: String,
    pub species: String,
    pub unit: String,
    pub hunt_type: String,
}

impl StatsKey {
    #[must_use]
    pub fn new(jurisdiction: &str, species: &str, unit: &str, hunt_type: &str) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            species: species.to_string(),
            unit: unit.to_string(),
            hunt_type: hunt_type.to_string(),
        }
    }
}

impl fmt::Display for StatsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.jurisdiction, self.species, self.unit, self.hunt_type
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OddsKey {
    pub jurisdiction: String,
    pub species: String,
    pub unit: String,
    pub hunt_type: String,
    pub residency: Residency,
}

impl OddsKey {
    #[must_use]
    pub fn new(
        jurisdiction: &str,
        species: &str,
        unit: &str,
        hunt_type: &str,
        residency: Residency,
    ) -> Self {
        Self {
            jurisdiction: jurisdiction.to_string(),
            species: species.to_string(),
            unit: unit.to_string(),
            hunt_type: hunt_type.to_string(),
            residency,
        }
    }

    #[must_use]
    pub fn stats_key(&self) -> StatsKey {
        StatsKey::new(&self.jurisdiction, &self.species, &self.unit, &self.hunt_type)
    }
}

impl fmt::Display for OddsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.stats_key(), self.residency)
    }
}

/// jurisdiction -> species -> unit -> hunt type -> T
type HuntTree<T> = BTreeMap<String, BTreeMap<String, BTreeMap<String, BTreeMap<String, T>>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct RawReferenceData {
    #[serde(default)]
    jurisdictions: BTreeMap<String, JurisdictionNoId>,
    #[serde(default)]
    odds: HuntTree<BTreeMap<Residency, OddsTable>>,
    #[serde(default)]
    stats: HuntTree<HuntStats>,
    #[serde(default)]
    application_info: BTreeMap<String, ApplicationInfo>,
}

fn flatten_tree<T, K, V>(
    tree: HuntTree<T>,
    mut emit: impl FnMut(StatsKey, T) -> Vec<(K, V)>,
) -> BTreeMap<K, V>
where
    K: Ord,
{
    let mut flat = BTreeMap::new();
    for (jurisdiction, species_map) in tree {
        for (species, unit_map) in species_map {
            for (unit, hunt_map) in unit_map {
                for (hunt_type, value) in hunt_map {
                    let key = StatsKey {
                        jurisdiction: jurisdiction.clone(),
                        species: species.clone(),
                        unit: unit.clone(),
                        hunt_type,
                    };
                    flat.extend(emit(key, value));
                }
            }
        }
    }
    flat
}

/// Immutable, load-once reference dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceData {
    jurisdictions: BTreeMap<String, Jurisdiction>,
    odds: BTreeMap<OddsKey, OddsTable>,
    stats: BTreeMap<StatsKey, HuntStats>,
    application_info: BTreeMap<String, ApplicationInfo>,
    fingerprint: u64,
}

impl ReferenceData {
    /// Load reference data from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into the reference data shape.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let raw: RawReferenceData = serde_json::from_str(json)?;
        let canonical = serde_json::to_vec(&raw)?;
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&canonical);
        let fingerprint = hasher.finish();

        let jurisdictions = raw
            .jurisdictions
            .into_iter()
            .map(|(id, j)| (id.clone(), Jurisdiction::with_id(id, j)))
            .collect();
        let odds = flatten_tree(raw.odds, |key, by_residency| {
            by_residency
                .into_iter()
                .map(|(residency, table)| {
                    let odds_key = OddsKey::new(
                        &key.jurisdiction,
                        &key.species,
                        &key.unit,
                        &key.hunt_type,
                        residency,
                    );
                    (odds_key, table)
                })
                .collect()
        });
        let stats = flatten_tree(raw.stats, |key, stats| vec![(key, stats)]);

        let data = Self {
            jurisdictions,
            odds,
            stats,
            application_info: raw.application_info,
            fingerprint,
        };
        log::debug!(
            "loaded reference data {:016x}: {} jurisdictions, {} odds tables, {} stats records",
            data.fingerprint,
            data.jurisdictions.len(),
            data.odds.len(),
            data.stats.len()
        );
        Ok(data)
    }

    /// Load the dataset bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON is malformed.
    pub fn load_from_static() -> Result<Self, DataError> {
        Self::from_json(BUNDLED_REFERENCE_DATA)
    }

    /// Run the dataset validator, rejecting structural problems and logging quality ones.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Invalid`] when any structural issue is found.
    pub fn validated(self) -> Result<Self, DataError> {
        let report = validate_reference(&self);
        for issue in report.issues_of(IssueKind::Quality) {
            log::warn!("reference data quality: {issue}");
        }
        let structural: Vec<_> = report.issues_of(IssueKind::Structural).collect();
        if let Some(first) = structural.first() {
            return Err(DataError::Invalid {
                count: structural.len(),
                first: first.to_string(),
            });
        }
        Ok(self)
    }

    /// Stable hash of the canonical dataset, useful for labelling reports.
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn jurisdictions(&self) -> impl Iterator<Item = &Jurisdiction> {
        self.jurisdictions.values()
    }

    #[must_use]
    pub fn jurisdiction(&self, id: &str) -> Option<&Jurisdiction> {
        self.jurisdictions.get(id)
    }

    #[must_use]
    pub fn species(&self, jurisdiction: &str, species: &str) -> Option<&SpeciesProfile> {
        self.jurisdiction(jurisdiction)?.species.get(species)
    }

    /// Units defined for a species, ordered by unit id.
    pub fn units<'a>(
        &'a self,
        jurisdiction: &str,
        species: &str,
    ) -> impl Iterator<Item = (&'a str, &'a UnitInfo)> + 'a {
        self.species(jurisdiction, species)
            .into_iter()
            .flat_map(|profile| profile.units.iter().map(|(id, info)| (id.as_str(), info)))
    }

    #[must_use]
    pub fn hunt_types(&self, jurisdiction: &str, species: &str) -> &[String] {
        self.species(jurisdiction, species)
            .map_or(&[], |profile| profile.hunt_types.as_slice())
    }

    #[must_use]
    pub fn unit_info(&self, jurisdiction: &str, species: &str, unit: &str) -> Option<&UnitInfo> {
        self.species(jurisdiction, species)?.units.get(unit)
    }

    #[must_use]
    pub fn odds_table(&self, key: &OddsKey) -> Option<&OddsTable> {
        self.odds.get(key)
    }

    pub fn odds_tables(&self) -> impl Iterator<Item = (&OddsKey, &OddsTable)> {
        self.odds.iter()
    }

    #[must_use]
    pub fn hunt_stats(&self, key: &StatsKey) -> Option<&HuntStats> {
        self.stats.get(key)
    }

    pub fn hunt_stats_records(&self) -> impl Iterator<Item = (&StatsKey, &HuntStats)> {
        self.stats.iter()
    }

    #[must_use]
    pub fn application_info(&self, jurisdiction: &str) -> Option<&ApplicationInfo> {
        self.application_info.get(jurisdiction)
    }

    pub fn application_infos(&self) -> impl Iterator<Item = (&str, &ApplicationInfo)> {
        self.application_info
            .iter()
            .map(|(id, info)| (id.as_str(), info))
    }

    #[must_use]
    pub fn knows_species(&self, species: &str) -> bool {
        self.jurisdictions()
            .any(|j| j.species.contains_key(species))
    }

    #[must_use]
    pub fn knows_hunt_type(&self, hunt_type: &str) -> bool {
        self.jurisdictions()
            .flat_map(|j| j.species.values())
            .any(|profile| profile.offers_hunt_type(hunt_type))
    }

    /// Check a query's identifiers against the dataset.
    ///
    /// # Errors
    ///
    /// Returns the first identifier that is unknown or not valid in context.
    pub fn check_query(&self, query: &OddsQuery) -> Result<(), QueryError> {
        let jurisdiction = self
            .jurisdiction(&query.jurisdiction)
            .ok_or_else(|| QueryError::UnknownJurisdiction(query.jurisdiction.clone()))?;
        let profile =
            jurisdiction
                .species
                .get(&query.species)
                .ok_or_else(|| QueryError::UnknownSpecies {
                    jurisdiction: query.jurisdiction.clone(),
                    species: query.species.clone(),
                })?;
        if !profile.units.contains_key(&query.unit) {
            return Err(QueryError::UnknownUnit {
                jurisdiction: query.jurisdiction.clone(),
                species: query.species.clone(),
                unit: query.unit.clone(),
            });
        }
        if !profile.offers_hunt_type(&query.hunt_type) {
            return Err(QueryError::InvalidHuntType {
                jurisdiction: query.jurisdiction.clone(),
                species: query.species.clone(),
                hunt_type: query.hunt_type.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn percent_in_range(value: u8) -> bool {
        value <= PERCENT_MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "jurisdictions": {
            "utah": {
                "name": "Utah",
                "species": {
                    "elk": {
                        "units": {
                            "manti": { "name": "Manti", "quality": "Good", "access": "Good" },
                            "cache": { "name": "Cache", "quality": "High", "access": "Very Difficult" }
                        },
                        "hunt_types": ["archery", "rifle-1"]
                    }
                }
            }
        },
        "odds": {
            "utah": { "elk": { "cache": { "rifle-1": {
                "resident": { "0": 20, "5": 67, "10": 95 },
                "nonresident": { "0": 10 }
            } } } }
        },
        "stats": {
            "utah": { "elk": { "cache": { "rifle-1": {
                "tags": 35, "applicants": 143, "points_needed": "5-7", "trend": "up"
            } } } }
        },
        "application_info": {
            "utah": { "deadline": "March 2nd", "hunt_seasons": { "archery": "Aug" } }
        }
    }"#;

    #[test]
    fn nested_json_flattens_into_typed_keys() {
        let data = ReferenceData::from_json(SAMPLE).unwrap();
        let key = OddsKey::new("utah", "elk", "cache", "rifle-1", Residency::Resident);
        let table = data.odds_table(&key).expect("table present");
        assert_eq!(table.exact(5), Some(67));
        assert_eq!(table.len(), 3);
        let nonresident = OddsKey::new("utah", "elk", "cache", "rifle-1", Residency::Nonresident);
        assert_eq!(data.odds_table(&nonresident).unwrap().exact(0), Some(10));
        assert_eq!(data.odds_tables().count(), 2);

        let stats = data.hunt_stats(&key.stats_key()).expect("stats present");
        assert_eq!(stats.tags, 35);
        assert!(stats.quality.is_empty());
    }

    #[test]
    fn units_iterate_in_id_order_with_typed_tiers() {
        let data = ReferenceData::from_json(SAMPLE).unwrap();
        let ids: Vec<_> = data.units("utah", "elk").map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["cache", "manti"]);
        let cache = data.unit_info("utah", "elk", "cache").unwrap();
        assert_eq!(cache.access, Access::VeryDifficult);
        assert_eq!(cache.quality, Quality::High);
        assert_eq!(data.units("utah", "moose").count(), 0);
        assert!(data.hunt_types("idaho", "elk").is_empty());
        assert_eq!(data.jurisdiction("utah").unwrap().id, "utah");
    }

    #[test]
    fn unknown_tier_text_is_rejected() {
        let json = SAMPLE.replace("\"quality\": \"Good\"", "\"quality\": \"Legendary\"");
        assert!(matches!(
            ReferenceData::from_json(&json),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn table_neighbors_bracket_missing_levels() {
        let table = OddsTable::from_levels([(3, 45), (5, 65)]);
        assert_eq!(table.floor_level(4), Some((3, 45)));
        assert_eq!(table.ceil_level(4), Some((5, 65)));
        assert_eq!(table.floor_level(2), None);
        assert_eq!(table.ceil_level(6), None);
        assert_eq!(table.max_percent(), Some(65));
    }

    #[test]
    fn first_decrease_reports_offending_pair() {
        let good = OddsTable::from_levels([(0, 10), (1, 10), (2, 30)]);
        assert_eq!(good.first_decrease(), None);
        let bad = OddsTable::from_levels([(0, 10), (1, 30), (2, 25)]);
        assert_eq!(bad.first_decrease(), Some(((1, 30), (2, 25))));
    }

    #[test]
    fn points_needed_floor_parses_ranges_and_open_bounds() {
        let mut stats = HuntStats {
            tags: 0,
            applicants: 0,
            points_needed: "5-7".to_string(),
            trend: String::new(),
            quality: String::new(),
            success: String::new(),
            avg_size: String::new(),
            difficulty: String::new(),
        };
        assert_eq!(stats.points_needed_floor(), Some(5));
        stats.points_needed = "20+".to_string();
        assert_eq!(stats.points_needed_floor(), Some(20));
        stats.points_needed = "unknown".to_string();
        assert_eq!(stats.points_needed_floor(), None);
    }

    #[test]
    fn check_query_names_first_bad_identifier() {
        let data = ReferenceData::from_json(SAMPLE).unwrap();
        let ok = OddsQuery::new("utah", "elk", "cache", "archery", Residency::Resident, 0);
        assert_eq!(data.check_query(&ok), Ok(()));

        let bad_state = OddsQuery::new("ohio", "elk", "cache", "archery", Residency::Resident, 0);
        assert_eq!(
            data.check_query(&bad_state),
            Err(QueryError::UnknownJurisdiction("ohio".to_string()))
        );
        let bad_unit = ok.with_unit("zion");
        assert!(matches!(
            data.check_query(&bad_unit),
            Err(QueryError::UnknownUnit { .. })
        ));
        let bad_type = ok.with_hunt_type("muzzleloader");
        assert!(matches!(
            data.check_query(&bad_type),
            Err(QueryError::InvalidHuntType { .. })
        ));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = ReferenceData::from_json(SAMPLE).unwrap();
        let b = ReferenceData::from_json(SAMPLE).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        let changed = SAMPLE.replace("\"5\": 67", "\"5\": 68");
        let c = ReferenceData::from_json(&changed).unwrap();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn labels_honor_width_and_alignment() {
        assert_eq!(format!("{:<9}|", Quality::Good), "Good     |");
        assert_eq!(format!("{:>9}|", Quality::High), "     High|");
        assert_eq!(format!("{:<15}|", Access::VeryDifficult), "Very Difficult |");
        assert_eq!(format!("{:^10}", Access::Easy), "   Easy   ");
        assert_eq!(Access::Moderate.to_string(), "Moderate");
    }

    #[test]
    fn bundled_dataset_loads() {
        let data = ReferenceData::load_from_static().unwrap();
        assert!(data.jurisdiction("utah").is_some());
        assert!(data.application_info("wyoming").is_some());
        assert!(data.knows_species("antelope"));
        assert!(data.knows_hunt_type("rifle-2"));
        assert!(!data.knows_hunt_type("crossbow"));
    }
}
