//! Validated query inputs and the boundary error taxonomy.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::data::{OddsKey, StatsKey};

/// Errors raised when a caller hands the engine malformed or unknown input.
///
/// Missing odds data is not an error; see [`crate::DrawEngine::resolve_odds`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown jurisdiction `{0}`")]
    UnknownJurisdiction(String),
    #[error("species `{species}` is not offered in `{jurisdiction}`")]
    UnknownSpecies {
        jurisdiction: String,
        species: String,
    },
    #[error("unit `{unit}` is not defined for {species} in `{jurisdiction}`")]
    UnknownUnit {
        jurisdiction: String,
        species: String,
        unit: String,
    },
    #[error("hunt type `{hunt_type}` is not valid for {species} in `{jurisdiction}`")]
    InvalidHuntType {
        jurisdiction: String,
        species: String,
        hunt_type: String,
    },
    #[error("hunt type `{0}` does not appear anywhere in the reference data")]
    UnknownHuntType(String),
    #[error("species `{0}` does not appear anywhere in the reference data")]
    UnknownSpeciesId(String),
    #[error("unknown residency `{0}` (expected resident or nonresident)")]
    UnknownResidency(String),
    #[error(
        "unknown strategy `{0}` (expected conservative, balanced, aggressive or points-builder)"
    )]
    UnknownStrategy(String),
    #[error("preference points must be a non-negative integer (got `{0}`)")]
    InvalidPoints(String),
    #[error("{field} must be between 0 and 100 (got {value})")]
    PercentOutOfRange { field: &'static str, value: u32 },
}

/// Applicant residency status relative to the issuing jurisdiction.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Residency {
    #[default]
    Resident,
    Nonresident,
}

impl Residency {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Resident => "resident",
            Self::Nonresident => "nonresident",
        }
    }
}

impl fmt::Display for Residency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

impl FromStr for Residency {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resident" => Ok(Self::Resident),
            "nonresident" | "non-resident" => Ok(Self::Nonresident),
            other => Err(QueryError::UnknownResidency(other.to_string())),
        }
    }
}

/// Parse a preference point count, rejecting negatives and non-integers.
///
/// # Errors
///
/// Returns [`QueryError::InvalidPoints`] when the text is not a non-negative integer.
pub fn parse_points(text: &str) -> Result<u32, QueryError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| QueryError::InvalidPoints(text.trim().to_string()))
}

/// Check a percentage-valued input, such as a minimum acceptable odds.
///
/// # Errors
///
/// Returns [`QueryError::PercentOutOfRange`] when `value` exceeds 100.
pub fn check_percent(field: &'static str, value: u32) -> Result<u8, QueryError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= crate::constants::PERCENT_MAX)
        .ok_or(QueryError::PercentOutOfRange { field, value })
}

/// A fully specified odds query. Build one through
/// [`crate::DrawEngine::query`] to have its identifiers checked against the
/// loaded reference data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OddsQuery {
    pub jurisdiction: String,
    pub species: String,
    pub unit: String,
    pub hunt_type: String,
    #[serde(default)]
    pub residency: Residency,
    pub points: u32,
}

impl OddsQuery {
    #[must_use]
    pub fn new(
        jurisdiction: impl Into<String>,
        species: impl Into<String>,
        unit: impl Into<String>,
        hunt_type: impl Into<String>,
        residency: Residency,
        points: u32,
    ) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            species: species.into(),
            unit: unit.into(),
            hunt_type: hunt_type.into(),
            residency,
            points,
        }
    }

    #[must_use]
    pub fn odds_key(&self) -> OddsKey {
        OddsKey::new(
            &self.jurisdiction,
            &self.species,
            &self.unit,
            &self.hunt_type,
            self.residency,
        )
    }

    #[must_use]
    pub fn stats_key(&self) -> StatsKey {
        StatsKey::new(&self.jurisdiction, &self.species, &self.unit, &self.hunt_type)
    }

    /// Same query against a different hunt type.
    #[must_use]
    pub fn with_hunt_type(&self, hunt_type: &str) -> Self {
        Self {
            hunt_type: hunt_type.to_string(),
            ..self.clone()
        }
    }

    /// Same query against a different unit.
    #[must_use]
    pub fn with_unit(&self, unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residency_parses_known_spellings() {
        assert_eq!("resident".parse::<Residency>(), Ok(Residency::Resident));
        assert_eq!(" NonResident ".parse::<Residency>(), Ok(Residency::Nonresident));
        assert_eq!("non-resident".parse::<Residency>(), Ok(Residency::Nonresident));
        assert_eq!(
            "tourist".parse::<Residency>(),
            Err(QueryError::UnknownResidency("tourist".to_string()))
        );
    }

    #[test]
    fn residency_serializes_lowercase() {
        let json = serde_json::to_string(&Residency::Nonresident).unwrap();
        assert_eq!(json, "\"nonresident\"");
        assert_eq!(Residency::Resident.to_string(), "resident");
        assert_eq!(format!("{:<12}|", Residency::Resident), "resident    |");
    }

    #[test]
    fn points_reject_negative_and_fractional_text() {
        assert_eq!(parse_points("0"), Ok(0));
        assert_eq!(parse_points(" 12 "), Ok(12));
        assert_eq!(
            parse_points("-1"),
            Err(QueryError::InvalidPoints("-1".to_string()))
        );
        assert!(parse_points("2.5").is_err());
    }

    #[test]
    fn percent_check_bounds_inclusive() {
        assert_eq!(check_percent("min_odds", 0), Ok(0));
        assert_eq!(check_percent("min_odds", 100), Ok(100));
        assert_eq!(
            check_percent("min_odds", 101),
            Err(QueryError::PercentOutOfRange {
                field: "min_odds",
                value: 101
            })
        );
    }

    #[test]
    fn query_derives_keys_and_variants() {
        let query = OddsQuery::new("utah", "elk", "cache", "rifle", Residency::Resident, 3);
        assert_eq!(query.odds_key().hunt_type, "rifle");
        assert_eq!(query.stats_key().unit, "cache");
        let archery = query.with_hunt_type("archery");
        assert_eq!(archery.hunt_type, "archery");
        assert_eq!(archery.points, 3);
        assert_eq!(query.with_unit("manti").unit, "manti");
    }
}
