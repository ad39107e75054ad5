//! Draw Odds Engine
//!
//! Deterministic hunting draw-odds estimation over a read-only reference
//! dataset: per-point odds lookup with interpolation, strategy-driven
//! opportunity ranking and rule-based recommendations. No I/O happens here;
//! callers hand in JSON text or use the bundled dataset.

pub mod analyzer;
pub mod config;
pub mod constants;
pub mod data;
pub mod numbers;
pub mod odds;
pub mod opportunities;
pub mod query;
pub mod recommend;
pub mod strategy;
pub mod validate;

use std::sync::Arc;

// Re-export commonly used types
pub use analyzer::{
    AlternativeOption, AnalysisClient, AnalysisError, AnalysisPrompt, DrawAnalysis,
    EngineAnalyzer, ExternalAnalyzer, OddsAnalyzer, PromptKind, sanitize_analysis,
    select_analyzer,
};
pub use config::{AnalysisMode, ConfigError, EngineConfig, TierThresholds};
pub use data::{
    Access, ApplicationInfo, DataError, HuntStats, Jurisdiction, OddsKey, OddsTable, Quality,
    ReferenceData, SpeciesProfile, StatsKey, UnitInfo,
};
pub use odds::{ChartPoint, combined_odds, hunt_type_display_name, odds_by_point_level};
pub use opportunities::{OpportunitySummary, StrategicOpportunity, StrategyCriteria, summarize};
pub use query::{OddsQuery, QueryError, Residency, parse_points};
pub use recommend::{
    Recommendation, RecommendationContext, Recommendations, Severity, generate_recommendations,
};
pub use strategy::{RiskLevel, Strategy, StrategyProfile};
pub use validate::{DataIssue, IssueKind, ValidationReport, validate_reference};

/// Trait for abstracting where the reference dataset and engine tuning come from.
/// Frontends provide their own (files, bundled assets, fixtures).
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the reference dataset
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be read or parsed.
    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error>;

    /// Load engine configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error>;
}

/// Loader for the dataset compiled into this crate, with default tuning.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledLoader;

impl DataLoader for BundledLoader {
    type Error = DataError;

    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error> {
        ReferenceData::load_from_static()
    }

    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
        Ok(EngineConfig::default())
    }
}

/// Main engine: an immutable dataset shared by reference plus its tuning.
#[derive(Debug, Clone)]
pub struct DrawEngine {
    data: Arc<ReferenceData>,
    config: EngineConfig,
}

impl DrawEngine {
    #[must_use]
    pub fn new(data: ReferenceData, config: EngineConfig) -> Self {
        Self {
            data: Arc::new(data),
            config,
        }
    }

    /// Load, validate and assemble an engine from a [`DataLoader`].
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails, the dataset has structural issues,
    /// or the configuration violates an invariant.
    pub fn from_loader<L>(loader: &L) -> Result<Self, anyhow::Error>
    where
        L: DataLoader,
        L::Error: Into<anyhow::Error>,
    {
        let data = loader.load_reference_data().map_err(Into::into)?;
        let data = data.validated()?;
        let config = loader.load_engine_config().map_err(Into::into)?;
        config.validate()?;
        Ok(Self::new(data, config))
    }

    #[must_use]
    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    #[must_use]
    pub fn shared_data(&self) -> Arc<ReferenceData> {
        Arc::clone(&self.data)
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a query whose identifiers are known to the dataset.
    ///
    /// # Errors
    ///
    /// Returns the first unknown or mismatched identifier.
    pub fn query(
        &self,
        jurisdiction: &str,
        species: &str,
        unit: &str,
        hunt_type: &str,
        residency: Residency,
        points: u32,
    ) -> Result<OddsQuery, QueryError> {
        let query = OddsQuery::new(jurisdiction, species, unit, hunt_type, residency, points);
        self.check(&query)?;
        Ok(query)
    }

    /// # Errors
    ///
    /// Returns the first unknown or mismatched identifier.
    pub fn check(&self, query: &OddsQuery) -> Result<(), QueryError> {
        if !self.data.knows_hunt_type(&query.hunt_type) {
            return Err(QueryError::UnknownHuntType(query.hunt_type.clone()));
        }
        self.data.check_query(query)
    }

    /// Resolved odds, or `Ok(None)` when the dataset has no history for the combination.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for identifiers the dataset does not know.
    pub fn resolve_odds(&self, query: &OddsQuery) -> Result<Option<u8>, QueryError> {
        self.check(query)?;
        Ok(odds::resolve_odds(
            &self.data,
            &query.odds_key(),
            query.points,
        ))
    }

    #[must_use]
    pub fn hunt_stats(&self, query: &OddsQuery) -> Option<&HuntStats> {
        self.data.hunt_stats(&query.stats_key())
    }

    #[must_use]
    pub fn application_info(&self, jurisdiction: &str) -> Option<&ApplicationInfo> {
        self.data.application_info(jurisdiction)
    }

    /// Primary assessment, point advice and alternatives for a resolved odds value.
    #[must_use]
    pub fn recommendations(&self, query: &OddsQuery, odds: u8) -> Recommendations {
        let ctx = RecommendationContext {
            data: &self.data,
            query,
        };
        recommend::generate_with_context(odds, self.hunt_stats(query), ctx, &self.config)
    }

    #[must_use]
    pub fn chart(&self, query: &OddsQuery) -> Vec<ChartPoint> {
        odds_by_point_level(&self.data, &query.odds_key())
    }

    /// Ranked opportunities for the criteria under a strategy.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for an unknown jurisdiction, species or hunt
    /// type, or a minimum odds above 100. Empty sets are not errors.
    pub fn find_opportunities(
        &self,
        criteria: &StrategyCriteria,
        strategy: Strategy,
    ) -> Result<Vec<StrategicOpportunity>, QueryError> {
        criteria.check(&self.data)?;
        Ok(opportunities::find_opportunities(
            &self.data,
            criteria,
            strategy,
            &self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    const FIXTURE: &str = r#"{
        "jurisdictions": { "utah": { "name": "Utah", "species": { "elk": {
            "units": {
                "cache": { "name": "Cache", "quality": "High", "access": "Good" },
                "manti": { "name": "Manti", "quality": "Good", "access": "Good" }
            },
            "hunt_types": ["archery", "rifle"]
        } } } },
        "odds": { "utah": { "elk": {
            "cache": {
                "archery": { "resident": { "0": 20, "5": 67, "10": 95 } },
                "rifle": { "resident": { "0": 8, "5": 45, "10": 88 } }
            },
            "manti": { "rifle": { "resident": { "0": 35, "5": 82, "10": 99 } } }
        } } },
        "stats": { "utah": { "elk": { "cache": { "archery": { "points_needed": "5-7" } } } } }
    }"#;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_reference_data(&self) -> Result<ReferenceData, Self::Error> {
            Ok(ReferenceData::from_json(FIXTURE).unwrap())
        }

        fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
            Ok(EngineConfig {
                max_results: 2,
                ..EngineConfig::default()
            })
        }
    }

    struct BrokenLoader;

    impl DataLoader for BrokenLoader {
        type Error = DataError;

        fn load_reference_data(&self) -> Result<ReferenceData, Self::Error> {
            ReferenceData::from_json("{ \"odds\": 3 }")
        }

        fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
            Ok(EngineConfig::default())
        }
    }

    #[test]
    fn engine_resolves_and_recommends() {
        let engine = DrawEngine::from_loader(&FixtureLoader).unwrap();
        let query = engine
            .query("utah", "elk", "cache", "archery", Residency::Resident, 7)
            .unwrap();
        assert_eq!(engine.resolve_odds(&query).unwrap(), Some(78));
        let recs = engine.recommendations(&query, 78);
        assert_eq!(recs[0].title, "Good Draw Odds");
        assert_eq!(recs.len(), 1);
        assert_eq!(engine.chart(&query).len(), 6);
    }

    #[test]
    fn missing_history_is_none_but_bad_input_is_error() {
        let engine = DrawEngine::from_loader(&FixtureLoader).unwrap();
        let query = engine
            .query("utah", "elk", "manti", "archery", Residency::Resident, 3)
            .unwrap();
        assert_eq!(engine.resolve_odds(&query).unwrap(), None);

        assert_eq!(
            engine
                .query("utah", "elk", "cache", "crossbow", Residency::Resident, 3)
                .unwrap_err(),
            QueryError::UnknownHuntType("crossbow".to_string())
        );
        assert!(matches!(
            engine.query("utah", "deer", "cache", "rifle", Residency::Resident, 3),
            Err(QueryError::UnknownSpecies { .. })
        ));
    }

    #[test]
    fn opportunities_respect_config_cap_and_validate_criteria() {
        let engine = DrawEngine::from_loader(&FixtureLoader).unwrap();
        let criteria = StrategyCriteria {
            jurisdictions: vec!["utah".to_string()],
            species: vec!["elk".to_string()],
            hunt_types: Vec::new(),
            min_odds: 0,
            points: 5,
        };
        let found = engine
            .find_opportunities(&criteria, Strategy::Balanced)
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].unit, "manti");

        let bad = StrategyCriteria {
            jurisdictions: vec!["texas".to_string()],
            ..criteria.clone()
        };
        assert_eq!(
            engine.find_opportunities(&bad, Strategy::Balanced),
            Err(QueryError::UnknownJurisdiction("texas".to_string()))
        );
        let bad = StrategyCriteria {
            species: vec!["bison".to_string()],
            ..criteria
        };
        assert_eq!(
            engine.find_opportunities(&bad, Strategy::Balanced),
            Err(QueryError::UnknownSpeciesId("bison".to_string()))
        );
    }

    #[test]
    fn loader_failures_propagate() {
        assert!(DrawEngine::from_loader(&BrokenLoader).is_err());
        let engine = DrawEngine::from_loader(&BundledLoader).unwrap();
        assert!(engine.data().jurisdiction("nevada").is_some());
        assert_eq!(engine.config(), &EngineConfig::default());
    }
}
