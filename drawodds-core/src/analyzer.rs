//! One capability, two providers: the deterministic engine and an injected
//! external analysis client whose payloads are sanitized before use.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AnalysisMode, EngineConfig};
use crate::constants::{
    EXTERNAL_DEFAULT_CONFIDENCE, EXTERNAL_DEFAULT_DIFFICULTY, EXTERNAL_DEFAULT_HISTORY,
    EXTERNAL_DEFAULT_QUALITY, EXTERNAL_DEFAULT_REASONING, EXTERNAL_DEFAULT_TREND,
};
use crate::data::{Access, HuntStats, Quality, ReferenceData};
use crate::numbers::clamp_percent;
use crate::odds::{hunt_type_display_name, resolve_odds};
use crate::opportunities::{StrategicOpportunity, StrategyCriteria};
use crate::query::{OddsQuery, QueryError};
use crate::recommend::{Recommendation, Severity};
use crate::strategy::Strategy;
use crate::DrawEngine;

const MAX_ENGINE_ALTERNATIVES: usize = 3;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("analysis client failed: {0}")]
    Client(String),
    #[error("analysis payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("analysis payload has unexpected shape: {0}")]
    Shape(&'static str),
    #[error("external analysis selected but no client was provided")]
    MissingClient,
}

/// Another hunt worth a look, as reported next to an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeOption {
    pub jurisdiction: String,
    pub unit: String,
    pub hunt_type: String,
    pub odds: u8,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawAnalysis {
    /// `None` when no historical data exists for the combination.
    pub odds: Option<u8>,
    /// Only external analysis reports a confidence.
    pub confidence: Option<u8>,
    pub reasoning: String,
    pub historical_context: String,
    pub recommendations: Vec<Recommendation>,
    pub alternatives: Vec<AlternativeOption>,
}

pub trait OddsAnalyzer {
    /// # Errors
    ///
    /// Returns an error if the query is invalid or the provider fails.
    fn analyze(&self, query: &OddsQuery) -> Result<DrawAnalysis, AnalysisError>;

    /// # Errors
    ///
    /// Returns an error if the criteria are invalid or the provider fails.
    fn opportunities(
        &self,
        criteria: &StrategyCriteria,
        strategy: Strategy,
    ) -> Result<Vec<StrategicOpportunity>, AnalysisError>;
}

/// Analysis served entirely from the loaded reference data.
#[derive(Debug, Clone)]
pub struct EngineAnalyzer {
    engine: DrawEngine,
}

impl EngineAnalyzer {
    #[must_use]
    pub const fn new(engine: DrawEngine) -> Self {
        Self { engine }
    }

    fn alternatives(&self, query: &OddsQuery, current: Option<u8>) -> Vec<AlternativeOption> {
        let data = self.engine.data();
        let mut found: Vec<AlternativeOption> = data
            .units(&query.jurisdiction, &query.species)
            .flat_map(|(unit, info)| {
                data.hunt_types(&query.jurisdiction, &query.species)
                    .iter()
                    .map(move |hunt_type| (unit, info, hunt_type))
            })
            .filter(|(unit, _, hunt_type)| !(*unit == query.unit && **hunt_type == query.hunt_type))
            .filter_map(|(unit, info, hunt_type)| {
                let candidate = query.with_unit(unit).with_hunt_type(hunt_type);
                let odds = resolve_odds(data, &candidate.odds_key(), query.points)?;
                current.is_none_or(|c| odds > c).then(|| AlternativeOption {
                    jurisdiction: query.jurisdiction.clone(),
                    unit: unit.to_string(),
                    hunt_type: hunt_type.clone(),
                    odds,
                    reason: format!(
                        "{} {} at {odds}% draw odds ({} quality)",
                        info.name,
                        hunt_type_display_name(hunt_type),
                        info.quality
                    ),
                })
            })
            .collect();
        found.sort_by(|a, b| {
            b.odds
                .cmp(&a.odds)
                .then_with(|| a.unit.cmp(&b.unit))
                .then_with(|| a.hunt_type.cmp(&b.hunt_type))
        });
        found.truncate(MAX_ENGINE_ALTERNATIVES);
        found
    }
}

fn historical_context(stats: Option<&HuntStats>) -> String {
    stats.map_or_else(
        || EXTERNAL_DEFAULT_HISTORY.to_string(),
        |s| {
            format!(
                "{} tags for {} applicants; typical successful applicants hold {} points; trend {}",
                s.tags, s.applicants, s.points_needed, s.trend
            )
        },
    )
}

impl OddsAnalyzer for EngineAnalyzer {
    fn analyze(&self, query: &OddsQuery) -> Result<DrawAnalysis, AnalysisError> {
        let odds = self.engine.resolve_odds(query)?;
        let stats = self.engine.hunt_stats(query);
        let reasoning = odds.map_or_else(
            || "No historical data available for this hunt combination".to_string(),
            |odds| {
                format!(
                    "{odds}% draw odds for {} with {} points as a {}, from historical draw results",
                    hunt_type_display_name(&query.hunt_type),
                    query.points,
                    query.residency
                )
            },
        );
        let recommendations = odds
            .map(|odds| self.engine.recommendations(query, odds).into_vec())
            .unwrap_or_default();
        Ok(DrawAnalysis {
            odds,
            confidence: None,
            reasoning,
            historical_context: historical_context(stats),
            recommendations,
            alternatives: self.alternatives(query, odds),
        })
    }

    fn opportunities(
        &self,
        criteria: &StrategyCriteria,
        strategy: Strategy,
    ) -> Result<Vec<StrategicOpportunity>, AnalysisError> {
        Ok(self.engine.find_opportunities(criteria, strategy)?)
    }
}

/// Which question an [`AnalysisPrompt`] asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    DrawOdds,
    Opportunities,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub kind: PromptKind,
    pub system: &'static str,
    pub text: String,
}

/// Transport to an external text-analysis service. Implementations return the
/// raw JSON text of the service's answer.
pub trait AnalysisClient {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Client`] when the service cannot be reached or refuses.
    fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, AnalysisError>;
}

impl<C: AnalysisClient + ?Sized> AnalysisClient for Box<C> {
    fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, AnalysisError> {
        (**self).complete(prompt)
    }
}

const DRAW_ODDS_SYSTEM: &str = "You estimate limited-entry hunting draw odds for western US \
jurisdictions from draw statistics, point creep and tag quotas. Answer with a single JSON object.";

const OPPORTUNITIES_SYSTEM: &str = "You rank limited-entry hunting opportunities across \
jurisdictions by odds, quality and point value. Answer with a single JSON object.";

/// Analysis delegated to an [`AnalysisClient`]; every number it returns is clamped.
pub struct ExternalAnalyzer<C> {
    client: C,
    data: Arc<ReferenceData>,
    config: EngineConfig,
}

impl<C: AnalysisClient> ExternalAnalyzer<C> {
    #[must_use]
    pub fn new(client: C, engine: &DrawEngine) -> Self {
        Self {
            client,
            data: engine.shared_data(),
            config: engine.config().clone(),
        }
    }

    fn draw_odds_prompt(query: &OddsQuery) -> AnalysisPrompt {
        let text = format!(
            "Estimate draw odds for this application.\n\
             jurisdiction: {}\nspecies: {}\nunit: {}\nhunt type: {}\nresidency: {}\npoints: {}\n\
             Respond with JSON: {{\"odds\": 0-100, \"confidence\": 0-100, \"reasoning\": string, \
             \"historicalContext\": string, \"recommendations\": [{{\"type\": \
             \"success|warning|danger|info\", \
             \"title\": string, \"text\": string}}], \"alternativeOptions\": [{{\"state\": string, \
             \"unit\": string, \"huntType\": string, \"odds\": number, \"reason\": string}}]}}",
            query.jurisdiction,
            query.species,
            query.unit,
            query.hunt_type,
            query.residency,
            query.points
        );
        AnalysisPrompt {
            kind: PromptKind::DrawOdds,
            system: DRAW_ODDS_SYSTEM,
            text,
        }
    }

    fn opportunities_prompt(
        &self,
        criteria: &StrategyCriteria,
        strategy: Strategy,
    ) -> AnalysisPrompt {
        let jurisdictions: Vec<&str> = self.data.jurisdictions().map(|j| j.id.as_str()).collect();
        let text = format!(
            "Find the best hunting opportunities.\n\
             target jurisdictions: {}\ntarget species: {}\npoints: {}\n\
             minimum odds: {}%\nstrategy: {}\n\
             Only use these jurisdiction codes: {}\n\
             Respond with JSON: {{\"recommendations\": [{{\"state\": string, \"species\": string, \
             \"unit\": string, \"huntType\": string, \"odds\": number, \"quality\": \
             \"good|high|premium|excellent\", \"trend\": string, \"pointsNeeded\": string}}]}}",
            criteria.jurisdictions.join(", "),
            criteria.species.join(", "),
            criteria.points,
            criteria.min_odds,
            strategy,
            jurisdictions.join(", ")
        );
        AnalysisPrompt {
            kind: PromptKind::Opportunities,
            system: OPPORTUNITIES_SYSTEM,
            text,
        }
    }

    fn opportunity_from(&self, entry: &Value) -> StrategicOpportunity {
        let jurisdiction = text(entry.get("state").or_else(|| entry.get("jurisdiction")))
            .unwrap_or_default();
        let species = text(entry.get("species")).unwrap_or_default();
        let unit = text(entry.get("unit")).unwrap_or_default();
        let hunt_type = text(entry.get("huntType").or_else(|| entry.get("hunt_type")))
            .unwrap_or_default();
        let odds = percent(entry.get("odds"), 0);
        let points_needed = text(entry.get("pointsNeeded"));
        let min_points = entry
            .get("minPoints")
            .and_then(leading_number)
            .or_else(|| entry.get("pointsNeeded").and_then(leading_number))
            .unwrap_or(0);
        let known = self.data.unit_info(&jurisdiction, &species, &unit);
        let quality = text(entry.get("quality"))
            .and_then(|q| parse_quality(&q))
            .or_else(|| known.map(|info| info.quality))
            .or_else(|| parse_quality(EXTERNAL_DEFAULT_QUALITY))
            .unwrap_or(Quality::Good);

        StrategicOpportunity {
            unit_name: known.map_or_else(|| unit.clone(), |info| info.name.clone()),
            access: known.map_or(Access::Moderate, |info| info.access),
            jurisdiction,
            species,
            unit,
            hunt_type,
            odds,
            max_odds: odds.saturating_add(self.config.max_odds_headroom),
            min_points,
            quality,
            tags: None,
            applicants: None,
            points_needed,
            trend: Some(
                text(entry.get("trend")).unwrap_or_else(|| EXTERNAL_DEFAULT_TREND.to_string()),
            ),
            success: Some(text(entry.get("success")).unwrap_or_else(|| format!("{odds}%"))),
            avg_size: text(entry.get("avgSize")),
            difficulty: Some(
                text(entry.get("difficulty"))
                    .unwrap_or_else(|| EXTERNAL_DEFAULT_DIFFICULTY.to_string()),
            ),
        }
    }
}

impl<C: AnalysisClient> OddsAnalyzer for ExternalAnalyzer<C> {
    fn analyze(&self, query: &OddsQuery) -> Result<DrawAnalysis, AnalysisError> {
        self.data.check_query(query)?;
        let raw = self.client.complete(&Self::draw_odds_prompt(query))?;
        let payload: Value = serde_json::from_str(&raw)?;
        if !payload.is_object() {
            return Err(AnalysisError::Shape("expected a JSON object"));
        }
        Ok(sanitize_analysis(&payload))
    }

    fn opportunities(
        &self,
        criteria: &StrategyCriteria,
        strategy: Strategy,
    ) -> Result<Vec<StrategicOpportunity>, AnalysisError> {
        criteria.check(&self.data)?;
        if !criteria.has_targets() {
            return Ok(Vec::new());
        }
        let raw = self
            .client
            .complete(&self.opportunities_prompt(criteria, strategy))?;
        let payload: Value = serde_json::from_str(&raw)?;
        let entries = payload
            .get("recommendations")
            .and_then(Value::as_array)
            .ok_or(AnalysisError::Shape("missing `recommendations` array"))?;
        let returned = entries.len();
        let mut found: Vec<_> = entries
            .iter()
            .filter(|entry| entry.is_object())
            .map(|entry| self.opportunity_from(entry))
            .filter(|opportunity| criteria.accepts(opportunity, strategy))
            .collect();
        found.sort_by(StrategicOpportunity::ranking);
        found.truncate(self.config.max_results);
        log::debug!(
            "external analysis returned {returned} opportunities, {} kept",
            found.len()
        );
        Ok(found)
    }
}

/// Build a [`DrawAnalysis`] from a loosely shaped external payload.
#[must_use]
pub fn sanitize_analysis(payload: &Value) -> DrawAnalysis {
    let recommendations = payload
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|recs| recs.iter().map(sanitize_recommendation).collect())
        .unwrap_or_default();
    let alternatives = payload
        .get("alternativeOptions")
        .or_else(|| payload.get("alternatives"))
        .and_then(Value::as_array)
        .map(|opts| {
            opts.iter()
                .map(|opt| AlternativeOption {
                    jurisdiction: text(opt.get("state").or_else(|| opt.get("jurisdiction")))
                        .unwrap_or_default(),
                    unit: text(opt.get("unit")).unwrap_or_default(),
                    hunt_type: text(opt.get("huntType").or_else(|| opt.get("hunt_type")))
                        .unwrap_or_default(),
                    odds: percent(opt.get("odds"), 0),
                    reason: text(opt.get("reason")).unwrap_or_default(),
                })
                .collect()
        })
        .unwrap_or_default();

    DrawAnalysis {
        odds: Some(percent(payload.get("odds"), 0)),
        confidence: Some(percent(payload.get("confidence"), EXTERNAL_DEFAULT_CONFIDENCE)),
        reasoning: text(payload.get("reasoning"))
            .unwrap_or_else(|| EXTERNAL_DEFAULT_REASONING.to_string()),
        historical_context: text(
            payload
                .get("historicalContext")
                .or_else(|| payload.get("historical_context")),
        )
        .unwrap_or_else(|| EXTERNAL_DEFAULT_HISTORY.to_string()),
        recommendations,
        alternatives,
    }
}

fn sanitize_recommendation(rec: &Value) -> Recommendation {
    if let Value::String(body) = rec {
        return Recommendation {
            severity: Severity::Info,
            title: "Analysis Recommendation".to_string(),
            text: body.clone(),
        };
    }
    let severity = rec
        .get("type")
        .or_else(|| rec.get("severity"))
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(Severity::Info);
    Recommendation {
        severity,
        title: text(rec.get("title")).unwrap_or_else(|| "Analysis Recommendation".to_string()),
        text: text(rec.get("text")).unwrap_or_else(|| "No recommendation text".to_string()),
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn percent(value: Option<&Value>, fallback: u8) -> u8 {
    number(value).map_or(fallback, |n| clamp_percent(n, fallback))
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn leading_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn parse_quality(label: &str) -> Option<Quality> {
    match label.trim().to_ascii_lowercase().as_str() {
        "good" => Some(Quality::Good),
        "high" => Some(Quality::High),
        "premium" => Some(Quality::Premium),
        "excellent" => Some(Quality::Excellent),
        _ => None,
    }
}

/// Pick the analyzer named by the engine's configuration.
///
/// # Errors
///
/// Returns [`AnalysisError::MissingClient`] when external analysis is
/// configured but no client is supplied.
pub fn select_analyzer(
    engine: &DrawEngine,
    client: Option<Box<dyn AnalysisClient>>,
) -> Result<Box<dyn OddsAnalyzer>, AnalysisError> {
    match (engine.config().analysis, client) {
        (AnalysisMode::Engine, _) => Ok(Box::new(EngineAnalyzer::new(engine.clone()))),
        (AnalysisMode::External, Some(client)) => {
            Ok(Box::new(ExternalAnalyzer::new(client, engine)))
        }
        (AnalysisMode::External, None) => Err(AnalysisError::MissingClient),
    }
}
