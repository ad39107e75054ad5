//! Centralized thresholds and tuning constants for the draw-odds engine.
//!
//! Values that operators may want to tune live in [`crate::EngineConfig`] and
//! use these as their defaults. The strategy filter cut-offs are part of the
//! strategy definitions themselves and are not configurable.

pub const PERCENT_MAX: u8 = 100;

// Opportunity ranking ------------------------------------------------------
pub(crate) const DEFAULT_MAX_ODDS_HEADROOM: u8 = 10;
pub(crate) const DEFAULT_MAX_RESULTS: usize = 10;
pub(crate) const CONSERVATIVE_MIN_ODDS: u8 = 70;
pub(crate) const AGGRESSIVE_MAX_ODDS: u8 = 50;
pub(crate) const BALANCED_MIN_ODDS: u8 = 30;
pub(crate) const POINTS_BUILDER_SLACK: u32 = 1;
pub(crate) const TIP_BALANCED_EXCELLENT_AVG: f64 = 60.0;
pub(crate) const TIP_BALANCED_GOOD_AVG: f64 = 40.0;

// Recommendation tiers -----------------------------------------------------
pub(crate) const DEFAULT_TIER_EXCELLENT: u8 = 80;
pub(crate) const DEFAULT_TIER_GOOD: u8 = 50;
pub(crate) const DEFAULT_TIER_MODERATE: u8 = 25;
pub(crate) const POINTS_BEHIND_MARGIN: u32 = 2;
pub(crate) const POINTS_AHEAD_MARGIN: u32 = 3;
pub(crate) const FALLBACK_POINTS_NEEDED_FLOOR: u32 = 5;
pub(crate) const DEFAULT_ALTERNATIVE_HUNT_TYPE: &str = "archery";
pub(crate) const ALTERNATIVE_TRIGGER_HUNT_TYPE: &str = "rifle";
pub(crate) const DEFAULT_ALTERNATIVE_MIN_ODDS: u8 = 20;
pub(crate) const DEFAULT_ALTERNATIVE_UNIT_MIN_ODDS: u8 = 60;
pub(crate) const MAX_ALTERNATIVE_UNITS: usize = 2;

// Chart series -------------------------------------------------------------
pub(crate) const CHART_POINT_LEVELS: [u32; 6] = [0, 2, 4, 6, 8, 10];

// External analysis defaults -----------------------------------------------
pub(crate) const EXTERNAL_DEFAULT_CONFIDENCE: u8 = 70;
pub(crate) const EXTERNAL_DEFAULT_REASONING: &str = "Analysis based on current trends";
pub(crate) const EXTERNAL_DEFAULT_HISTORY: &str = "Historical data unavailable";
pub(crate) const EXTERNAL_DEFAULT_QUALITY: &str = "good";
pub(crate) const EXTERNAL_DEFAULT_TREND: &str = "stable";
pub(crate) const EXTERNAL_DEFAULT_DIFFICULTY: &str = "Moderate";

// Bundled dataset ----------------------------------------------------------
pub(crate) const BUNDLED_REFERENCE_DATA: &str = include_str!("../../assets/data/reference.json");
