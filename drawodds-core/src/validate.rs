//! Load-time checks over the reference data store.
//!
//! Structural issues (dangling references, impossible percentages) make the
//! dataset unusable. Quality issues, such as odds that fall as points rise,
//! are reported but do not block loading.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::data::{ReferenceData, StatsKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Structural,
    Quality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIssue {
    pub kind: IssueKind,
    pub location: String,
    pub message: String,
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationReport {
    pub issues: Vec<DataIssue>,
}

impl ValidationReport {
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &DataIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    #[must_use]
    pub fn has_structural(&self) -> bool {
        self.issues_of(IssueKind::Structural).next().is_some()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, kind: IssueKind, location: impl fmt::Display, message: String) {
        self.issues.push(DataIssue {
            kind,
            location: location.to_string(),
            message,
        });
    }
}

/// Check every species, odds table, stats record and calendar entry.
#[must_use]
pub fn validate_reference(data: &ReferenceData) -> ValidationReport {
    let mut report = ValidationReport::default();

    for jurisdiction in data.jurisdictions() {
        for (species, profile) in &jurisdiction.species {
            let location = format!("{}/{species}", jurisdiction.id);
            if profile.hunt_types.is_empty() {
                report.push(
                    IssueKind::Structural,
                    &location,
                    "species lists no hunt types".to_string(),
                );
            }
            if profile.units.is_empty() {
                report.push(
                    IssueKind::Quality,
                    &location,
                    "species defines no units".to_string(),
                );
            }
        }
    }

    for (key, table) in data.odds_tables() {
        check_reference(data, &key.stats_key(), &mut report, &key.to_string());
        if table.is_empty() {
            report.push(
                IssueKind::Quality,
                key,
                "odds table has no point levels".to_string(),
            );
        }
        for (points, odds) in table.levels() {
            if !ReferenceData::percent_in_range(odds) {
                report.push(
                    IssueKind::Structural,
                    key,
                    format!("odds at {points} points is {odds}%, above 100%"),
                );
            }
        }
        if let Some(((lo_points, lo_odds), (hi_points, hi_odds))) = table.first_decrease() {
            report.push(
                IssueKind::Quality,
                key,
                format!(
                    "odds fall from {lo_odds}% at {lo_points} points to {hi_odds}% at {hi_points} points"
                ),
            );
        }
    }

    for (key, stats) in data.hunt_stats_records() {
        check_reference(data, key, &mut report, &key.to_string());
        if stats.points_needed_floor().is_none() {
            report.push(
                IssueKind::Quality,
                key,
                format!("points needed `{}` has no numeric lower bound", stats.points_needed),
            );
        }
    }

    for (jurisdiction, info) in data.application_infos() {
        let Some(known) = data.jurisdiction(jurisdiction) else {
            report.push(
                IssueKind::Structural,
                jurisdiction,
                "application calendar for unknown jurisdiction".to_string(),
            );
            continue;
        };
        let offered: BTreeSet<&str> = known
            .species
            .values()
            .flat_map(|profile| profile.hunt_types.iter().map(String::as_str))
            .collect();
        for hunt_type in info.hunt_seasons.keys() {
            if !offered.contains(hunt_type.as_str()) {
                report.push(
                    IssueKind::Quality,
                    jurisdiction,
                    format!("season listed for `{hunt_type}`, which no species offers"),
                );
            }
        }
    }

    report
}

fn check_reference(
    data: &ReferenceData,
    key: &StatsKey,
    report: &mut ValidationReport,
    location: &str,
) {
    let Some(jurisdiction) = data.jurisdiction(&key.jurisdiction) else {
        report.push(
            IssueKind::Structural,
            location,
            format!("unknown jurisdiction `{}`", key.jurisdiction),
        );
        return;
    };
    let Some(profile) = jurisdiction.species.get(&key.species) else {
        report.push(
            IssueKind::Structural,
            location,
            format!("species `{}` not offered", key.species),
        );
        return;
    };
    if !profile.units.contains_key(&key.unit) {
        report.push(
            IssueKind::Structural,
            location,
            format!("unit `{}` not defined", key.unit),
        );
    }
    if !profile.offers_hunt_type(&key.hunt_type) {
        report.push(
            IssueKind::Structural,
            location,
            format!("hunt type `{}` not listed for species", key.hunt_type),
        );
    }
}
