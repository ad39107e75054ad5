use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::io::Write;

use drawodds_core::{
    Access, ApplicationInfo, ChartPoint, DrawAnalysis, HuntStats, IssueKind, OddsQuery,
    OpportunitySummary, Quality, ReferenceData, Severity, StrategicOpportunity, StrategyCriteria,
    StrategyProfile, ValidationReport,
};

const NO_HISTORY: &str = "No historical data available for this hunt combination";
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

/// Dataset fingerprint and generation time stamped on every report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub dataset: String,
    pub generated_at: String,
}

impl ReportMeta {
    pub fn new(data: &ReferenceData) -> Self {
        Self {
            dataset: format!("{:016x}", data.fingerprint()),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    fn footer(&self) -> String {
        format!("dataset {} · generated {}", self.dataset, self.generated_at)
    }
}

pub trait Report: Serialize {
    fn console(&self, out: &mut dyn Write) -> Result<()>;
    fn markdown(&self, out: &mut dyn Write) -> Result<()>;
    fn csv(&self, out: &mut dyn Write) -> Result<()>;
}

pub fn render<R: Report>(report: &R, format: ReportFormat, out: &mut dyn Write) -> Result<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        ReportFormat::Markdown => report.markdown(out)?,
        ReportFormat::Csv => report.csv(out)?,
        ReportFormat::Console => report.console(out)?,
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(out: &mut dyn Write, fields: &[&str]) -> Result<()> {
    let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    writeln!(out, "{}", row.join(","))?;
    Ok(())
}

fn severity_tag(severity: Severity) -> ColoredString {
    let tag = format!("[{}]", severity.key().to_uppercase());
    match severity {
        Severity::Success => tag.green(),
        Severity::Warning => tag.yellow(),
        Severity::Danger => tag.red(),
        Severity::Info => tag.blue(),
    }
}

fn odds_colored(odds: u8) -> ColoredString {
    let text = format!("{odds}%");
    match odds {
        80.. => text.green().bold(),
        50..=79 => text.bright_green(),
        25..=49 => text.yellow(),
        _ => text.red(),
    }
}

fn bar(odds: u8) -> String {
    "█".repeat(usize::from(odds) * BAR_WIDTH / 100)
}

#[derive(Debug, Serialize)]
pub struct OddsReport {
    pub meta: ReportMeta,
    pub query: OddsQuery,
    pub jurisdiction_name: String,
    pub unit_name: String,
    pub hunt_type_name: String,
    pub analysis: DrawAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<HuntStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationInfo>,
    pub chart: Vec<ChartPoint>,
}

impl OddsReport {
    fn headline(&self) -> String {
        format!(
            "{} {} · {} · {} · {} · {} points",
            self.jurisdiction_name,
            self.query.species,
            self.unit_name,
            self.hunt_type_name,
            self.query.residency,
            self.query.points
        )
    }

    fn season(&self) -> Option<&str> {
        self.application
            .as_ref()?
            .hunt_seasons
            .get(&self.query.hunt_type)
            .map(String::as_str)
    }
}

impl Report for OddsReport {
    fn console(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", "🎯 Draw Odds".bright_cyan().bold())?;
        writeln!(out, "{}", "============".cyan())?;
        writeln!(out, "{}", self.headline())?;
        writeln!(out)?;
        match self.analysis.odds {
            Some(odds) => writeln!(out, "Odds: {}", odds_colored(odds))?,
            None => writeln!(out, "{}", NO_HISTORY.yellow())?,
        }
        if let Some(confidence) = self.analysis.confidence {
            writeln!(out, "Confidence: {confidence}%")?;
        }
        writeln!(out, "{}", self.analysis.reasoning)?;
        writeln!(out, "{}", self.analysis.historical_context.dimmed())?;

        if let Some(stats) = &self.stats {
            writeln!(out)?;
            writeln!(out, "{}", "📈 Hunt Statistics".bright_yellow().bold())?;
            writeln!(out, "   Tags: {}  Applicants: {}", stats.tags, stats.applicants)?;
            writeln!(out, "   Points needed: {}  Trend: {}", stats.points_needed, stats.trend)?;
            writeln!(
                out,
                "   Success: {}  Avg size: {}  Difficulty: {}",
                stats.success, stats.avg_size, stats.difficulty
            )?;
        }

        if let Some(app) = &self.application {
            writeln!(out)?;
            writeln!(out, "{}", "🗓  Application".bright_yellow().bold())?;
            writeln!(out, "   Deadline: {}", app.deadline)?;
            writeln!(out, "   Draw: {}  Results: {}", app.draw_date, app.results_date)?;
            if let Some(season) = self.season() {
                writeln!(out, "   Season: {season}")?;
            }
        }

        if !self.chart.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", "📊 Odds by Points".bright_yellow().bold())?;
            for point in &self.chart {
                writeln!(out, "   {:>5} {} {}%", point.label, bar(point.odds).cyan(), point.odds)?;
            }
        }

        if !self.analysis.recommendations.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", "💡 Recommendations".bright_yellow().bold())?;
            for rec in &self.analysis.recommendations {
                writeln!(out, "   {} {}", severity_tag(rec.severity), rec.title.bold())?;
                writeln!(out, "      {}", rec.text)?;
            }
        }

        if !self.analysis.alternatives.is_empty() {
            writeln!(out)?;
            writeln!(out, "{}", "🔀 Alternatives".bright_yellow().bold())?;
            for alt in &self.analysis.alternatives {
                writeln!(out, "   • {} {}: {}", alt.unit, alt.hunt_type, alt.reason)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "{}", self.meta.footer().dimmed())?;
        Ok(())
    }

    fn markdown(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "# Draw Odds\n")?;
        writeln!(out, "**{}**\n", self.headline())?;
        match self.analysis.odds {
            Some(odds) => writeln!(out, "- **Odds**: {odds}%")?,
            None => writeln!(out, "- **Odds**: _{NO_HISTORY}_")?,
        }
        if let Some(confidence) = self.analysis.confidence {
            writeln!(out, "- **Confidence**: {confidence}%")?;
        }
        writeln!(out, "- **Reasoning**: {}", self.analysis.reasoning)?;
        writeln!(out, "- **History**: {}\n", self.analysis.historical_context)?;

        if let Some(stats) = &self.stats {
            writeln!(out, "## Hunt Statistics\n")?;
            writeln!(
                out,
                "| Tags | Applicants | Points needed | Trend | Success | Avg size | Difficulty |"
            )?;
            writeln!(out, "|---|---|---|---|---|---|---|")?;
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                stats.tags,
                stats.applicants,
                stats.points_needed,
                stats.trend,
                stats.success,
                stats.avg_size,
                stats.difficulty
            )?;
        }

        if let Some(app) = &self.application {
            writeln!(out, "## Application\n")?;
            writeln!(out, "- **Deadline**: {}", app.deadline)?;
            writeln!(out, "- **Draw date**: {}", app.draw_date)?;
            writeln!(out, "- **Results**: {}", app.results_date)?;
            if let Some(season) = self.season() {
                writeln!(out, "- **Season**: {season}")?;
            }
            writeln!(out)?;
        }

        if !self.chart.is_empty() {
            writeln!(out, "## Odds by Points\n")?;
            writeln!(out, "| Points | Odds |")?;
            writeln!(out, "|---|---|")?;
            for point in &self.chart {
                writeln!(out, "| {} | {}% |", point.label, point.odds)?;
            }
            writeln!(out)?;
        }

        if !self.analysis.recommendations.is_empty() {
            writeln!(out, "## Recommendations\n")?;
            for rec in &self.analysis.recommendations {
                writeln!(out, "- **{}** ({}): {}", rec.title, rec.severity, rec.text)?;
            }
            writeln!(out)?;
        }

        writeln!(out, "_{}_", self.meta.footer())?;
        Ok(())
    }

    fn csv(&self, out: &mut dyn Write) -> Result<()> {
        csv_row(
            out,
            &[
                "jurisdiction",
                "species",
                "unit",
                "hunt_type",
                "residency",
                "points",
                "odds",
                "points_needed",
                "dataset",
            ],
        )?;
        let odds = self.analysis.odds.map(|o| o.to_string()).unwrap_or_default();
        let points = self.query.points.to_string();
        let points_needed = self
            .stats
            .as_ref()
            .map(|s| s.points_needed.as_str())
            .unwrap_or_default();
        csv_row(
            out,
            &[
                &self.query.jurisdiction,
                &self.query.species,
                &self.query.unit,
                &self.query.hunt_type,
                self.query.residency.key(),
                &points,
                &odds,
                points_needed,
                &self.meta.dataset,
            ],
        )
    }
}

#[derive(Debug, Serialize)]
pub struct OpportunitiesReport {
    pub meta: ReportMeta,
    pub criteria: StrategyCriteria,
    pub profile: StrategyProfile,
    pub summary: OpportunitySummary,
    pub opportunities: Vec<StrategicOpportunity>,
}

impl Report for OpportunitiesReport {
    fn console(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", "🧭 Strategic Opportunities".bright_cyan().bold())?;
        writeln!(out, "{}", "==========================".cyan())?;
        writeln!(
            out,
            "{} ({:?} risk): {}",
            self.profile.name.bold(),
            self.profile.risk,
            self.profile.description
        )?;
        writeln!(
            out,
            "Jurisdictions: {}  Species: {}  Points: {}  Min odds: {}%",
            self.criteria.jurisdictions.join(", "),
            self.criteria.species.join(", "),
            self.criteria.points,
            self.criteria.min_odds
        )?;
        writeln!(out)?;

        if self.opportunities.is_empty() {
            writeln!(out, "{}", "No opportunities match these criteria.".yellow())?;
        }
        for (rank, o) in self.opportunities.iter().enumerate() {
            writeln!(
                out,
                "{:>2}. {} {} {} ({}) {}  {}–{}%",
                rank + 1,
                o.jurisdiction.bold(),
                o.species,
                o.unit_name,
                o.unit,
                o.hunt_type,
                odds_colored(o.odds),
                o.max_odds
            )?;
            writeln!(
                out,
                "    quality {} · access {} · min points {}{}",
                o.quality,
                o.access,
                o.min_points,
                o.trend
                    .as_deref()
                    .map(|t| format!(" · trend {t}"))
                    .unwrap_or_default()
            )?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "Found {} · average odds {:.1}%",
            self.summary.count, self.summary.average_odds
        )?;
        writeln!(out, "💡 {}", self.summary.tip)?;
        writeln!(out)?;
        writeln!(out, "{}", self.meta.footer().dimmed())?;
        Ok(())
    }

    fn markdown(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "# Strategic Opportunities\n")?;
        writeln!(
            out,
            "**{}** ({}): {}\n",
            self.profile.name, self.profile.strategy, self.profile.description
        )?;
        writeln!(
            out,
            "| # | Jurisdiction | Species | Unit | Hunt type | Odds | Max | Quality | Min points |"
        )?;
        writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
        for (rank, o) in self.opportunities.iter().enumerate() {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {}% | {}% | {} | {} |",
                rank + 1,
                o.jurisdiction,
                o.species,
                o.unit_name,
                o.hunt_type,
                o.odds,
                o.max_odds,
                o.quality,
                o.min_points
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "- **Found**: {}\n- **Average odds**: {:.1}%\n- **Tip**: {}\n",
            self.summary.count, self.summary.average_odds, self.summary.tip
        )?;
        writeln!(out, "_{}_", self.meta.footer())?;
        Ok(())
    }

    fn csv(&self, out: &mut dyn Write) -> Result<()> {
        csv_row(
            out,
            &[
                "rank",
                "jurisdiction",
                "species",
                "unit",
                "unit_name",
                "hunt_type",
                "odds",
                "max_odds",
                "min_points",
                "quality",
                "access",
            ],
        )?;
        for (rank, o) in self.opportunities.iter().enumerate() {
            csv_row(
                out,
                &[
                    &(rank + 1).to_string(),
                    &o.jurisdiction,
                    &o.species,
                    &o.unit,
                    &o.unit_name,
                    &o.hunt_type,
                    &o.odds.to_string(),
                    &o.max_odds.to_string(),
                    &o.min_points.to_string(),
                    o.quality.label(),
                    o.access.label(),
                ],
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CombinedReport {
    pub meta: ReportMeta,
    pub odds: Vec<u8>,
    pub combined: u8,
}

impl Report for CombinedReport {
    fn console(&self, out: &mut dyn Write) -> Result<()> {
        let listed: Vec<String> = self.odds.iter().map(|o| format!("{o}%")).collect();
        writeln!(out, "Applications: {}", listed.join(", "))?;
        writeln!(
            out,
            "Chance of drawing at least one: {}",
            odds_colored(self.combined)
        )?;
        Ok(())
    }

    fn markdown(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "# Combined Odds\n")?;
        for (i, odds) in self.odds.iter().enumerate() {
            writeln!(out, "- Application {}: {odds}%", i + 1)?;
        }
        writeln!(out, "\n**At least one draw**: {}%", self.combined)?;
        Ok(())
    }

    fn csv(&self, out: &mut dyn Write) -> Result<()> {
        csv_row(out, &["application", "odds"])?;
        for (i, odds) in self.odds.iter().enumerate() {
            csv_row(out, &[&(i + 1).to_string(), &odds.to_string()])?;
        }
        csv_row(out, &["combined", &self.combined.to_string()])
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationOutput {
    pub meta: ReportMeta,
    pub report: ValidationReport,
}

impl Report for ValidationOutput {
    fn console(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{}", "🔍 Dataset Validation".bright_cyan().bold())?;
        writeln!(out, "{}", "=====================".cyan())?;
        let structural = self.report.issues_of(IssueKind::Structural).count();
        let quality = self.report.issues_of(IssueKind::Quality).count();
        if self.report.is_clean() {
            writeln!(out, "{}", "✅ No issues found".green())?;
        } else {
            writeln!(
                out,
                "Structural: {}  Quality: {}",
                structural.to_string().red(),
                quality.to_string().yellow()
            )?;
            for issue in &self.report.issues {
                let label = match issue.kind {
                    IssueKind::Structural => "❌".normal(),
                    IssueKind::Quality => "⚠️ ".normal(),
                };
                writeln!(out, "{label} {issue}")?;
            }
        }
        writeln!(out)?;
        writeln!(out, "{}", self.meta.footer().dimmed())?;
        Ok(())
    }

    fn markdown(&self, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "# Dataset Validation\n")?;
        if self.report.is_clean() {
            writeln!(out, "_No issues found._\n")?;
        }
        for issue in &self.report.issues {
            writeln!(out, "- **{:?}** `{}`: {}", issue.kind, issue.location, issue.message)?;
        }
        writeln!(out, "\n_{}_", self.meta.footer())?;
        Ok(())
    }

    fn csv(&self, out: &mut dyn Write) -> Result<()> {
        csv_row(out, &["kind", "location", "message"])?;
        for issue in &self.report.issues {
            let kind = match issue.kind {
                IssueKind::Structural => "structural",
                IssueKind::Quality => "quality",
            };
            csv_row(out, &[kind, &issue.location, &issue.message])?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ListedUnit {
    pub id: String,
    pub name: String,
    pub quality: Quality,
    pub access: Access,
}

#[derive(Debug, Serialize)]
pub struct ListedSpecies {
    pub id: String,
    pub hunt_types: Vec<String>,
    pub units: Vec<ListedUnit>,
}

#[derive(Debug, Serialize)]
pub struct ListedJurisdiction {
    pub id: String,
    pub name: String,
    pub species: Vec<ListedSpecies>,
}

#[derive(Debug, Serialize)]
pub struct ListReport {
    pub meta: ReportMeta,
    pub jurisdictions: Vec<ListedJurisdiction>,
}

impl ListReport {
    pub fn build(data: &ReferenceData, jurisdiction: Option<&str>, species: Option<&str>) -> Self {
        let jurisdictions = data
            .jurisdictions()
            .filter(|j| jurisdiction.is_none_or(|wanted| j.id == wanted))
            .map(|j| ListedJurisdiction {
                id: j.id.clone(),
                name: j.name.clone(),
                species: j
                    .species
                    .iter()
                    .filter(|(id, _)| species.is_none_or(|wanted| id.as_str() == wanted))
                    .map(|(id, profile)| ListedSpecies {
                        id: id.clone(),
                        hunt_types: profile.hunt_types.iter().cloned().collect(),
                        units: profile
                            .units
                            .iter()
                            .map(|(unit, info)| ListedUnit {
                                id: unit.clone(),
                                name: info.name.clone(),
                                quality: info.quality,
                                access: info.access,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            meta: ReportMeta::new(data),
            jurisdictions,
        }
    }
}

impl Report for ListReport {
    fn console(&self, out: &mut dyn Write) -> Result<()> {
        for j in &self.jurisdictions {
            writeln!(out, "{} ({})", j.name.bright_cyan().bold(), j.id)?;
            for sp in &j.species {
                writeln!(out, "  {} [{}]", sp.id.bold(), sp.hunt_types.join(", "))?;
                for unit in &sp.units {
                    writeln!(
                        out,
                        "    {:<12} {:<20} {:<9} {}",
                        unit.id, unit.name, unit.quality, unit.access
                    )?;
                }
            }
        }
        Ok(())
    }

    fn markdown(&self, out: &mut dyn Write) -> Result<()> {
        for j in &self.jurisdictions {
            writeln!(out, "## {} (`{}`)\n", j.name, j.id)?;
            for sp in &j.species {
                writeln!(out, "### {}\n", sp.id)?;
                writeln!(out, "Hunt types: {}\n", sp.hunt_types.join(", "))?;
                writeln!(out, "| Unit | Name | Quality | Access |")?;
                writeln!(out, "|---|---|---|---|")?;
                for unit in &sp.units {
                    writeln!(
                        out,
                        "| `{}` | {} | {} | {} |",
                        unit.id, unit.name, unit.quality, unit.access
                    )?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }

    fn csv(&self, out: &mut dyn Write) -> Result<()> {
        csv_row(
            out,
            &["jurisdiction", "species", "unit", "name", "quality", "access", "hunt_types"],
        )?;
        for j in &self.jurisdictions {
            for sp in &j.species {
                let hunt_types = sp.hunt_types.join(";");
                for unit in &sp.units {
                    csv_row(
                        out,
                        &[
                            &j.id,
                            &sp.id,
                            &unit.id,
                            &unit.name,
                            unit.quality.label(),
                            unit.access.label(),
                            &hunt_types,
                        ],
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawodds_core::{BundledLoader, DataLoader, validate_reference};

    fn rendered<R: Report>(report: &R, format: ReportFormat) -> String {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        render(report, format, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn csv_fields_are_quoted_when_needed() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("320\""), "\"320\"\"\"");
    }

    #[test]
    fn bars_scale_with_odds() {
        assert_eq!(bar(0), "");
        assert_eq!(bar(100).chars().count(), BAR_WIDTH);
        assert_eq!(bar(50).chars().count(), BAR_WIDTH / 2);
    }

    #[test]
    fn list_report_filters_and_renders_every_format() {
        let data = BundledLoader.load_reference_data().unwrap();
        let report = ListReport::build(&data, Some("wyoming"), Some("antelope"));
        assert_eq!(report.jurisdictions.len(), 1);
        assert_eq!(report.jurisdictions[0].species.len(), 1);

        let csv = rendered(&report, ReportFormat::Csv);
        assert_eq!(csv.lines().count(), 5);
        assert!(csv.contains("wyoming,antelope,area19,Area 19,Good,Good,archery;rifle"));

        let json = rendered(&report, ReportFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["jurisdictions"][0]["id"], "wyoming");
        assert_eq!(value["meta"]["dataset"].as_str().unwrap().len(), 16);

        assert!(rendered(&report, ReportFormat::Markdown).contains("## Wyoming"));
        let console = rendered(&report, ReportFormat::Console);
        let row = console
            .lines()
            .find(|line| line.trim_start().starts_with("area19"))
            .unwrap();
        assert_eq!(row, format!("    {:<12} {:<20} {:<9} Good", "area19", "Area 19", "Good"));
        assert_eq!(row.find("Good"), Some(4 + 13 + 21));
    }

    #[test]
    fn validation_output_lists_issues() {
        let data = BundledLoader.load_reference_data().unwrap();
        let output = ValidationOutput {
            meta: ReportMeta::new(&data),
            report: validate_reference(&data),
        };
        assert!(rendered(&output, ReportFormat::Console).contains("No issues found"));
        assert_eq!(rendered(&output, ReportFormat::Csv).lines().count(), 1);
    }

    #[test]
    fn combined_report_renders_total() {
        let data = BundledLoader.load_reference_data().unwrap();
        let report = CombinedReport {
            meta: ReportMeta::new(&data),
            odds: vec![50, 50],
            combined: 75,
        };
        assert!(rendered(&report, ReportFormat::Console).contains("75%"));
        assert!(rendered(&report, ReportFormat::Csv).ends_with("combined,75\n"));
    }
}
