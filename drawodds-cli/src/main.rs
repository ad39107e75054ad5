mod reports;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use thiserror::Error;

use drawodds_core::{
    ConfigError, DataError, DataLoader, DrawEngine, EngineConfig, ReferenceData, Residency,
    Strategy, StrategyCriteria, combined_odds, hunt_type_display_name, parse_points, summarize,
    validate_reference,
};
use reports::{
    CombinedReport, ListReport, OddsReport, OpportunitiesReport, ReportFormat, ReportMeta,
    ValidationOutput, render,
};
use util::{identifier, identifier_list, parse_percent, parse_percent_list};

#[derive(Debug, Parser)]
#[command(name = "drawodds", version = "0.1.0")]
#[command(about = "Hunting draw odds: lookups, strategy scans and dataset checks")]
struct Args {
    /// Reference dataset JSON (defaults to the bundled dataset)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Engine configuration JSON (defaults to built-in tuning)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console, global = true)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Draw odds, statistics and advice for one hunt
    Odds {
        #[arg(long)]
        jurisdiction: String,
        #[arg(long)]
        species: String,
        #[arg(long)]
        unit: String,
        #[arg(long)]
        hunt_type: String,
        /// resident or nonresident
        #[arg(long, default_value = "resident")]
        residency: Residency,
        /// Preference points held
        #[arg(long, value_parser = parse_points, allow_hyphen_values = true)]
        points: u32,
    },
    /// Rank hunts across jurisdictions and species under a strategy
    Opportunities {
        /// Jurisdictions to scan (comma-separated)
        #[arg(long)]
        jurisdictions: String,
        /// Species to scan (comma-separated)
        #[arg(long)]
        species: String,
        /// Restrict to these hunt types (comma-separated)
        #[arg(long)]
        hunt_types: Option<String>,
        #[arg(long, value_parser = parse_points, allow_hyphen_values = true)]
        points: u32,
        /// Minimum acceptable odds, in percent
        #[arg(long, value_parser = parse_percent, default_value = "0")]
        min_odds: u8,
        /// conservative, balanced, aggressive or points-builder
        #[arg(long, default_value = "balanced")]
        strategy: Strategy,
    },
    /// Chance of drawing at least one of several independent applications
    Combined {
        /// Per-application odds in percent (comma-separated)
        #[arg(long, allow_hyphen_values = true)]
        odds: String,
    },
    /// Check the reference dataset for structural and quality issues
    Validate,
    /// List jurisdictions, species, hunt types and units
    List {
        #[arg(long)]
        jurisdiction: Option<String>,
        #[arg(long)]
        species: Option<String>,
    },
}

#[derive(Debug, Error)]
enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reads the dataset and configuration from disk, falling back to the
/// bundled dataset and default tuning when no path is given.
#[derive(Debug, Clone, Default)]
struct FsLoader {
    data: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl DataLoader for FsLoader {
    type Error = LoadError;

    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error> {
        match &self.data {
            Some(path) => {
                log::debug!("loading reference data from {}", path.display());
                Ok(ReferenceData::from_json(&read(path)?)?)
            }
            None => Ok(ReferenceData::load_from_static()?),
        }
    }

    fn load_engine_config(&self) -> Result<EngineConfig, Self::Error> {
        match &self.config {
            Some(path) => {
                log::debug!("loading engine config from {}", path.display());
                Ok(EngineConfig::from_json(&read(path)?)?)
            }
            None => Ok(EngineConfig::default()),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let loader = FsLoader {
        data: args.data.clone(),
        config: args.config.clone(),
    };
    let mut sink = ReportSink::open(args.output.as_deref())?;

    let passed = match &args.command {
        Command::Validate => run_validate(&args, &loader, &mut sink.out)?,
        command => {
            let engine = DrawEngine::from_loader(&loader).context("failed to load draw engine")?;
            run_command(&args, command, &engine, &mut sink.out)?;
            true
        }
    };
    sink.finish()?;

    if !passed {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run_command(
    args: &Args,
    command: &Command,
    engine: &DrawEngine,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Command::Odds {
            jurisdiction,
            species,
            unit,
            hunt_type,
            residency,
            points,
        } => {
            let report = odds_report(
                engine,
                &identifier("jurisdiction", jurisdiction)?,
                &identifier("species", species)?,
                &identifier("unit", unit)?,
                &identifier("hunt-type", hunt_type)?,
                *residency,
                *points,
            )?;
            render(&report, args.report, out)
        }
        Command::Opportunities {
            jurisdictions,
            species,
            hunt_types,
            points,
            min_odds,
            strategy,
        } => {
            let criteria = StrategyCriteria {
                jurisdictions: identifier_list("jurisdictions", jurisdictions)?,
                species: identifier_list("species", species)?,
                hunt_types: match hunt_types {
                    Some(list) => identifier_list("hunt-types", list)?,
                    None => Vec::new(),
                },
                min_odds: *min_odds,
                points: *points,
            };
            let report = opportunities_report(engine, criteria, *strategy)?;
            render(&report, args.report, out)
        }
        Command::Combined { odds } => {
            let odds = parse_percent_list(odds)?;
            if odds.is_empty() {
                bail!("--odds needs at least one percentage");
            }
            let report = CombinedReport {
                meta: ReportMeta::new(engine.data()),
                combined: combined_odds(&odds),
                odds,
            };
            render(&report, args.report, out)
        }
        Command::List {
            jurisdiction,
            species,
        } => {
            let jurisdiction = jurisdiction
                .as_deref()
                .map(|j| identifier("jurisdiction", j))
                .transpose()?;
            let species = species
                .as_deref()
                .map(|s| identifier("species", s))
                .transpose()?;
            if let Some(j) = &jurisdiction
                && engine.data().jurisdiction(j).is_none()
            {
                bail!("unknown jurisdiction `{j}`");
            }
            let report =
                ListReport::build(engine.data(), jurisdiction.as_deref(), species.as_deref());
            render(&report, args.report, out)
        }
        Command::Validate => bail!("validate runs against the raw dataset, not a loaded engine"),
    }
}

fn odds_report(
    engine: &DrawEngine,
    jurisdiction: &str,
    species: &str,
    unit: &str,
    hunt_type: &str,
    residency: Residency,
    points: u32,
) -> Result<OddsReport> {
    let query = engine.query(jurisdiction, species, unit, hunt_type, residency, points)?;
    let analyzer = drawodds_core::select_analyzer(engine, None)?;
    let analysis = analyzer.analyze(&query)?;
    if analysis.odds.is_none() {
        log::info!("no odds history for {}", query.odds_key());
    }

    let data = engine.data();
    let jurisdiction_name = data
        .jurisdiction(&query.jurisdiction)
        .map_or_else(|| query.jurisdiction.clone(), |j| j.name.clone());
    let unit_name = data
        .unit_info(&query.jurisdiction, &query.species, &query.unit)
        .map_or_else(|| query.unit.clone(), |u| u.name.clone());

    Ok(OddsReport {
        meta: ReportMeta::new(data),
        jurisdiction_name,
        unit_name,
        hunt_type_name: hunt_type_display_name(&query.hunt_type).to_string(),
        stats: engine.hunt_stats(&query).cloned(),
        application: engine.application_info(&query.jurisdiction).cloned(),
        chart: engine.chart(&query),
        analysis,
        query,
    })
}

fn opportunities_report(
    engine: &DrawEngine,
    criteria: StrategyCriteria,
    strategy: Strategy,
) -> Result<OpportunitiesReport> {
    let analyzer = drawodds_core::select_analyzer(engine, None)?;
    let opportunities = analyzer.opportunities(&criteria, strategy)?;
    Ok(OpportunitiesReport {
        meta: ReportMeta::new(engine.data()),
        profile: strategy.profile(),
        summary: summarize(&opportunities, strategy),
        criteria,
        opportunities,
    })
}

/// Runs the validator over the raw dataset. Returns `false` on structural issues.
fn run_validate(args: &Args, loader: &FsLoader, out: &mut dyn Write) -> Result<bool> {
    let data = loader
        .load_reference_data()
        .context("failed to load reference data")?;
    let report = validate_reference(&data);
    let passed = !report.has_structural();
    let output = ValidationOutput {
        meta: ReportMeta::new(&data),
        report,
    };
    render(&output, args.report, out)?;
    Ok(passed)
}

/// Destination of a rendered report. Writing to `--output` turns colors off
/// so files never carry terminal escapes.
struct ReportSink {
    out: BufWriter<Box<dyn Write>>,
    path: Option<PathBuf>,
}

impl ReportSink {
    fn open(path: Option<&Path>) -> Result<Self> {
        let target: Box<dyn Write> = match path {
            Some(path) => {
                colored::control::set_override(false);
                let file = File::create(path)
                    .with_context(|| format!("failed to create report file {}", path.display()))?;
                Box::new(file)
            }
            None => Box::new(stdout()),
        };
        Ok(Self {
            out: BufWriter::new(target),
            path: path.map(Path::to_path_buf),
        })
    }

    fn finish(mut self) -> Result<()> {
        self.out.flush().context("failed to flush report")?;
        if let Some(path) = &self.path {
            log::info!("report written to {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn odds_subcommand_parses_residency_and_points() {
        let args = Args::try_parse_from([
            "drawodds", "odds", "--jurisdiction", "utah", "--species", "elk", "--unit", "cache",
            "--hunt-type", "archery", "--residency", "non-resident", "--points", "5",
        ])
        .unwrap();
        match args.command {
            Command::Odds {
                residency, points, ..
            } => {
                assert_eq!(residency, Residency::Nonresident);
                assert_eq!(points, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.report, ReportFormat::Console);
    }

    #[test]
    fn negative_points_and_bad_percent_are_rejected() {
        assert!(
            Args::try_parse_from([
                "drawodds", "odds", "--jurisdiction", "utah", "--species", "elk", "--unit",
                "cache", "--hunt-type", "archery", "--points", "-3",
            ])
            .is_err()
        );
        assert!(
            Args::try_parse_from([
                "drawodds", "opportunities", "--jurisdictions", "utah", "--species", "elk",
                "--points", "3", "--min-odds", "120",
            ])
            .is_err()
        );
    }

    #[test]
    fn odds_report_without_history_keeps_context() {
        let engine = DrawEngine::from_loader(&FsLoader::default()).unwrap();
        let report =
            odds_report(&engine, "nevada", "elk", "unit222", "rifle", Residency::Resident, 5)
                .unwrap();
        assert_eq!(report.analysis.odds, None);
        assert!(report.chart.is_empty());
        assert_eq!(report.jurisdiction_name, "Nevada");
        assert_eq!(report.unit_name, "Unit 222");
        assert!(report.application.is_some());
    }

    #[test]
    fn missing_files_surface_their_path() {
        let loader = FsLoader {
            data: Some(PathBuf::from("/nonexistent/reference.json")),
            config: None,
        };
        let err = loader.load_reference_data().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/reference.json"));
    }
}
