//! Command-line driver for spacing-threshold inference.
//!
//! Usage:
//!     spacing-thresholds --observations obs.csv --levels levels.csv --output thresholds.csv
//!     spacing-thresholds --observations obs.csv --min-per-level 800 --definitions conflict_1,conflict_2
//!     spacing-thresholds --demo --curves curves.csv
//!
//! Writes the threshold table to `--output` (stdout when omitted). Exits
//! non-zero on malformed input or when no definition produced thresholds.

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Parser;

use spacing_thresholds::io::{
    read_observations_path, read_speed_levels_path, write_curves_path, write_thresholds,
    write_thresholds_path, ObservationTable,
};
use spacing_thresholds::synthetic::{generate_labeled, SyntheticConfig};
use spacing_thresholds::{
    derive_levels, BinningConfig, InferenceConfig, LoggingReporter, SpacingPipeline, SpeedLevels,
};

// =============================================================================
// CLI Arguments
// =============================================================================

#[derive(Parser)]
#[command(name = "spacing-thresholds")]
#[command(version, about = "Infer car-following conflict spacing thresholds per closing speed")]
struct Args {
    /// Observation CSV (spacing, relative_speed, absolute_speed, conflict_*)
    #[arg(long, required_unless_present = "demo")]
    observations: Option<PathBuf>,

    /// Representative speed levels CSV (speed_level column)
    #[arg(long, conflicts_with = "min_per_level")]
    levels: Option<PathBuf>,

    /// Derive levels with this minimum population per level
    #[arg(long)]
    min_per_level: Option<usize>,

    /// Conflict columns to process (default: every conflict_* column)
    #[arg(long, value_delimiter = ',')]
    definitions: Vec<String>,

    /// JSON inference configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Threshold table output (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write per-bin missed-detection / false-alarm curves here
    #[arg(long)]
    curves: Option<PathBuf>,

    /// Run on synthetic car-following data labeled by the rule tables
    #[arg(long)]
    demo: bool,

    /// Seed for --demo
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Log every solved threshold
    #[arg(short, long)]
    verbose: bool,
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match &args.config {
        Some(path) => InferenceConfig::load(path)?,
        None => InferenceConfig::default(),
    };

    let table = if args.demo {
        let (observations, definitions) = generate_labeled(&SyntheticConfig::default(), args.seed)?;
        log::info!("Generated {} synthetic observations (seed {})", observations.len(), args.seed);
        ObservationTable {
            observations,
            definitions,
        }
    } else {
        let path = args
            .observations
            .as_ref()
            .ok_or("--observations is required without --demo")?;
        let table = read_observations_path(path)?;
        log::info!("Read {} observations from {}", table.observations.len(), path.display());
        table
    };
    let definitions = table.select(&args.definitions)?;

    let levels = match &args.levels {
        Some(path) => read_speed_levels_path(path)?,
        None => derived_levels(&table, args.min_per_level)?,
    };
    log::info!("Using {} speed levels", levels.len());

    let reporter = if args.verbose {
        LoggingReporter::verbose()
    } else {
        LoggingReporter::new()
    };
    let mut pipeline = SpacingPipeline::new(config)
        .with_reporter(reporter)
        .with_curves(args.curves.is_some());
    let output = pipeline.run(&table.observations, &levels, &definitions)?;

    match &args.output {
        Some(path) => write_thresholds_path(path, &output.table)?,
        None => write_thresholds(io::stdout().lock(), &output.table)?,
    }
    if let Some(path) = &args.curves {
        write_curves_path(path, &output.curves)?;
    }

    for failure in &output.failures {
        log::error!("{}: {}", failure.definition, failure.error);
    }
    if output.table.is_empty() && !definitions.is_empty() {
        return Err("no conflict definition produced thresholds".into());
    }
    Ok(())
}

fn derived_levels(table: &ObservationTable, min_per_level: Option<usize>) -> Result<SpeedLevels, Box<dyn Error>> {
    let binning = min_per_level.map_or_else(BinningConfig::default, BinningConfig::new);
    let closing: Vec<_> = table
        .observations
        .iter()
        .filter(|o| o.is_closing())
        .cloned()
        .collect();
    let derived = derive_levels(&closing, &binning)?;
    log::info!(
        "Derived levels with minimum {} per level: {:?}",
        binning.min_per_level,
        derived.outcome
    );
    Ok(derived.levels)
}
