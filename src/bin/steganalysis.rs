//! # Steganalysis Binary Entry Point
//!
//! Runs the LSB balance test and the pairs-of-values test on one or more
//! images and prints the results.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin steganalysis -- -i input.png -i output.png
//! cargo run --bin steganalysis -- -i sweep/encrypted_rt=0.5.png --json report.json
//! ```

use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use lsb_stego::analysis::report::{analyze, export_to_json};
use lsb_stego::common::config::StegoConfig;
use lsb_stego::common::logging::init_logger;
use lsb_stego::processing::{load_grid, ColorMode};

/// Command-line arguments for the steganalysis binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Images to analyse (repeatable)
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// Write all reports to this JSON file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Overrides `analysis.balance_alpha` from the config
    #[arg(long)]
    alpha: Option<f64>,

    /// Overrides `analysis.pov_suspect_threshold` from the config
    #[arg(long)]
    suspect_threshold: Option<f64>,

    /// Path to a configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    let mut config = StegoConfig::load_or_default(args.config.as_deref())?;
    if let Some(alpha) = args.alpha {
        config.analysis.balance_alpha = alpha;
    }
    if let Some(threshold) = args.suspect_threshold {
        config.analysis.pov_suspect_threshold = threshold;
    }
    config.validate()?;

    let mut reports = Vec::with_capacity(args.input.len());
    for path in &args.input {
        let grid = load_grid(path, ColorMode::Rgb)?;
        let report = analyze(&grid, path.display().to_string(), &config.analysis);
        println!("{}\n", report);
        info!(
            "{}: {}",
            path.display(),
            if report.suspicious() {
                "flagged"
            } else {
                "clean"
            }
        );
        reports.push(report);
    }

    if let Some(json) = args.json {
        export_to_json(&reports, &json)
            .with_context(|| format!("writing {}", json.display()))?;
        println!("Reports exported to: {}", json.display());
    }

    Ok(())
}
