//! # SolarQuant Runner
//!
//! `solarquant` CLI: downloads the study inputs, builds the aligned monthly
//! dataset, fits the regression grid and writes reproducible run directories.
//!
//! ## Commands
//! - `fetch` - Download ^GSPC, ^IRX and the SILSO sunspot file
//! - `build` - Build `dataset.csv` from a data directory
//! - `study` - Fit the model grid on a dataset and write the report
//! - `run` - Build + study into `runs/<run_id>/` with a run manifest

pub mod config;
pub mod logging;
pub mod manifest_io;
pub mod pipeline;
pub mod run_manifest;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{DEFAULT_CONFIG_PATH, StudyConfig};
use crate::pipeline::DATASET_FILE;

#[derive(Parser, Debug)]
#[command(name = "solarquant")]
#[command(about = "SolarQuant - sunspot activity vs. S&P 500 excess returns")]
#[command(version)]
pub struct Cli {
    /// Log INFO to stdout (default: WARN only)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Directory for rotated log files
    #[arg(long, global = true, default_value = "logs")]
    pub log_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download inputs into the data directory
    Fetch {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Overrides output.data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Build the monthly dataset CSV
    Build {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Overrides output.data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Output CSV path (default: <output.out_dir>/dataset.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Fit the regression grid on a dataset CSV
    Study {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Dataset CSV written by `build`
        #[arg(long)]
        dataset: PathBuf,

        /// Report directory (default: output.out_dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build + study into a content-addressed run directory
    Run {
        /// Path to configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Overrides output.data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Overrides output.runs_dir
        #[arg(long)]
        runs_dir: Option<PathBuf>,

        /// Download inputs first
        #[arg(long, default_value_t = false)]
        fetch: bool,
    },
}

/// Main entry point for the CLI.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guards = logging::init_tracing(&cli.log_dir, cli.verbose)?;
    execute(cli.command)
}

fn load_config(path: &Path) -> anyhow::Result<StudyConfig> {
    let cfg = StudyConfig::load_or_default(path)?;
    info!(
        path = %path.display(),
        end_date = %cfg.window.end_date,
        years = cfg.window.years,
        "Loaded config"
    );
    Ok(cfg)
}

pub fn execute(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Fetch { config, data_dir } => {
            let cfg = load_config(&config)?;
            let data_dir = data_dir.unwrap_or_else(|| cfg.output.data_dir.clone());
            let manifest = pipeline::fetch(&cfg, &data_dir)?;
            for f in &manifest.files {
                println!("{}  {} ({} bytes)", f.sha256, f.rel_path, f.bytes_len);
            }
            println!("Inputs saved to {}", data_dir.display());
            Ok(())
        }
        Commands::Build {
            config,
            data_dir,
            out,
        } => {
            let cfg = load_config(&config)?;
            let data_dir = data_dir.unwrap_or_else(|| cfg.output.data_dir.clone());
            let out = out.unwrap_or_else(|| cfg.output.out_dir.join(DATASET_FILE));
            let dataset = pipeline::build(&cfg, &data_dir, &out)?;
            println!(
                "Dataset: {} rows ({} with sunspot features) -> {}",
                dataset.summary.rows,
                dataset.summary.rows_with_sunspot_features,
                out.display()
            );
            Ok(())
        }
        Commands::Study {
            config,
            dataset,
            out,
        } => {
            let cfg = load_config(&config)?;
            let out = out.unwrap_or_else(|| cfg.output.out_dir.clone());
            let report = pipeline::study(&cfg, &dataset, &out)?;
            print!("{}", report.to_text_summary());
            Ok(())
        }
        Commands::Run {
            config,
            data_dir,
            runs_dir,
            fetch,
        } => {
            let cfg = load_config(&config)?;
            let data_dir = data_dir.unwrap_or_else(|| cfg.output.data_dir.clone());
            let runs_dir = runs_dir.unwrap_or_else(|| cfg.output.runs_dir.clone());
            if fetch {
                pipeline::fetch(&cfg, &data_dir)?;
            }
            let outcome = pipeline::run(&cfg, &data_dir, &runs_dir)?;
            print!("{}", outcome.report.to_text_summary());
            println!("Run {} -> {}", outcome.run_id, outcome.run_dir.display());
            Ok(())
        }
    }
}
