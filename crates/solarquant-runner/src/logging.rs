//! # Logging
//!
//! ## Logging Architecture
//! - **stdout**: WARN by default, INFO with `--verbose`. Ignores RUST_LOG.
//! - **file**: INFO for solarquant crates, WARN for deps (daily rotation)
//! - **RUST_LOG**: Honored for file logs only

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "solarquant.log";
const DEFAULT_FILE_FILTER: &str = "solarquant=info,warn";

/// Guards that must be held for the lifetime of the process.
/// Dropping this will cause buffered logs to be lost.
pub struct TracingGuards {
    _file_guard: WorkerGuard,
}

/// Initializes tracing with a bounded stdout layer and a rotated file layer.
pub fn init_tracing(log_dir: &Path, verbose: bool) -> Result<TracingGuards> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let stdout_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILE_FILTER));

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_filter(stdout_level);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        log_dir = %log_dir.display(),
        verbose,
        "Logging initialized"
    );

    Ok(TracingGuards {
        _file_guard: file_guard,
    })
}
