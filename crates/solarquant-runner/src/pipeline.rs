//! Pipeline stages behind the CLI commands.
//!
//! - `fetch`: download inputs into a data directory + `inputs_manifest.json`
//! - `build`: data directory → `dataset.csv`
//! - `study`: `dataset.csv` → `report.json` / `report.txt`
//! - `run`: build + study into `runs/<run_id>/` with `run_manifest.json`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use solarquant_data::prices::write_daily_csv;
use solarquant_data::silso::{self, SILSO_SN_MONTHLY_FILE};
use solarquant_data::{
    DirectorySource, HttpSource, MarketDataSource, daily_file_name, parse_silso_monthly,
};
use solarquant_eval::{StudyReport, run_study};
use solarquant_features::{DatasetSummary, MonthlyDataset, StudyWindow, build_from_source};
use solarquant_models::{DatasetRecord, MonthlyRow};
use tracing::info;

use crate::config::StudyConfig;
use crate::manifest_io::{persist_manifest, sha256_hex, write_atomic, write_sha256_sidecar};
use crate::run_manifest::{
    InputBinding, RUN_MANIFEST_SCHEMA_VERSION, RunManifest, bind_output, derive_run_id,
    git_commit_string, hash_file, persist_run_manifest_atomic,
};

pub const INPUTS_MANIFEST_STEM: &str = "inputs_manifest";
pub const DATASET_FILE: &str = "dataset.csv";
pub const DATASET_SUMMARY_FILE: &str = "dataset_summary.json";
pub const REPORT_JSON_FILE: &str = "report.json";
pub const REPORT_TEXT_FILE: &str = "report.txt";

const BINARY_NAME: &str = "solarquant";

// =============================================================================
// Inputs
// =============================================================================

/// Hash binding of the files in a data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputsManifest {
    pub schema_version: u32,
    pub market_symbol: String,
    pub risk_free_symbol: String,
    pub window: StudyWindow,
    pub files: Vec<InputBinding>,
}

impl InputsManifest {
    /// SHA-256 of the compact JSON form (what `inputs_manifest.sha256` holds).
    pub fn sha256(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self).context("Failed to serialize inputs manifest")?;
        Ok(sha256_hex(&bytes))
    }
}

/// Hash the three input files of `data_dir`.
pub fn bind_inputs(cfg: &StudyConfig, data_dir: &Path) -> Result<InputsManifest> {
    let files = [
        ("market", daily_file_name(&cfg.symbols.market)),
        ("risk_free", daily_file_name(&cfg.symbols.risk_free)),
        ("sunspots", SILSO_SN_MONTHLY_FILE.to_string()),
    ]
    .into_iter()
    .map(|(label, rel_path)| {
        let (sha256, bytes_len) = hash_file(&data_dir.join(&rel_path))?;
        Ok(InputBinding {
            label: label.to_string(),
            rel_path,
            sha256,
            bytes_len,
        })
    })
    .collect::<Result<Vec<_>>>()?;

    Ok(InputsManifest {
        schema_version: 1,
        market_symbol: cfg.symbols.market.clone(),
        risk_free_symbol: cfg.symbols.risk_free.clone(),
        window: cfg.study_window()?,
        files,
    })
}

// =============================================================================
// fetch
// =============================================================================

/// Download inputs over HTTP into `data_dir`.
pub fn fetch(cfg: &StudyConfig, data_dir: &Path) -> Result<InputsManifest> {
    let source = HttpSource::new(cfg.sources.http_config()).context("Failed to create HTTP client")?;
    fetch_from(&source, cfg, data_dir)
}

/// Copy inputs from any source into `data_dir` and bind them.
pub fn fetch_from(
    source: &dyn MarketDataSource,
    cfg: &StudyConfig,
    data_dir: &Path,
) -> Result<InputsManifest> {
    let window = cfg.study_window()?;

    for symbol in [&cfg.symbols.market, &cfg.symbols.risk_free] {
        let obs = source
            .daily_adj_close(symbol, window.start_date, window.end_date)
            .with_context(|| format!("Failed to download {}", symbol))?;
        if obs.is_empty() {
            bail!(
                "Failed to download {}: no observations between {} and {}",
                symbol,
                window.start_date,
                window.end_date
            );
        }
        let mut buf = Vec::new();
        write_daily_csv(&mut buf, &obs)?;
        let path = data_dir.join(daily_file_name(symbol));
        write_atomic(&path, &buf)?;
        info!(symbol = %symbol, rows = obs.len(), path = %path.display(), "Saved daily series");
    }

    let text = source
        .sunspot_monthly_text()
        .context("Failed to download sunspot file")?;
    let records = parse_silso_monthly(&text).context("Downloaded sunspot file is malformed")?;
    let summary = silso::summarize(&records);
    info!(
        records = summary.records,
        first = ?summary.first_month.map(|m| m.to_string()),
        last = ?summary.last_month.map(|m| m.to_string()),
        missing_values = summary.missing_values,
        "Saved sunspot file"
    );
    write_atomic(&data_dir.join(SILSO_SN_MONTHLY_FILE), text.as_bytes())?;

    let manifest = bind_inputs(cfg, data_dir)?;
    let persisted = persist_manifest(data_dir, INPUTS_MANIFEST_STEM, &manifest)?;
    info!(sha256 = %persisted.sha256, "Wrote inputs manifest");
    Ok(manifest)
}

// =============================================================================
// build
// =============================================================================

/// Build the monthly dataset from `data_dir` and write it to `out_path`.
pub fn build(cfg: &StudyConfig, data_dir: &Path, out_path: &Path) -> Result<MonthlyDataset> {
    if !data_dir.is_dir() {
        bail!(
            "Data directory {} does not exist (run `solarquant fetch` first)",
            data_dir.display()
        );
    }
    let source = DirectorySource::new(data_dir);
    let window = cfg.study_window()?;
    let dataset = build_from_source(
        &source,
        &cfg.symbols.market,
        &cfg.symbols.risk_free,
        &window,
        &cfg.features,
    )
    .with_context(|| format!("Failed to build dataset from {}", data_dir.display()))?;

    write_dataset_csv(out_path, &dataset.rows)?;
    let summary_path = out_path.with_file_name(DATASET_SUMMARY_FILE);
    write_atomic(
        &summary_path,
        &serde_json::to_vec_pretty(&dataset.summary).context("Failed to serialize dataset summary")?,
    )?;
    info!(path = %out_path.display(), rows = dataset.rows.len(), "Wrote dataset");
    Ok(dataset)
}

pub fn write_dataset_csv(path: &Path, rows: &[MonthlyRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in rows {
        wtr.serialize(DatasetRecord::from(row))
            .context("Failed to serialize dataset row")?;
    }
    let bytes = wtr.into_inner().context("Failed to flush dataset CSV")?;
    write_atomic(path, &bytes)
}

pub fn read_dataset_csv(path: &Path) -> Result<Vec<MonthlyRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open dataset: {}", path.display()))?;
    rdr.deserialize::<DatasetRecord>()
        .enumerate()
        .map(|(idx, rec)| {
            rec.map(MonthlyRow::from)
                .with_context(|| format!("Bad dataset row {} in {}", idx + 2, path.display()))
        })
        .collect()
}

pub fn read_dataset_summary(path: &Path) -> Result<DatasetSummary> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}

// =============================================================================
// study
// =============================================================================

/// Paths of the written report pair.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub json: PathBuf,
    pub text: PathBuf,
}

/// Fit the model grid on `rows`.
pub fn study_rows(cfg: &StudyConfig, rows: &[MonthlyRow]) -> Result<StudyReport> {
    let regression = cfg.regression.to_regression_config()?;
    let outcome = run_study(rows, &regression);
    let report = StudyReport::build(cfg.study_hash()?, rows, outcome)
        .context("Failed to build study report")?;
    if report.models.is_empty() {
        bail!("No model could be estimated ({} skipped)", report.skipped.len());
    }
    Ok(report)
}

pub fn write_report(report: &StudyReport, out_dir: &Path) -> Result<ReportFiles> {
    let json = out_dir.join(REPORT_JSON_FILE);
    let text = out_dir.join(REPORT_TEXT_FILE);
    write_atomic(&json, report.to_json()?.as_bytes())?;
    write_atomic(&text, report.to_text_summary().as_bytes())?;
    Ok(ReportFiles { json, text })
}

/// Run the study on a dataset CSV and write the report pair into `out_dir`.
pub fn study(cfg: &StudyConfig, dataset_path: &Path, out_dir: &Path) -> Result<StudyReport> {
    if !dataset_path.is_file() {
        bail!(
            "Dataset {} does not exist (run `solarquant build` first)",
            dataset_path.display()
        );
    }
    let rows = read_dataset_csv(dataset_path)?;
    let report = study_rows(cfg, &rows)?;
    let files = write_report(&report, out_dir)?;
    info!(
        path = %files.json.display(),
        models = report.models.len(),
        skipped = report.skipped.len(),
        digest = %report.digest,
        "Wrote study report"
    );
    Ok(report)
}

// =============================================================================
// run
// =============================================================================

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub manifest: RunManifest,
    pub manifest_sha256: String,
    pub report: StudyReport,
}

/// Build + study into `runs_dir/<run_id>/`.
pub fn run(cfg: &StudyConfig, data_dir: &Path, runs_dir: &Path) -> Result<RunOutcome> {
    let inputs = bind_inputs(cfg, data_dir)
        .with_context(|| format!("Missing inputs in {}", data_dir.display()))?;
    let inputs_sha256 = inputs.sha256()?;
    let config_sha256 = cfg.study_hash()?;
    let run_id = derive_run_id(&inputs_sha256, &config_sha256);
    let run_dir = runs_dir.join(&run_id);
    info!(run_id = %run_id, run_dir = %run_dir.display(), "Starting run");

    let dataset_path = run_dir.join(DATASET_FILE);
    build(cfg, data_dir, &dataset_path)?;
    // Study what was written, so the run is reproducible from the CSV alone.
    let rows = read_dataset_csv(&dataset_path)?;
    let report = study_rows(cfg, &rows)?;
    write_report(&report, &run_dir)?;

    let inputs_path = run_dir.join(format!("{}.json", INPUTS_MANIFEST_STEM));
    let inputs_bytes = serde_json::to_vec(&inputs).context("Failed to serialize inputs manifest")?;
    write_atomic(&inputs_path, &inputs_bytes)?;
    write_sha256_sidecar(&inputs_path, &inputs_sha256)?;

    let config_path = run_dir.join("config.json");
    write_atomic(
        &config_path,
        &serde_json::to_vec_pretty(cfg).context("Failed to serialize config")?,
    )?;

    let outputs = [
        ("dataset", DATASET_FILE),
        ("dataset_summary", DATASET_SUMMARY_FILE),
        ("report_json", REPORT_JSON_FILE),
        ("report_txt", REPORT_TEXT_FILE),
        ("resolved_config", "config.json"),
    ]
    .into_iter()
    .map(|(label, rel)| bind_output(label, rel, &run_dir))
    .collect::<Result<Vec<_>>>()?;

    let manifest = RunManifest {
        schema_version: RUN_MANIFEST_SCHEMA_VERSION,
        binary_name: BINARY_NAME.to_string(),
        git_commit: git_commit_string(),
        run_id: run_id.clone(),
        data_dir: data_dir.display().to_string(),
        inputs_sha256,
        inputs: inputs.files.clone(),
        config_sha256,
        report_digest: report.digest.clone(),
        outputs,
    };
    let manifest_sha256 = persist_run_manifest_atomic(&run_dir, &manifest)?;
    info!(run_id = %run_id, manifest_sha256 = %manifest_sha256, "Run complete");

    Ok(RunOutcome {
        run_id,
        run_dir,
        manifest,
        manifest_sha256,
        report,
    })
}
