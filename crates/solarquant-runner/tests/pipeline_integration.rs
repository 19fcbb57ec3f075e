//! End-to-end pipeline over a synthetic data directory.

use std::fs;
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use solarquant_data::prices::write_daily_csv;
use solarquant_data::silso::SILSO_SN_MONTHLY_FILE;
use solarquant_data::{DirectorySource, daily_file_name};
use solarquant_models::{DailyObservation, MonthKey};
use solarquant_runner::config::{StudyConfig, WindowConfig};
use solarquant_runner::manifest_io::sha256_hex;
use solarquant_runner::pipeline::{
    self, DATASET_FILE, DATASET_SUMMARY_FILE, REPORT_JSON_FILE, REPORT_TEXT_FILE,
};
use solarquant_runner::run_manifest::RunManifest;
use tempfile::tempdir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config() -> StudyConfig {
    StudyConfig {
        window: WindowConfig {
            end_date: d(2010, 12, 31),
            years: 5,
        },
        ..StudyConfig::default()
    }
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day += Duration::days(1);
    }
    out
}

fn write_csv(path: &Path, obs: &[DailyObservation]) {
    let mut buf = Vec::new();
    write_daily_csv(&mut buf, obs).unwrap();
    fs::write(path, buf).unwrap();
}

/// Data directory holding 2006-2010 daily series and 1990-2010 sunspots.
fn write_fixture(dir: &Path) {
    let days = weekdays(d(2006, 1, 2), d(2010, 12, 31));

    let mut level = 1250.0_f64;
    let market: Vec<DailyObservation> = days
        .iter()
        .enumerate()
        .map(|(i, day)| {
            level *= (0.0003 + 0.01 * ((i as f64) * 0.7).sin()).exp();
            DailyObservation::new(*day, level)
        })
        .collect();
    write_csv(&dir.join(daily_file_name("^GSPC")), &market);

    let rf: Vec<DailyObservation> = days
        .iter()
        .enumerate()
        .map(|(i, day)| DailyObservation::new(*day, 2.0 + ((i as f64) / 50.0).sin()))
        .collect();
    write_csv(&dir.join(daily_file_name("^IRX")), &rf);

    let mut text = String::new();
    let mut month = MonthKey::new(1990, 1).unwrap();
    let last = MonthKey::new(2010, 12).unwrap();
    let mut i = 0.0_f64;
    while month <= last {
        let sn = if month == MonthKey::new(1995, 6).unwrap() {
            -1.0
        } else {
            80.0 + 60.0 * (2.0 * std::f64::consts::PI * i / 132.0).sin() + 5.0 * i.cos()
        };
        let decimal = month.year() as f64 + (month.month() as f64 - 0.5) / 12.0;
        text.push_str(&format!(
            "{} {:02} {:.3} {:7.1} {:6.1} {:5} 1\n",
            month.year(),
            month.month(),
            decimal,
            sn,
            8.5,
            600
        ));
        month = month.succ();
        i += 1.0;
    }
    fs::write(dir.join(SILSO_SN_MONTHLY_FILE), text).unwrap();
}

#[test]
fn test_build_then_study() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_fixture(data.path());
    let cfg = config();

    let dataset_path = out.path().join(DATASET_FILE);
    let dataset = pipeline::build(&cfg, data.path(), &dataset_path).unwrap();

    // January 2006 has no prior month-end close, so its return is dropped
    assert_eq!(dataset.summary.start, Some(MonthKey::new(2006, 2).unwrap()));
    assert_eq!(dataset.summary.end, Some(MonthKey::new(2010, 12).unwrap()));
    assert_eq!(dataset.summary.rows, 59);
    assert_eq!(dataset.summary.rows_with_sunspot_features, 59);
    assert_eq!(dataset.summary.sunspot_missing_values, 1);

    let reread = pipeline::read_dataset_csv(&dataset_path).unwrap();
    assert_eq!(reread, dataset.rows);
    let summary =
        pipeline::read_dataset_summary(&out.path().join(DATASET_SUMMARY_FILE)).unwrap();
    assert_eq!(summary, dataset.summary);

    let report = pipeline::study(&cfg, &dataset_path, out.path()).unwrap();
    assert_eq!(report.models.len(), 4);
    assert!(report.skipped.is_empty());
    assert_eq!(report.dataset.rows, 59);
    assert!(report.verify_digest().unwrap());

    let json = fs::read_to_string(out.path().join(REPORT_JSON_FILE)).unwrap();
    let parsed = solarquant_eval::StudyReport::from_json(&json).unwrap();
    assert_eq!(parsed.digest, report.digest);
    let text = fs::read_to_string(out.path().join(REPORT_TEXT_FILE)).unwrap();
    assert!(text.contains("MODEL: realized_vol_m ~ sn_z_lag1 + month_fe"));
}

#[test]
fn test_study_without_dataset_fails() {
    let out = tempdir().unwrap();
    let err = pipeline::study(&config(), &out.path().join("missing.csv"), out.path()).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_build_without_data_dir_fails() {
    let out = tempdir().unwrap();
    let missing = out.path().join("no_data");
    assert!(pipeline::build(&config(), &missing, &out.path().join(DATASET_FILE)).is_err());
}

#[test]
fn test_run_is_deterministic() {
    let data = tempdir().unwrap();
    let runs = tempdir().unwrap();
    write_fixture(data.path());
    let cfg = config();

    let first = pipeline::run(&cfg, data.path(), runs.path()).unwrap();
    let second = pipeline::run(&cfg, data.path(), runs.path()).unwrap();

    assert_eq!(first.run_id.len(), 16);
    assert_eq!(first.run_id, second.run_id);
    assert_eq!(first.manifest_sha256, second.manifest_sha256);
    assert_eq!(first.report.digest, second.report.digest);
    assert_eq!(first.run_dir, runs.path().join(&first.run_id));

    let bytes = fs::read(first.run_dir.join("run_manifest.json")).unwrap();
    assert_eq!(sha256_hex(&bytes), first.manifest_sha256);
    let manifest: RunManifest = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(manifest.run_id, first.run_id);
    assert_eq!(manifest.report_digest, first.report.digest);
    assert_eq!(manifest.inputs.len(), 3);
    assert_eq!(manifest.outputs.len(), 5);
    for output in &manifest.outputs {
        let content = fs::read(first.run_dir.join(&output.rel_path)).unwrap();
        assert_eq!(sha256_hex(&content), output.sha256, "{}", output.label);
    }
    assert!(first.run_dir.join("run_manifest.sha256").exists());
    assert!(first.run_dir.join("inputs_manifest.sha256").exists());
}

#[test]
fn test_run_id_tracks_config() {
    let data = tempdir().unwrap();
    let runs = tempdir().unwrap();
    write_fixture(data.path());

    let base = pipeline::run(&config(), data.path(), runs.path()).unwrap();
    let mut shorter = config();
    shorter.window.years = 4;
    let other = pipeline::run(&shorter, data.path(), runs.path()).unwrap();
    assert_ne!(base.run_id, other.run_id);
    assert!(other.report.dataset.rows < base.report.dataset.rows);
}

#[test]
fn test_fetch_from_directory_source_binds_identical_inputs() {
    let fixture = tempdir().unwrap();
    let fetched = tempdir().unwrap();
    write_fixture(fixture.path());
    let cfg = config();

    let source = DirectorySource::new(fixture.path());
    let manifest = pipeline::fetch_from(&source, &cfg, fetched.path()).unwrap();
    let original = pipeline::bind_inputs(&cfg, fixture.path()).unwrap();
    assert_eq!(manifest, original);

    let json = fs::read(fetched.path().join("inputs_manifest.json")).unwrap();
    let sidecar = fs::read_to_string(fetched.path().join("inputs_manifest.sha256")).unwrap();
    assert_eq!(sidecar, format!("{}  inputs_manifest.json\n", sha256_hex(&json)));
    assert_eq!(sha256_hex(&json), manifest.sha256().unwrap());
}

#[test]
fn test_fetch_from_rejects_window_without_observations() {
    let fixture = tempdir().unwrap();
    let fetched = tempdir().unwrap();
    write_fixture(fixture.path());
    let cfg = StudyConfig {
        window: WindowConfig {
            end_date: d(2005, 6, 30),
            years: 1,
        },
        ..StudyConfig::default()
    };

    let source = DirectorySource::new(fixture.path());
    let err = pipeline::fetch_from(&source, &cfg, fetched.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to download ^GSPC"));
    assert!(!fetched.path().join(daily_file_name("^GSPC")).exists());
    assert!(!fetched.path().join("inputs_manifest.json").exists());
}

#[test]
fn test_run_id_ignores_output_locations() {
    let data = tempdir().unwrap();
    let runs = tempdir().unwrap();
    write_fixture(data.path());

    let base = pipeline::run(&config(), data.path(), runs.path()).unwrap();
    let mut relocated = config();
    relocated.output.runs_dir = runs.path().join("elsewhere");
    relocated.output.out_dir = runs.path().join("out");
    let moved = pipeline::run(&relocated, data.path(), runs.path()).unwrap();
    assert_eq!(base.run_id, moved.run_id);
    assert_eq!(base.report.digest, moved.report.digest);
}
