//! Study report builder
//!
//! Converts the fitted model grid plus run metadata into:
//! - Deterministic JSON report struct
//! - Deterministic text summary string
//!
//! ## Invariants
//! - No file I/O (the runner writes files)
//! - Models appear in grid order (target, predictor, seasonal variant)
//! - Digest = SHA-256 of canonical JSON with digest field empty

use std::fmt::{self, Write as FmtWrite};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use solarquant_models::{MonthKey, MonthlyRow};

use crate::error::{EvalError, EvalResult};
use crate::study::{ModelFit, SkippedModel, StudyOutcome};

// =============================================================================
// Constants
// =============================================================================

pub const STUDY_REPORT_SCHEMA_VERSION: &str = "1";

const RULE: &str = "================================================================================";
const THIN_RULE: &str = "--------------------------------------------------------------------------------";

// =============================================================================
// Report Structs
// =============================================================================

/// Span of the dataset the models were fitted on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDataset {
    pub start: Option<MonthKey>,
    pub end: Option<MonthKey>,
    pub rows: usize,
    pub rows_with_sunspot_features: usize,
}

impl ReportDataset {
    pub fn from_rows(rows: &[MonthlyRow]) -> Self {
        Self {
            start: rows.first().map(|r| r.month),
            end: rows.last().map(|r| r.month),
            rows: rows.len(),
            rows_with_sunspot_features: rows.iter().filter(|r| r.sn_lag1.is_some()).count(),
        }
    }
}

/// The complete study report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyReport {
    pub schema_version: String,
    pub generator: String,
    /// SHA-256 of the resolved configuration
    pub config_digest: String,
    pub dataset: ReportDataset,
    pub models: Vec<ModelFit>,
    pub skipped: Vec<SkippedModel>,
    pub digest: String,
}

// =============================================================================
// StudyReport Implementation
// =============================================================================

impl StudyReport {
    /// Build the report and stamp its digest.
    pub fn build(
        config_digest: impl Into<String>,
        rows: &[MonthlyRow],
        outcome: StudyOutcome,
    ) -> EvalResult<Self> {
        let mut report = Self {
            schema_version: STUDY_REPORT_SCHEMA_VERSION.to_string(),
            generator: format!("solarquant {}", env!("CARGO_PKG_VERSION")),
            config_digest: config_digest.into(),
            dataset: ReportDataset::from_rows(rows),
            models: outcome.fits,
            skipped: outcome.skipped,
            digest: String::new(),
        };
        report.digest = report.compute_digest_hex()?;
        Ok(report)
    }

    /// Serialize to canonical JSON with digest field set to empty string.
    pub fn to_canonical_json_with_empty_digest(&self) -> EvalResult<String> {
        let mut canonical = self.clone();
        canonical.digest = String::new();
        serde_json::to_string(&canonical).map_err(|e| EvalError::Serialization(e.to_string()))
    }

    /// SHA-256 of the canonical JSON (with empty digest field).
    pub fn compute_digest_hex(&self) -> EvalResult<String> {
        let canonical_json = self.to_canonical_json_with_empty_digest()?;
        let mut hasher = Sha256::new();
        hasher.update(canonical_json.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }

    /// True if the stored digest matches the content.
    pub fn verify_digest(&self) -> EvalResult<bool> {
        Ok(self.compute_digest_hex()? == self.digest)
    }

    /// Pretty JSON (includes computed digest).
    pub fn to_json(&self) -> EvalResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EvalError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> EvalResult<Self> {
        serde_json::from_str(json).map_err(|e| EvalError::Serialization(e.to_string()))
    }

    pub fn model(&self, name: &str) -> Option<&ModelFit> {
        self.models.iter().find(|m| m.model == name)
    }

    /// Deterministic text summary.
    pub fn to_text_summary(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text_summary(&mut out);
        out
    }

    fn write_text_summary(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "{}", RULE)?;
        writeln!(out, "SUNSPOT STUDY REPORT")?;
        writeln!(out, "{}", RULE)?;
        writeln!(out, "Generator:  {}", self.generator)?;
        writeln!(out, "Config:     {}", self.config_digest)?;
        writeln!(
            out,
            "Dataset:    {} .. {} ({} rows, {} with sunspot features)",
            month_or_none(self.dataset.start),
            month_or_none(self.dataset.end),
            self.dataset.rows,
            self.dataset.rows_with_sunspot_features
        )?;
        writeln!(out)?;

        for fit in &self.models {
            writeln!(out, "{}", THIN_RULE)?;
            writeln!(out, "MODEL: {}", fit.model)?;
            writeln!(out, "{}", THIN_RULE)?;
            writeln!(
                out,
                "  Sample:       {} .. {} (n={}, k={})",
                month_or_none(fit.first_month),
                month_or_none(fit.last_month),
                fit.n_obs,
                fit.n_params
            )?;
            if let Some(m) = fit.baseline_month {
                writeln!(out, "  Baseline:     month {:02}", m)?;
            }
            writeln!(
                out,
                "  R2:           {:.4} (adj {:.4})",
                fit.r_squared, fit.adj_r_squared
            )?;
            writeln!(out, "  Resid SE:     {:.6}", fit.residual_std_error)?;
            writeln!(
                out,
                "  HAC:          Newey-West, {} lag(s), {:?} p-values",
                fit.hac_lags, fit.inference
            )?;
            writeln!(
                out,
                "  {:<16} {:>12} {:>12} {:>12} {:>9} {:>8}",
                "term", "coef", "se_ols", "se_hac", "t_hac", "p"
            )?;
            for c in &fit.coefficients {
                writeln!(
                    out,
                    "  {:<16} {:>12.6} {:>12.6} {:>12.6} {:>9.3} {:>8.4}",
                    c.name, c.estimate, c.std_error_ols, c.std_error_hac, c.t_stat, c.p_value
                )?;
            }
            writeln!(out)?;
        }

        if !self.skipped.is_empty() {
            writeln!(out, "{}", THIN_RULE)?;
            writeln!(out, "SKIPPED")?;
            writeln!(out, "{}", THIN_RULE)?;
            for s in &self.skipped {
                writeln!(out, "  {}: {}", s.model, s.reason)?;
            }
            writeln!(out)?;
        }

        writeln!(out, "{}", THIN_RULE)?;
        writeln!(out, "Report Digest: {}", self.digest)?;
        writeln!(out, "{}", RULE)
    }
}

fn month_or_none(m: Option<MonthKey>) -> String {
    m.map(|m| m.to_string()).unwrap_or_else(|| "none".to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::{RegressionConfig, run_study};
    use crate::study::tests::synthetic_rows;

    fn make_report() -> StudyReport {
        let rows = synthetic_rows(60);
        let outcome = run_study(&rows, &RegressionConfig::default());
        StudyReport::build("cfg123", &rows, outcome).unwrap()
    }

    #[test]
    fn test_build_report() {
        let report = make_report();
        assert_eq!(report.schema_version, "1");
        assert_eq!(report.config_digest, "cfg123");
        assert_eq!(report.dataset.rows, 60);
        assert_eq!(report.dataset.rows_with_sunspot_features, 60);
        assert_eq!(report.dataset.start, Some(MonthKey::new(2006, 1).unwrap()));
        assert_eq!(report.dataset.end, Some(MonthKey::new(2010, 12).unwrap()));
        assert_eq!(report.models.len(), 4);
        assert!(report.model("realized_vol_m ~ sn_z_lag1").is_some());
        assert_eq!(report.digest.len(), 64);
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = make_report();
        let b = make_report();
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(a.to_text_summary(), b.to_text_summary());
    }

    #[test]
    fn test_digest_tracks_content() {
        let report = make_report();
        assert!(report.verify_digest().unwrap());

        let mut tampered = report.clone();
        tampered.config_digest = "other".to_string();
        assert!(!tampered.verify_digest().unwrap());
        assert_ne!(tampered.compute_digest_hex().unwrap(), report.digest);
    }

    #[test]
    fn test_canonical_json_ignores_digest_field() {
        let report = make_report();
        let mut other = report.clone();
        other.digest = "x".repeat(64);
        assert_eq!(
            report.to_canonical_json_with_empty_digest().unwrap(),
            other.to_canonical_json_with_empty_digest().unwrap()
        );
    }

    #[test]
    fn test_json_round_trip_keeps_digest_valid() {
        let report = make_report();
        let parsed = StudyReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed.digest, report.digest);
        assert_eq!(parsed.models.len(), report.models.len());
        assert_eq!(parsed.models[1].baseline_month, Some(1));
    }

    #[test]
    fn test_text_summary_layout() {
        let report = make_report();
        let text = report.to_text_summary();
        assert!(text.starts_with(RULE));
        assert!(text.contains("MODEL: excess_log_ret_m ~ sn_z_lag1 + month_fe"));
        assert!(text.contains("Dataset:    2006-01 .. 2010-12 (60 rows, 60 with sunspot features)"));
        assert!(text.contains("Baseline:     month 01"));
        assert!(text.contains(&format!("Report Digest: {}", report.digest)));
        assert!(!text.contains("SKIPPED"));
    }

    #[test]
    fn test_skipped_models_listed() {
        let rows = synthetic_rows(2);
        let outcome = run_study(&rows, &RegressionConfig::default());
        let report = StudyReport::build("cfg", &rows, outcome).unwrap();
        assert!(report.models.is_empty());
        assert_eq!(report.skipped.len(), 4);
        assert!(report.to_text_summary().contains("SKIPPED"));
    }
}
