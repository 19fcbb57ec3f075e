//! # Configuration Loading
//!
//! Study configuration (`configs/study.toml`). Every section has defaults, so
//! a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use solarquant_data::HttpSourceConfig;
use solarquant_data::http::YAHOO_CHART_BASE_URL;
use solarquant_data::silso::SILSO_SN_MONTHLY_URL;
use solarquant_eval::{HacConfig, Inference, RegressionConfig, Target};
use solarquant_features::{FeatureConfig, StudyWindow};
use solarquant_models::SunspotFeature;
use tracing::warn;

use crate::manifest_io::sha256_hex;

pub const DEFAULT_CONFIG_PATH: &str = "configs/study.toml";

/// Root configuration schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub window: WindowConfig,
    pub symbols: SymbolsConfig,
    pub sources: SourcesConfig,
    pub features: FeatureConfig,
    pub regression: RegressionSection,
    pub output: OutputConfig,
}

/// Trailing window ending on `end_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub end_date: NaiveDate,
    pub years: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            end_date: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap_or_default(),
            years: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolsConfig {
    /// Equity index (adjusted close)
    pub market: String,
    /// Risk-free proxy quoted as a yield in % p.a.
    pub risk_free: String,
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self {
            market: "^GSPC".to_string(),
            risk_free: "^IRX".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub yahoo_chart_base_url: String,
    pub sunspot_url: String,
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            yahoo_chart_base_url: YAHOO_CHART_BASE_URL.to_string(),
            sunspot_url: SILSO_SN_MONTHLY_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl SourcesConfig {
    pub fn http_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            yahoo_chart_base_url: self.yahoo_chart_base_url.clone(),
            sunspot_url: self.sunspot_url.clone(),
            timeout_secs: self.timeout_secs,
            ..HttpSourceConfig::default()
        }
    }
}

/// Model grid and inference settings as written in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionSection {
    pub targets: Vec<Target>,
    /// Feature names, e.g. `sn_z`, `sn_ma24`
    pub predictors: Vec<String>,
    pub seasonal: Vec<bool>,
    /// Fixed Newey-West lag; unset uses floor(4 (n/100)^(2/9))
    pub hac_lags: Option<usize>,
    pub small_sample_correction: bool,
    pub inference: Inference,
}

impl Default for RegressionSection {
    fn default() -> Self {
        let defaults = RegressionConfig::default();
        Self {
            targets: defaults.targets,
            predictors: defaults.predictors.iter().map(|p| p.name().to_string()).collect(),
            seasonal: defaults.seasonal,
            hac_lags: defaults.hac.lags,
            small_sample_correction: defaults.hac.small_sample_correction,
            inference: defaults.inference,
        }
    }
}

impl RegressionSection {
    pub fn to_regression_config(&self) -> Result<RegressionConfig> {
        let predictors = self
            .predictors
            .iter()
            .map(|p| p.parse::<SunspotFeature>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RegressionConfig {
            targets: self.targets.clone(),
            predictors,
            seasonal: self.seasonal.clone(),
            hac: HacConfig {
                lags: self.hac_lags,
                small_sample_correction: self.small_sample_correction,
            },
            inference: self.inference,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Downloaded inputs
    pub data_dir: PathBuf,
    /// `build` / `study` artifacts
    pub out_dir: PathBuf,
    /// One subdirectory per `run`
    pub runs_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("out"),
            runs_dir: PathBuf::from("runs"),
        }
    }
}

impl StudyConfig {
    /// Load configuration from file path.
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.years == 0 {
            bail!("window.years must be > 0");
        }
        self.study_window().context("Invalid [window] section")?;
        self.features.validate()?;
        if self.regression.targets.is_empty() {
            bail!("regression.targets must not be empty");
        }
        if self.regression.predictors.is_empty() {
            bail!("regression.predictors must not be empty");
        }
        if self.regression.seasonal.is_empty() {
            bail!("regression.seasonal must not be empty");
        }
        self.regression.to_regression_config()?;
        Ok(())
    }

    pub fn study_window(&self) -> Result<StudyWindow> {
        Ok(StudyWindow::trailing_years(self.window.end_date, self.window.years)?)
    }

    /// Hash of the sections that determine study results.
    ///
    /// `[sources]` and `[output]` are left out: inputs are bound by content
    /// and output locations do not change what is computed.
    pub fn study_hash(&self) -> Result<String> {
        config_hash(&StudyIdentity {
            window: &self.window,
            symbols: &self.symbols,
            features: &self.features,
            regression: &self.regression,
        })
    }
}

#[derive(Serialize)]
struct StudyIdentity<'a> {
    window: &'a WindowConfig,
    symbols: &'a SymbolsConfig,
    features: &'a FeatureConfig,
    regression: &'a RegressionSection,
}

/// Deterministic config hash: SHA-256 of the compact JSON of the resolved config.
pub fn config_hash<T: Serialize>(cfg: &T) -> Result<String> {
    let bytes = serde_json::to_vec(cfg).context("Failed to serialize config for hashing")?;
    Ok(sha256_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let cfg = StudyConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, StudyConfig::default());
        assert_eq!(cfg.window.end_date, NaiveDate::from_ymd_opt(2025, 12, 19).unwrap());
        assert_eq!(cfg.window.years, 20);
        assert_eq!(cfg.symbols.market, "^GSPC");
        assert_eq!(cfg.features.ma_window, 24);
        assert_eq!(cfg.regression.predictors, vec!["sn_z"]);
        assert_eq!(cfg.regression.seasonal, vec![false, true]);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let cfg = StudyConfig::from_toml_str(include_str!("../../../configs/study.toml")).unwrap();
        assert_eq!(cfg, StudyConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let cfg = StudyConfig::from_toml_str(
            r#"
[window]
years = 10

[features]
regime_quantile = 0.9

[regression]
predictors = ["sn_z", "sn_ma24"]
inference = "student_t"
hac_lags = 6
"#,
        )
        .unwrap();
        assert_eq!(cfg.window.years, 10);
        assert_eq!(cfg.window.end_date, WindowConfig::default().end_date);
        assert_eq!(cfg.features.regime_quantile, 0.9);
        assert_eq!(cfg.features.ma_window, 24);

        let reg = cfg.regression.to_regression_config().unwrap();
        assert_eq!(
            reg.predictors,
            vec![SunspotFeature::SnZ, SunspotFeature::SnMa24]
        );
        assert_eq!(reg.inference, Inference::StudentT);
        assert_eq!(reg.hac.lags, Some(6));
        assert!(reg.hac.small_sample_correction);
        assert_eq!(reg.specs().len(), 8);
    }

    #[test]
    fn test_end_date_parses_from_string() {
        let cfg = StudyConfig::from_toml_str("[window]\nend_date = \"2020-06-30\"\n").unwrap();
        let window = cfg.study_window().unwrap();
        assert_eq!(window.start_date, NaiveDate::from_ymd_opt(2000, 6, 30).unwrap());
    }

    #[test]
    fn test_validation_failures() {
        assert!(StudyConfig::from_toml_str("[window]\nyears = 0\n").is_err());
        assert!(StudyConfig::from_toml_str("[features]\nregime_quantile = 1.0\n").is_err());
        assert!(StudyConfig::from_toml_str("[features]\nma_window = 0\n").is_err());
        assert!(StudyConfig::from_toml_str("[regression]\npredictors = []\n").is_err());
        let err = StudyConfig::from_toml_str("[regression]\npredictors = [\"sunspots\"]\n")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown sunspot feature"));
    }

    #[test]
    fn test_config_hash_stable_and_sensitive() {
        let a = StudyConfig::default();
        let mut b = StudyConfig::default();
        assert_eq!(config_hash(&a).unwrap(), config_hash(&b).unwrap());
        b.window.years = 19;
        assert_ne!(config_hash(&a).unwrap(), config_hash(&b).unwrap());
        assert_eq!(config_hash(&a).unwrap().len(), 64);
    }

    #[test]
    fn test_window_out_of_range_rejected_at_load() {
        let err = StudyConfig::from_toml_str("[window]\nyears = 400000000\n").unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid [window] section"));
        assert!(StudyConfig::from_toml_str("[window]\nyears = 1000000\n").is_err());
    }

    #[test]
    fn test_study_hash_ignores_output_and_sources() {
        let base = StudyConfig::default();
        let mut moved = StudyConfig::default();
        moved.output.runs_dir = PathBuf::from("/tmp/elsewhere");
        moved.output.data_dir = PathBuf::from("cache");
        moved.sources.timeout_secs = 90;
        assert_eq!(base.study_hash().unwrap(), moved.study_hash().unwrap());

        let mut refit = StudyConfig::default();
        refit.regression.hac_lags = Some(6);
        assert_ne!(base.study_hash().unwrap(), refit.study_hash().unwrap());
        let mut shorter = StudyConfig::default();
        shorter.window.years = 19;
        assert_ne!(base.study_hash().unwrap(), shorter.study_hash().unwrap());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StudyConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, StudyConfig::default());
        assert!(StudyConfig::load(&dir.path().join("nope.toml")).is_err());
    }
}
