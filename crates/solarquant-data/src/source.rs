//! Market data sources.
//!
//! The pipeline only talks to `MarketDataSource`. `HttpSource` downloads from
//! Yahoo Finance and SILSO; `DirectorySource` replays files previously written
//! by `fetch` (or hand-placed fixtures).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use solarquant_models::DailyObservation;
use tracing::debug;

use crate::error::{DataError, DataResult};
use crate::prices::read_daily_csv;
use crate::silso::SILSO_SN_MONTHLY_FILE;

/// Provider of the study's raw inputs.
pub trait MarketDataSource {
    /// Daily adjusted close for `symbol`, restricted to `[start, end]`, sorted by date.
    fn daily_adj_close(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DataResult<Vec<DailyObservation>>;

    /// Full text of the SILSO monthly sunspot file.
    fn sunspot_monthly_text(&self) -> DataResult<String>;
}

/// Local file name for a symbol's daily series: `^GSPC` → `gspc_daily.csv`.
pub fn daily_file_name(symbol: &str) -> String {
    let stem: String = symbol
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>()
        .to_ascii_lowercase();
    format!("{}_daily.csv", stem)
}

/// Reads inputs from a data directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn daily_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(daily_file_name(symbol))
    }

    pub fn sunspot_path(&self) -> PathBuf {
        self.dir.join(SILSO_SN_MONTHLY_FILE)
    }
}

impl MarketDataSource for DirectorySource {
    fn daily_adj_close(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DataResult<Vec<DailyObservation>> {
        let path = self.daily_path(symbol);
        let file = fs::File::open(&path).map_err(|e| DataError::io(&path, e))?;
        let all = read_daily_csv(file)?;
        let total = all.len();
        let window: Vec<DailyObservation> = all
            .into_iter()
            .filter(|o| o.date >= start && o.date <= end)
            .collect();
        debug!(
            symbol,
            path = %path.display(),
            total,
            in_window = window.len(),
            "Loaded daily series"
        );
        if window.is_empty() {
            return Err(DataError::EmptySeries(format!(
                "{} between {} and {}",
                symbol, start, end
            )));
        }
        Ok(window)
    }

    fn sunspot_monthly_text(&self) -> DataResult<String> {
        let path = self.sunspot_path();
        fs::read_to_string(&path).map_err(|e| DataError::io(&path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_daily_file_name() {
        assert_eq!(daily_file_name("^GSPC"), "gspc_daily.csv");
        assert_eq!(daily_file_name("^IRX"), "irx_daily.csv");
        assert_eq!(daily_file_name("BRK-B"), "brk-b_daily.csv");
    }

    #[test]
    fn test_directory_source_filters_window() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("gspc_daily.csv"),
            "Date,Adj Close\n2005-12-16,1267.32\n2005-12-19,1259.92\n2005-12-20,1259.62\n",
        )
        .unwrap();
        let src = DirectorySource::new(dir.path());
        let obs = src
            .daily_adj_close(
                "^GSPC",
                NaiveDate::from_ymd_opt(2005, 12, 19).unwrap(),
                NaiveDate::from_ymd_opt(2005, 12, 31).unwrap(),
            )
            .unwrap();
        assert_eq!(obs.len(), 2);
        assert!((obs[0].value - 1259.92).abs() < 1e-12);
    }

    #[test]
    fn test_directory_source_missing_file() {
        let dir = tempdir().unwrap();
        let src = DirectorySource::new(dir.path());
        assert!(matches!(src.sunspot_monthly_text(), Err(DataError::Io { .. })));
    }

    #[test]
    fn test_empty_window_is_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("irx_daily.csv"), "Date,Adj Close\n2001-01-02,5.9\n").unwrap();
        let src = DirectorySource::new(dir.path());
        let err = src
            .daily_adj_close(
                "^IRX",
                NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2006, 1, 1).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, DataError::EmptySeries(_)));
    }
}
