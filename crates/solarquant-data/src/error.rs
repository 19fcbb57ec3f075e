use std::path::PathBuf;

use chrono::NaiveDate;
use solarquant_models::{MonthKey, MonthKeyError};

pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Unexpected SILSO monthly SN file format at line {line}: {columns} columns found (need at least 4)")]
    SilsoFormat { line: usize, columns: usize },

    #[error("Invalid {field} '{value}' at line {line}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Duplicate month in sunspot series: {0}")]
    DuplicateMonth(MonthKey),

    #[error("Duplicate date in daily series: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Invalid month: {0}")]
    Month(#[from] MonthKeyError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to download {symbol}: {reason}")]
    Download { symbol: String, reason: String },

    #[error("Series is empty: {0}")]
    EmptySeries(String),
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}
