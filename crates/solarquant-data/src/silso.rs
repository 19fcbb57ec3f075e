//! SILSO monthly total sunspot number parser.
//!
//! ## Format (SN_m_tot_V2.0.txt)
//! Whitespace-delimited, one month per line:
//! `YEAR MONTH DECIMAL_DATE SN SD N_OBS [DEFINITIVE]`
//!
//! SILSO marks a missing value with -1. Zero is a valid sunspot number
//! (solar minimum months), so only negative values are treated as missing.

use std::collections::BTreeSet;

use solarquant_models::{MonthKey, SunspotRecord};

use crate::error::{DataError, DataResult};

/// Canonical download URL of the monthly file.
pub const SILSO_SN_MONTHLY_URL: &str = "https://www.sidc.be/silso/DATA/SN_m_tot_V2.0.txt";

/// File name used when the monthly file is stored locally.
pub const SILSO_SN_MONTHLY_FILE: &str = "SN_m_tot_V2.0.txt";

/// Maximum number of example gaps carried in `SilsoSummary`.
const MAX_GAP_EXAMPLES: usize = 10;

/// Parse the full text of the SILSO monthly file.
///
/// Returns records sorted by month. Lines that are blank or start with `#`
/// are skipped; trailing `#` comments are stripped.
pub fn parse_silso_monthly(text: &str) -> DataResult<Vec<SunspotRecord>> {
    let mut records = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.is_empty() {
            continue;
        }
        if cols.len() < 4 {
            return Err(DataError::SilsoFormat {
                line: line_no,
                columns: cols.len(),
            });
        }

        let year: i32 = parse_field(cols[0], line_no, "year")?;
        let month: u32 = parse_field(cols[1], line_no, "month")?;
        let decimal_date: f64 = parse_field(cols[2], line_no, "decimal_date")?;
        let sn: f64 = parse_field(cols[3], line_no, "sn")?;
        let sn_sd = cols
            .get(4)
            .map(|v| parse_field::<f64>(v, line_no, "sn_sd"))
            .transpose()?;
        let n_obs = cols
            .get(5)
            .map(|v| parse_field::<i64>(v, line_no, "n_obs"))
            .transpose()?;

        records.push(SunspotRecord {
            month: MonthKey::new(year, month)?,
            decimal_date,
            sn: non_negative(sn),
            sn_sd: sn_sd.and_then(non_negative),
            n_obs: n_obs.filter(|n| *n >= 0),
        });
    }

    records.sort_by_key(|r| r.month);
    for pair in records.windows(2) {
        if pair[0].month == pair[1].month {
            return Err(DataError::DuplicateMonth(pair[0].month));
        }
    }

    Ok(records)
}

fn parse_field<T: std::str::FromStr>(value: &str, line: usize, field: &'static str) -> DataResult<T> {
    value.parse::<T>().map_err(|_| DataError::InvalidField {
        line,
        field,
        value: value.to_string(),
    })
}

fn non_negative(v: f64) -> Option<f64> {
    if v.is_finite() && v >= 0.0 {
        Some(v)
    } else {
        None
    }
}

/// Data-quality summary of a parsed sunspot series.
#[derive(Debug, Clone, PartialEq)]
pub struct SilsoSummary {
    pub first_month: Option<MonthKey>,
    pub last_month: Option<MonthKey>,
    pub records: usize,
    /// Records present in the file but flagged missing (sn < 0)
    pub missing_values: usize,
    /// Calendar months absent from the file between first and last month
    pub missing_periods: usize,
    /// First few absent months, for logging
    pub missing_period_examples: Vec<MonthKey>,
}

/// Calendar months between the first and last record that have no row.
pub fn missing_periods(records: &[SunspotRecord]) -> Vec<MonthKey> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Vec::new();
    };
    let present: BTreeSet<MonthKey> = records.iter().map(|r| r.month).collect();
    MonthKey::range_inclusive(first.month, last.month)
        .into_iter()
        .filter(|m| !present.contains(m))
        .collect()
}

pub fn summarize(records: &[SunspotRecord]) -> SilsoSummary {
    let gaps = missing_periods(records);
    SilsoSummary {
        first_month: records.first().map(|r| r.month),
        last_month: records.last().map(|r| r.month),
        records: records.len(),
        missing_values: records.iter().filter(|r| r.is_missing()).count(),
        missing_periods: gaps.len(),
        missing_period_examples: gaps.into_iter().take(MAX_GAP_EXAMPLES).collect(),
    }
}
