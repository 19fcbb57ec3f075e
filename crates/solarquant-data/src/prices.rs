//! Daily price / yield CSV codec.
//!
//! Files carry a `Date,Adj Close` header. Additional OHLCV columns from other
//! exporters are ignored on read. Rows with an empty, `null` or `NaN` value
//! are dropped.

use std::io::{Read, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use solarquant_models::DailyObservation;

use crate::error::{DataError, DataResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct DailyCsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<String>,
}

#[derive(Debug, Serialize)]
struct DailyCsvOut<'a> {
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Adj Close")]
    adj_close: f64,
}

/// Read a daily series, sorted by date.
pub fn read_daily_csv<R: Read>(reader: R) -> DataResult<Vec<DailyObservation>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();

    for (idx, row) in rdr.deserialize::<DailyCsvRow>().enumerate() {
        let row = row?;
        // Header is line 1
        let line = idx + 2;
        let Some(value) = parse_value(row.adj_close.as_deref(), line)? else {
            continue;
        };
        out.push(DailyObservation::new(parse_date(&row.date, line)?, value));
    }

    out.sort_by_key(|o| o.date);
    for pair in out.windows(2) {
        if pair[0].date == pair[1].date {
            return Err(DataError::DuplicateDate(pair[0].date));
        }
    }
    Ok(out)
}

/// Write a daily series as `Date,Adj Close`.
pub fn write_daily_csv<W: Write>(writer: W, observations: &[DailyObservation]) -> DataResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for obs in observations {
        let date = obs.date.format(DATE_FORMAT).to_string();
        wtr.serialize(DailyCsvOut {
            date: &date,
            adj_close: obs.value,
        })?;
    }
    wtr.flush()
        .map_err(|e| DataError::Csv(csv::Error::from(e)))?;
    Ok(())
}

fn parse_date(raw: &str, line: usize) -> DataResult<NaiveDate> {
    // Accept "2005-12-19 00:00:00-05:00" style timestamps by keeping the date part
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).map_err(|_| DataError::InvalidField {
        line,
        field: "Date",
        value: raw.to_string(),
    })
}

fn parse_value(raw: Option<&str>, line: usize) -> DataResult<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let v: f64 = raw.parse().map_err(|_| DataError::InvalidField {
        line,
        field: "Adj Close",
        value: raw.to_string(),
    })?;
    Ok(v.is_finite().then_some(v))
}
