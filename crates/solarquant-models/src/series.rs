//! Raw observations: daily market values and monthly sunspot records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::month::MonthKey;

/// One daily observation (adjusted close, or yield in % p.a. for rate series).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub value: f64,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// One row of the SILSO monthly total sunspot number file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunspotRecord {
    pub month: MonthKey,
    /// Fractional year at the middle of the month (e.g. 2005.873)
    pub decimal_date: f64,
    /// Monthly mean total sunspot number. `None` when flagged missing.
    pub sn: Option<f64>,
    /// Monthly standard deviation. `None` when flagged missing or absent.
    pub sn_sd: Option<f64>,
    /// Number of observations. `None` when flagged missing or absent.
    pub n_obs: Option<i64>,
}

impl SunspotRecord {
    pub fn is_missing(&self) -> bool {
        self.sn.is_none()
    }
}
