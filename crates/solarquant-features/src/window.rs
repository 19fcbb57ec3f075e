//! Study window.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use solarquant_models::MonthKey;

use crate::error::{FeatureError, FeatureResult};

/// Closed date interval covered by the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl StudyWindow {
    /// Window ending on `end_date` and spanning `years` calendar years.
    ///
    /// Feb 29 start dates clamp to Feb 28.
    pub fn trailing_years(end_date: NaiveDate, years: u32) -> FeatureResult<Self> {
        if years == 0 {
            return Err(FeatureError::InvalidConfig("window years must be > 0".to_string()));
        }
        let months = years
            .checked_mul(12)
            .ok_or_else(|| FeatureError::InvalidConfig(format!("window of {} years is too long", years)))?;
        let start_date = end_date
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| FeatureError::InvalidConfig(format!("{} years before {} is out of range", years, end_date)))?;
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_month(&self) -> FeatureResult<MonthKey> {
        Ok(MonthKey::from_date(self.start_date)?)
    }

    pub fn end_month(&self) -> FeatureResult<MonthKey> {
        Ok(MonthKey::from_date(self.end_date)?)
    }

    /// First sunspot month kept in the study slice.
    ///
    /// One month before the start month, so the first return month has a
    /// lagged observation.
    pub fn first_sunspot_month(&self) -> FeatureResult<MonthKey> {
        let start = self.start_month()?;
        start
            .pred()
            .ok_or_else(|| FeatureError::InvalidConfig(format!("no month precedes window start {}", start)))
    }

    /// Whether a sunspot month belongs to the study slice: from
    /// `first_sunspot_month` through the last month ending on or before `end_date`.
    pub fn contains_sunspot_month(&self, month: MonthKey) -> FeatureResult<bool> {
        Ok(month >= self.first_sunspot_month()? && month.month_end() <= self.end_date)
    }
}
