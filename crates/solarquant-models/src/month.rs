//! Calendar month keys.
//!
//! Every monthly series in the study (prices, yields, sunspots) is indexed by
//! `MonthKey`. Serialized as `YYYY-MM`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Earliest year accepted by `MonthKey::new`.
pub const MIN_YEAR: i32 = 1;
/// Latest year accepted by `MonthKey::new`.
pub const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonthKeyError {
    #[error("Month out of range: {0} (expected 1..=12)")]
    MonthOutOfRange(u32),

    #[error("Year out of range: {0} (expected {MIN_YEAR}..={MAX_YEAR})")]
    YearOutOfRange(i32),

    #[error("Invalid month key '{0}' (expected YYYY-MM)")]
    Malformed(String),
}

/// A calendar month (year + month of year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, MonthKeyError> {
        if !(1..=12).contains(&month) {
            return Err(MonthKeyError::MonthOutOfRange(month));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(MonthKeyError::YearOutOfRange(year));
        }
        Ok(Self { year, month })
    }

    /// Month containing `date`.
    pub fn from_date(date: NaiveDate) -> Result<Self, MonthKeyError> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month of year, 1..=12.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("MonthKey always holds a valid calendar month")
    }

    /// Last calendar day of the month.
    pub fn month_end(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .expect("MonthKey always holds a valid calendar month")
    }

    /// Following month. Saturates at December of `MAX_YEAR`.
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            if self.year >= MAX_YEAR {
                return *self;
            }
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Preceding month, or `None` before January of `MIN_YEAR`.
    pub fn pred(&self) -> Option<Self> {
        if self.month == 1 {
            if self.year <= MIN_YEAR {
                return None;
            }
            Some(Self {
                year: self.year - 1,
                month: 12,
            })
        } else {
            Some(Self {
                year: self.year,
                month: self.month - 1,
            })
        }
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: &MonthKey) -> i64 {
        let a = self.year as i64 * 12 + (self.month as i64 - 1);
        let b = other.year as i64 * 12 + (other.month as i64 - 1);
        b - a
    }

    /// All months from `start` to `end` inclusive. Empty when `start > end`.
    pub fn range_inclusive(start: MonthKey, end: MonthKey) -> Vec<MonthKey> {
        let n = start.months_until(&end);
        if n < 0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(n as usize + 1);
        let mut cur = start;
        out.push(cur);
        for _ in 0..n {
            cur = cur.succ();
            out.push(cur);
        }
        out
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MonthKeyError::Malformed(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(malformed)?;
        let year: i32 = y.parse().map_err(|_| malformed())?;
        let month: u32 = m.parse().map_err(|_| malformed())?;
        Self::new(year, month)
    }
}

impl From<MonthKey> for String {
    fn from(m: MonthKey) -> Self {
        m.to_string()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = MonthKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    #[test]
    fn test_month_end_handles_leap_years_and_december() {
        assert_eq!(mk(2024, 2).month_end(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(mk(2023, 2).month_end(), NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
        assert_eq!(mk(2025, 12).month_end(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(mk(2025, 4).month_end(), NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    }

    #[test]
    fn test_succ_pred_cross_year_boundary() {
        assert_eq!(mk(2005, 12).succ(), mk(2006, 1));
        assert_eq!(mk(2006, 1).pred(), Some(mk(2005, 12)));
        assert_eq!(mk(2006, 6).succ().pred(), Some(mk(2006, 6)));
    }

    #[test]
    fn test_pred_of_first_month_is_none() {
        assert_eq!(mk(MIN_YEAR, 1).pred(), None);
        assert_eq!(mk(MIN_YEAR, 2).pred(), Some(mk(MIN_YEAR, 1)));
    }

    #[test]
    fn test_range_inclusive() {
        let r = MonthKey::range_inclusive(mk(2005, 11), mk(2006, 2));
        assert_eq!(r, vec![mk(2005, 11), mk(2005, 12), mk(2006, 1), mk(2006, 2)]);
        assert!(MonthKey::range_inclusive(mk(2006, 2), mk(2006, 1)).is_empty());
        assert_eq!(mk(2005, 12).months_until(&mk(2025, 12)), 240);
    }

    #[test]
    fn test_parse_and_display() {
        let m: MonthKey = "2025-03".parse().unwrap();
        assert_eq!(m, mk(2025, 3));
        assert_eq!(m.to_string(), "2025-03");
        assert!("2025-13".parse::<MonthKey>().is_err());
        assert!("2025/03".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_rejects_invalid_month() {
        assert_eq!(MonthKey::new(2020, 0), Err(MonthKeyError::MonthOutOfRange(0)));
        assert_eq!(MonthKey::new(0, 5), Err(MonthKeyError::YearOutOfRange(0)));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&mk(1999, 7)).unwrap();
        assert_eq!(json, "\"1999-07\"");
        let back: MonthKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mk(1999, 7));
    }
}
