//! Daily → monthly resampling.
//!
//! All monthly series are contiguous: every calendar month between the first
//! and last observation has a key, with `None` where the month had no data.

use std::collections::BTreeMap;

use solarquant_models::{DailyObservation, MonthKey};

use crate::error::DataResult;

/// Contiguous monthly series.
pub type MonthlySeries = BTreeMap<MonthKey, Option<f64>>;

/// Realized volatility of one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyRealizedVol {
    /// sqrt(sum r_d^2) of daily log returns dated in the month
    pub vol: Option<f64>,
    /// Observations dated in the month
    pub trading_days: u32,
}

/// Group observations by month, visiting every month of the span.
fn group_by_month(observations: &[DailyObservation]) -> DataResult<BTreeMap<MonthKey, Vec<DailyObservation>>> {
    let mut grouped: BTreeMap<MonthKey, Vec<DailyObservation>> = BTreeMap::new();
    let (Some(first), Some(last)) = (observations.first(), observations.last()) else {
        return Ok(grouped);
    };
    for m in MonthKey::range_inclusive(MonthKey::from_date(first.date)?, MonthKey::from_date(last.date)?) {
        grouped.insert(m, Vec::new());
    }
    for obs in observations {
        grouped
            .entry(MonthKey::from_date(obs.date)?)
            .or_default()
            .push(*obs);
    }
    Ok(grouped)
}

/// Month-end value: the last observation of each month.
///
/// Observations must be sorted by date.
pub fn last_per_month(observations: &[DailyObservation]) -> DataResult<MonthlySeries> {
    Ok(group_by_month(observations)?
        .into_iter()
        .map(|(m, obs)| (m, obs.last().map(|o| o.value)))
        .collect())
}

/// Arithmetic mean of each month's observations.
pub fn mean_per_month(observations: &[DailyObservation]) -> DataResult<MonthlySeries> {
    Ok(group_by_month(observations)?
        .into_iter()
        .map(|(m, obs)| {
            let mean = if obs.is_empty() {
                None
            } else {
                Some(obs.iter().map(|o| o.value).sum::<f64>() / obs.len() as f64)
            };
            (m, mean)
        })
        .collect())
}

/// Log return between consecutive months: ln(p_m) - ln(p_{m-1}).
pub fn monthly_log_returns(prices: &MonthlySeries) -> MonthlySeries {
    let mut out = MonthlySeries::new();
    let mut prev: Option<f64> = None;
    for (m, p) in prices {
        out.insert(*m, log_return(prev, *p));
        prev = *p;
    }
    out
}

fn log_return(prev: Option<f64>, cur: Option<f64>) -> Option<f64> {
    match (prev, cur) {
        (Some(a), Some(b)) if a > 0.0 && b > 0.0 => Some(b.ln() - a.ln()),
        _ => None,
    }
}

/// Monthly log risk-free return from an annualized yield in percent.
///
/// Monthly simple rate ≈ (yield / 100) / 12, then ln(1 + r).
pub fn risk_free_log_return(yield_pct_pa: f64) -> f64 {
    ((yield_pct_pa / 100.0) / 12.0).ln_1p()
}

/// Per-month realized volatility from daily closes.
///
/// The first daily return of the series has no predecessor and is skipped;
/// returns are attributed to the month of the later day.
pub fn realized_volatility(observations: &[DailyObservation]) -> DataResult<BTreeMap<MonthKey, MonthlyRealizedVol>> {
    let grouped = group_by_month(observations)?;
    let mut sum_sq: BTreeMap<MonthKey, (f64, u32)> = BTreeMap::new();

    for pair in observations.windows(2) {
        if let Some(r) = log_return(Some(pair[0].value), Some(pair[1].value)) {
            let entry = sum_sq.entry(MonthKey::from_date(pair[1].date)?).or_insert((0.0, 0));
            entry.0 += r * r;
            entry.1 += 1;
        }
    }

    Ok(grouped
        .into_iter()
        .map(|(m, obs)| {
            let vol = sum_sq
                .get(&m)
                .filter(|(_, n)| *n > 0)
                .map(|(s, _)| s.sqrt());
            (
                m,
                MonthlyRealizedVol {
                    vol,
                    trading_days: obs.len() as u32,
                },
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(y: i32, m: u32, d: u32, v: f64) -> DailyObservation {
        DailyObservation::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), v)
    }

    fn mk(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    #[test]
    fn test_last_per_month_fills_gaps() {
        let series = vec![
            obs(2020, 1, 2, 100.0),
            obs(2020, 1, 31, 110.0),
            obs(2020, 3, 2, 121.0),
        ];
        let m = last_per_month(&series).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m[&mk(2020, 1)], Some(110.0));
        assert_eq!(m[&mk(2020, 2)], None);
        assert_eq!(m[&mk(2020, 3)], Some(121.0));
    }

    #[test]
    fn test_mean_per_month() {
        let series = vec![obs(2020, 1, 2, 1.0), obs(2020, 1, 3, 2.0), obs(2020, 2, 3, 4.0)];
        let m = mean_per_month(&series).unwrap();
        assert_eq!(m[&mk(2020, 1)], Some(1.5));
        assert_eq!(m[&mk(2020, 2)], Some(4.0));
    }

    #[test]
    fn test_monthly_log_returns_propagate_gaps() {
        let mut prices = MonthlySeries::new();
        prices.insert(mk(2020, 1), Some(100.0));
        prices.insert(mk(2020, 2), Some(110.0));
        prices.insert(mk(2020, 3), None);
        prices.insert(mk(2020, 4), Some(120.0));
        let r = monthly_log_returns(&prices);
        assert_eq!(r[&mk(2020, 1)], None);
        assert!((r[&mk(2020, 2)].unwrap() - (1.1f64).ln()).abs() < 1e-12);
        assert_eq!(r[&mk(2020, 3)], None);
        assert_eq!(r[&mk(2020, 4)], None);
    }

    #[test]
    fn test_risk_free_log_return() {
        assert_eq!(risk_free_log_return(0.0), 0.0);
        let expected = (1.0f64 + 0.05 / 12.0).ln();
        assert!((risk_free_log_return(5.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_realized_volatility() {
        let series = vec![
            obs(2020, 1, 30, 100.0),
            obs(2020, 1, 31, 101.0),
            obs(2020, 2, 3, 99.0),
            obs(2020, 2, 4, 100.0),
        ];
        let rv = realized_volatility(&series).unwrap();

        let jan = rv[&mk(2020, 1)];
        assert_eq!(jan.trading_days, 2);
        let r1 = (101.0f64 / 100.0).ln();
        assert!((jan.vol.unwrap() - r1.abs()).abs() < 1e-12);

        // February includes the return from Jan 31 to Feb 3
        let feb = rv[&mk(2020, 2)];
        let r2 = (99.0f64 / 101.0).ln();
        let r3 = (100.0f64 / 99.0).ln();
        assert!((feb.vol.unwrap() - (r2 * r2 + r3 * r3).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_observation_has_no_volatility() {
        let rv = realized_volatility(&[obs(2020, 1, 2, 100.0)]).unwrap();
        assert_eq!(rv[&mk(2020, 1)].vol, None);
        assert_eq!(rv[&mk(2020, 1)].trading_days, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(last_per_month(&[]).unwrap().is_empty());
        assert!(realized_volatility(&[]).unwrap().is_empty());
    }
}
