//! Model specifications and design matrices.

use std::collections::BTreeSet;
use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use solarquant_models::{MonthKey, MonthlyRow, SunspotFeature};

use crate::error::{EvalError, EvalResult};

/// Dependent variable of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Monthly log excess return of the market
    ExcessReturn,
    /// Monthly realized volatility of the market
    RealizedVol,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::ExcessReturn, Target::RealizedVol];

    pub fn column(&self) -> &'static str {
        match self {
            Target::ExcessReturn => "excess_log_ret_m",
            Target::RealizedVol => "realized_vol_m",
        }
    }

    pub fn value(&self, row: &MonthlyRow) -> Option<f64> {
        match self {
            Target::ExcessReturn => row.excess_log_ret_m,
            Target::RealizedVol => row.realized_vol_m,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One regression: target on an intercept, a lagged sunspot feature and,
/// optionally, month-of-year dummies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub target: Target,
    pub predictor: SunspotFeature,
    pub seasonal: bool,
}

impl ModelSpec {
    pub fn predictor_column(&self) -> String {
        format!("{}_lag1", self.predictor.name())
    }

    /// Stable model identifier, e.g. `excess_log_ret_m ~ sn_z_lag1 + month_fe`.
    pub fn name(&self) -> String {
        let mut s = format!("{} ~ {}", self.target.column(), self.predictor_column());
        if self.seasonal {
            s.push_str(" + month_fe");
        }
        s
    }
}

pub const INTERCEPT: &str = "const";

/// Complete-case design for one model.
#[derive(Debug, Clone)]
pub struct Design {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub columns: Vec<String>,
    pub months: Vec<MonthKey>,
    /// Month of year used as the seasonal baseline
    pub baseline_month: Option<u32>,
}

impl Design {
    pub fn n_obs(&self) -> usize {
        self.y.len()
    }

    pub fn n_params(&self) -> usize {
        self.x.ncols()
    }
}

/// Build the design matrix, dropping rows missing the target or predictor.
///
/// Seasonal dummies cover months of year present in the sample; the earliest
/// present month of year is the omitted baseline.
pub fn build_design(rows: &[MonthlyRow], spec: &ModelSpec) -> EvalResult<Design> {
    let complete: Vec<(MonthKey, f64, f64)> = rows
        .iter()
        .filter_map(|row| {
            let y = spec.target.value(row)?;
            let x = spec.predictor.value(row.sn_lag1.as_ref()?)?;
            Some((row.month, y, x))
        })
        .collect();

    for (month, y, x) in &complete {
        if !y.is_finite() || !x.is_finite() {
            return Err(EvalError::NonFinite(format!("{} row {}", spec.name(), month)));
        }
    }

    let dummy_months: Vec<u32> = if spec.seasonal {
        complete
            .iter()
            .map(|(m, _, _)| m.month())
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect()
    } else {
        Vec::new()
    };
    let baseline_month = dummy_months.first().copied();
    let dummies = dummy_months.get(1..).unwrap_or(&[]);

    let mut columns = vec![INTERCEPT.to_string(), spec.predictor_column()];
    columns.extend(dummies.iter().map(|m| format!("month_{:02}", m)));

    let n = complete.len();
    let k = columns.len();
    let x = DMatrix::from_fn(n, k, |i, j| {
        let (month, _, xv) = complete[i];
        match j {
            0 => 1.0,
            1 => xv,
            _ => {
                if month.month() == dummies[j - 2] {
                    1.0
                } else {
                    0.0
                }
            }
        }
    });
    let y = DVector::from_iterator(n, complete.iter().map(|(_, y, _)| *y));

    Ok(Design {
        x,
        y,
        columns,
        months: complete.iter().map(|(m, _, _)| *m).collect(),
        baseline_month: if spec.seasonal { baseline_month } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solarquant_models::SunspotFeatures;

    fn row(y: i32, m: u32, excess: Option<f64>, sn_z: Option<f64>) -> MonthlyRow {
        MonthlyRow {
            month: MonthKey::new(y, m).unwrap(),
            spx_adj_close_m: None,
            spx_log_ret_m: None,
            rf_yield_pct_pa_m: None,
            rf_log_ret_m: None,
            excess_log_ret_m: excess,
            realized_vol_m: None,
            trading_days: 0,
            sn_lag1: Some(SunspotFeatures {
                sn_z,
                ..SunspotFeatures::default()
            }),
        }
    }

    fn spec(seasonal: bool) -> ModelSpec {
        ModelSpec {
            target: Target::ExcessReturn,
            predictor: SunspotFeature::SnZ,
            seasonal,
        }
    }

    #[test]
    fn test_complete_case_filter() {
        let rows = vec![
            row(2006, 1, Some(0.01), Some(0.5)),
            row(2006, 2, None, Some(0.6)),
            row(2006, 3, Some(0.02), None),
            row(2006, 4, Some(0.03), Some(0.7)),
        ];
        let d = build_design(&rows, &spec(false)).unwrap();
        assert_eq!(d.n_obs(), 2);
        assert_eq!(d.columns, vec!["const", "sn_z_lag1"]);
        assert_eq!(d.x[(1, 1)], 0.7);
        assert_eq!(d.y[1], 0.03);
        assert_eq!(d.baseline_month, None);
    }

    #[test]
    fn test_seasonal_dummies_skip_baseline_and_absent_months() {
        let rows = vec![
            row(2006, 2, Some(0.01), Some(0.1)),
            row(2006, 3, Some(0.02), Some(0.2)),
            row(2006, 5, Some(0.03), Some(0.3)),
            row(2007, 3, Some(0.04), Some(0.4)),
        ];
        let d = build_design(&rows, &spec(true)).unwrap();
        assert_eq!(d.columns, vec!["const", "sn_z_lag1", "month_03", "month_05"]);
        assert_eq!(d.baseline_month, Some(2));
        // 2007-03 row sets the March dummy only
        assert_eq!(d.x[(3, 2)], 1.0);
        assert_eq!(d.x[(3, 3)], 0.0);
        // February baseline row has no dummy set
        assert_eq!(d.x[(0, 2)] + d.x[(0, 3)], 0.0);
    }

    #[test]
    fn test_model_names() {
        assert_eq!(spec(false).name(), "excess_log_ret_m ~ sn_z_lag1");
        assert_eq!(spec(true).name(), "excess_log_ret_m ~ sn_z_lag1 + month_fe");
    }

    #[test]
    fn test_non_finite_rejected() {
        let rows = vec![row(2006, 1, Some(f64::INFINITY), Some(0.5))];
        assert!(matches!(
            build_design(&rows, &spec(false)),
            Err(EvalError::NonFinite(_))
        ));
    }
}
