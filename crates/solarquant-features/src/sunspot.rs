//! Sunspot feature engineering.
//!
//! Features are computed over the full SILSO history before slicing to the
//! study window, so rolling and expanding statistics at the start of the
//! window are fully warmed up. The history is first laid on a contiguous
//! monthly grid: absent months and flagged values are both `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use solarquant_models::{MonthKey, SunspotFeatures, SunspotRecord};

use crate::error::{FeatureError, FeatureResult};
use crate::window::StudyWindow;

/// Parameters of the sunspot feature set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rolling mean length in months
    pub ma_window: usize,
    /// Non-missing observations required before the expanding z-score is defined
    pub expanding_min_periods: usize,
    /// Full-history quantile defining the high-activity regime
    pub regime_quantile: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ma_window: 24,
            expanding_min_periods: 12,
            regime_quantile: 0.8,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> FeatureResult<()> {
        if self.ma_window == 0 {
            return Err(FeatureError::InvalidConfig("ma_window must be > 0".to_string()));
        }
        if self.expanding_min_periods == 0 {
            return Err(FeatureError::InvalidConfig(
                "expanding_min_periods must be > 0".to_string(),
            ));
        }
        if !(self.regime_quantile > 0.0 && self.regime_quantile < 1.0) {
            return Err(FeatureError::InvalidConfig(format!(
                "regime_quantile must be in (0, 1), got {}",
                self.regime_quantile
            )));
        }
        Ok(())
    }
}

/// Sunspot numbers on a contiguous monthly grid.
pub fn to_monthly_grid(records: &[SunspotRecord]) -> Vec<(MonthKey, Option<f64>)> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Vec::new();
    };
    let by_month: BTreeMap<MonthKey, Option<f64>> = records.iter().map(|r| (r.month, r.sn)).collect();
    MonthKey::range_inclusive(first.month, last.month)
        .into_iter()
        .map(|m| (m, by_month.get(&m).copied().flatten()))
        .collect()
}

/// Rolling mean; defined only when every value in the window is present.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            let sum: Option<f64> = slice.iter().copied().sum();
            sum.map(|s| s / window as f64)
        })
        .collect()
}

/// Expanding z-score using population std (ddof = 0) of non-missing values seen so far.
pub fn expanding_zscore(values: &[Option<f64>], min_periods: usize) -> Vec<Option<f64>> {
    // Welford running moments
    let mut n = 0usize;
    let mut mean = 0.0;
    let mut m2 = 0.0;

    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            n += 1;
            let delta = x - mean;
            mean += delta / n as f64;
            m2 += delta * (x - mean);

            if n < min_periods {
                return None;
            }
            let std = (m2 / n as f64).sqrt();
            (std > 0.0).then(|| (x - mean) / std)
        })
        .collect()
}

/// First difference; `None` when either side is missing.
pub fn diff(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for (i, v) in values.iter().enumerate() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(match (prev, *v) {
                (Some(a), Some(b)) => Some(b - a),
                _ => None,
            });
        }
        prev = *v;
    }
    out
}

/// Linear-interpolation quantile of the non-missing values.
pub fn quantile(values: &[Option<f64>], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Sample mean and sample std (ddof = 1) of the non-missing values.
fn sample_moments(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let xs: Vec<f64> = values.collect();
    if xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, var.sqrt()))
}

/// Full-history features for every month of the grid (`sn_z` left unset).
pub fn full_history_features(
    records: &[SunspotRecord],
    cfg: &FeatureConfig,
) -> FeatureResult<BTreeMap<MonthKey, SunspotFeatures>> {
    cfg.validate()?;
    let grid = to_monthly_grid(records);
    if grid.is_empty() {
        return Err(FeatureError::NoSunspots);
    }

    let values: Vec<Option<f64>> = grid.iter().map(|(_, v)| *v).collect();
    let ma = rolling_mean(&values, cfg.ma_window);
    let z_exp = expanding_zscore(&values, cfg.expanding_min_periods);
    let d1 = diff(&values);
    let d2 = diff(&d1);
    let threshold = quantile(&values, cfg.regime_quantile).ok_or(FeatureError::NoSunspots)?;

    tracing::debug!(
        months = grid.len(),
        regime_threshold = threshold,
        quantile = cfg.regime_quantile,
        "Computed full-history sunspot features"
    );

    Ok(grid
        .iter()
        .enumerate()
        .map(|(i, (month, sn))| {
            (
                *month,
                SunspotFeatures {
                    sn: *sn,
                    sn_z: None,
                    sn_z_expanding: z_exp[i],
                    sn_ma24: ma[i],
                    sn_regime80: sn.is_some_and(|v| v >= threshold),
                    sn_diff: d1[i],
                    sn_accel: d2[i],
                },
            )
        })
        .collect())
}

/// Restrict full-history features to the study slice and add the
/// study-window z-score (`sn_z`, sample std).
pub fn study_window_features(
    full: &BTreeMap<MonthKey, SunspotFeatures>,
    window: &StudyWindow,
) -> FeatureResult<BTreeMap<MonthKey, SunspotFeatures>> {
    let mut sliced = BTreeMap::new();
    for (month, f) in full {
        if window.contains_sunspot_month(*month)? {
            sliced.insert(*month, f.clone());
        }
    }

    if let Some((mean, std)) = sample_moments(sliced.values().filter_map(|f| f.sn)) {
        if std > 0.0 {
            for f in sliced.values_mut() {
                f.sn_z = f.sn.map(|v| (v - mean) / std);
            }
        }
    }

    Ok(sliced)
}
