//! Monthly study dataset rows.
//!
//! `MonthlyRow` is the in-memory shape used by the pipeline; `DatasetRecord`
//! is the flat form written to / read from `dataset.csv`.

use serde::{Deserialize, Serialize};

use crate::features::SunspotFeatures;
use crate::month::MonthKey;

/// One month of the aligned dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRow {
    pub month: MonthKey,
    /// Last adjusted close of the month
    pub spx_adj_close_m: Option<f64>,
    pub spx_log_ret_m: Option<f64>,
    /// Mean yield of the month, % p.a.
    pub rf_yield_pct_pa_m: Option<f64>,
    pub rf_log_ret_m: Option<f64>,
    pub excess_log_ret_m: Option<f64>,
    /// sqrt of the sum of squared daily log returns within the month
    pub realized_vol_m: Option<f64>,
    pub trading_days: u32,
    /// Sunspot features of the previous calendar month.
    pub sn_lag1: Option<SunspotFeatures>,
}

/// Flat CSV record. Column names match the study's published dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub month: MonthKey,
    pub spx_adj_close_m: Option<f64>,
    pub spx_log_ret_m: Option<f64>,
    pub rf_yield_pct_pa_m: Option<f64>,
    pub rf_log_ret_m: Option<f64>,
    pub excess_log_ret_m: Option<f64>,
    pub realized_vol_m: Option<f64>,
    pub trading_days: u32,
    pub sn_sn_lag1: Option<f64>,
    pub sn_sn_z_lag1: Option<f64>,
    pub sn_sn_z_expanding_lag1: Option<f64>,
    pub sn_sn_ma24_lag1: Option<f64>,
    pub sn_sn_regime80_lag1: Option<bool>,
    pub sn_sn_diff_lag1: Option<f64>,
    pub sn_sn_accel_lag1: Option<f64>,
}

impl From<&MonthlyRow> for DatasetRecord {
    fn from(row: &MonthlyRow) -> Self {
        let f = row.sn_lag1.as_ref();
        Self {
            month: row.month,
            spx_adj_close_m: row.spx_adj_close_m,
            spx_log_ret_m: row.spx_log_ret_m,
            rf_yield_pct_pa_m: row.rf_yield_pct_pa_m,
            rf_log_ret_m: row.rf_log_ret_m,
            excess_log_ret_m: row.excess_log_ret_m,
            realized_vol_m: row.realized_vol_m,
            trading_days: row.trading_days,
            sn_sn_lag1: f.and_then(|f| f.sn),
            sn_sn_z_lag1: f.and_then(|f| f.sn_z),
            sn_sn_z_expanding_lag1: f.and_then(|f| f.sn_z_expanding),
            sn_sn_ma24_lag1: f.and_then(|f| f.sn_ma24),
            sn_sn_regime80_lag1: f.map(|f| f.sn_regime80),
            sn_sn_diff_lag1: f.and_then(|f| f.sn_diff),
            sn_sn_accel_lag1: f.and_then(|f| f.sn_accel),
        }
    }
}

impl From<DatasetRecord> for MonthlyRow {
    fn from(rec: DatasetRecord) -> Self {
        // The regime flag is always written when lagged features exist,
        // so its absence marks a row without a sunspot observation.
        let sn_lag1 = rec.sn_sn_regime80_lag1.map(|regime| SunspotFeatures {
            sn: rec.sn_sn_lag1,
            sn_z: rec.sn_sn_z_lag1,
            sn_z_expanding: rec.sn_sn_z_expanding_lag1,
            sn_ma24: rec.sn_sn_ma24_lag1,
            sn_regime80: regime,
            sn_diff: rec.sn_sn_diff_lag1,
            sn_accel: rec.sn_sn_accel_lag1,
        });
        Self {
            month: rec.month,
            spx_adj_close_m: rec.spx_adj_close_m,
            spx_log_ret_m: rec.spx_log_ret_m,
            rf_yield_pct_pa_m: rec.rf_yield_pct_pa_m,
            rf_log_ret_m: rec.rf_log_ret_m,
            excess_log_ret_m: rec.excess_log_ret_m,
            realized_vol_m: rec.realized_vol_m,
            trading_days: rec.trading_days,
            sn_lag1,
        }
    }
}
