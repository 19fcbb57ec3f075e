//! Monthly dataset assembly.
//!
//! ## Alignment rule
//! Sunspot features observed in month M are attached to the return of month
//! M+1 (`sn_lag1`). Nothing from month M's own sunspot record reaches month M.
//!
//! ## Join
//! Market month-end prices and month-mean risk-free yields are inner-joined on
//! month; lagged sunspot features are left-joined; rows without an excess
//! return are dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use solarquant_data::{MarketDataSource, parse_silso_monthly, resample, silso};
use solarquant_models::{DailyObservation, MonthKey, MonthlyRow, SunspotFeatures, SunspotRecord};
use tracing::{info, warn};

use crate::error::{FeatureError, FeatureResult};
use crate::sunspot::{FeatureConfig, full_history_features, study_window_features};
use crate::window::StudyWindow;

/// Raw inputs of one dataset build.
#[derive(Debug, Clone)]
pub struct MarketInputs {
    pub market: Vec<DailyObservation>,
    pub risk_free: Vec<DailyObservation>,
    pub sunspots: Vec<SunspotRecord>,
}

/// Data-quality summary of a built dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub start: Option<MonthKey>,
    pub end: Option<MonthKey>,
    pub rows: usize,
    pub rows_with_sunspot_features: usize,
    pub sunspot_missing_values: usize,
    pub sunspot_missing_periods: usize,
    /// Study-slice months whose 24-month mean is undefined
    pub sunspot_ma_gaps_in_window: usize,
}

#[derive(Debug, Clone)]
pub struct MonthlyDataset {
    pub rows: Vec<MonthlyRow>,
    pub summary: DatasetSummary,
}

/// Load all inputs for `window` from `source`.
pub fn load_inputs(
    source: &dyn MarketDataSource,
    market_symbol: &str,
    risk_free_symbol: &str,
    window: &StudyWindow,
) -> FeatureResult<MarketInputs> {
    let market = source.daily_adj_close(market_symbol, window.start_date, window.end_date)?;
    let risk_free = source.daily_adj_close(risk_free_symbol, window.start_date, window.end_date)?;
    let sunspots = parse_silso_monthly(&source.sunspot_monthly_text()?)?;
    info!(
        market_symbol,
        market_obs = market.len(),
        risk_free_symbol,
        risk_free_obs = risk_free.len(),
        sunspot_months = sunspots.len(),
        "Loaded study inputs"
    );
    Ok(MarketInputs {
        market,
        risk_free,
        sunspots,
    })
}

/// Build the aligned monthly dataset.
pub fn build_monthly_dataset(
    inputs: &MarketInputs,
    window: &StudyWindow,
    cfg: &FeatureConfig,
) -> FeatureResult<MonthlyDataset> {
    // Sunspot data quality
    let sn_summary = silso::summarize(&inputs.sunspots);
    info!(
        missing_values = sn_summary.missing_values,
        missing_periods = sn_summary.missing_periods,
        "[SN] Sunspot data quality"
    );
    if sn_summary.missing_periods > 0 {
        let examples: Vec<String> = sn_summary
            .missing_period_examples
            .iter()
            .map(|m| m.to_string())
            .collect();
        warn!(examples = ?examples, "[SN] Missing monthly periods in SILSO index range");
    }

    // Sunspot features: full history, then study slice
    let full = full_history_features(&inputs.sunspots, cfg)?;
    let sliced = study_window_features(&full, window)?;
    let ma_gaps = sliced.values().filter(|f| f.sn_ma24.is_none()).count();
    if ma_gaps > 0 {
        warn!(ma_gaps, "[SN] Undefined rolling means after slicing");
    }

    // Market side
    let spx_m = resample::last_per_month(&inputs.market)?;
    let spx_ret = resample::monthly_log_returns(&spx_m);
    let rv = resample::realized_volatility(&inputs.market)?;
    let rf_m = resample::mean_per_month(&inputs.risk_free)?;

    let rows = join_rows(&spx_m, &spx_ret, &rf_m, &rv, &sliced);
    if rows.is_empty() {
        return Err(FeatureError::EmptyDataset);
    }

    let summary = DatasetSummary {
        start: rows.first().map(|r| r.month),
        end: rows.last().map(|r| r.month),
        rows: rows.len(),
        rows_with_sunspot_features: rows.iter().filter(|r| r.sn_lag1.is_some()).count(),
        sunspot_missing_values: sn_summary.missing_values,
        sunspot_missing_periods: sn_summary.missing_periods,
        sunspot_ma_gaps_in_window: ma_gaps,
    };
    info!(
        start = ?summary.start.map(|m| m.to_string()),
        end = ?summary.end.map(|m| m.to_string()),
        rows = summary.rows,
        with_features = summary.rows_with_sunspot_features,
        "[Monthly dataset] built"
    );

    Ok(MonthlyDataset { rows, summary })
}

fn join_rows(
    spx_m: &resample::MonthlySeries,
    spx_ret: &resample::MonthlySeries,
    rf_m: &resample::MonthlySeries,
    rv: &BTreeMap<MonthKey, resample::MonthlyRealizedVol>,
    sunspots: &BTreeMap<MonthKey, SunspotFeatures>,
) -> Vec<MonthlyRow> {
    spx_m
        .iter()
        .filter(|(m, _)| rf_m.contains_key(*m))
        .filter_map(|(month, close)| {
            let spx_log_ret_m = spx_ret.get(month).copied().flatten();
            let rf_yield_pct_pa_m = rf_m.get(month).copied().flatten();
            let rf_log_ret_m = rf_yield_pct_pa_m.map(resample::risk_free_log_return);
            let excess_log_ret_m = match (spx_log_ret_m, rf_log_ret_m) {
                (Some(r), Some(rf)) => Some(r - rf),
                _ => None,
            };
            // dropna on the target
            excess_log_ret_m?;

            let vol = rv.get(month);
            Some(MonthlyRow {
                month: *month,
                spx_adj_close_m: *close,
                spx_log_ret_m,
                rf_yield_pct_pa_m,
                rf_log_ret_m,
                excess_log_ret_m,
                realized_vol_m: vol.and_then(|v| v.vol),
                trading_days: vol.map(|v| v.trading_days).unwrap_or(0),
                sn_lag1: month.pred().and_then(|prev| sunspots.get(&prev)).cloned(),
            })
        })
        .collect()
}

/// Load inputs from `source` and build the dataset in one step.
pub fn build_from_source(
    source: &dyn MarketDataSource,
    market_symbol: &str,
    risk_free_symbol: &str,
    window: &StudyWindow,
    cfg: &FeatureConfig,
) -> FeatureResult<MonthlyDataset> {
    let inputs = load_inputs(source, market_symbol, risk_free_symbol, window)?;
    build_monthly_dataset(&inputs, window, cfg)
}
