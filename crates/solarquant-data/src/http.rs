//! HTTP source: Yahoo Finance chart API for daily series, SILSO for sunspots.

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use solarquant_models::DailyObservation;
use tracing::info;

use crate::error::{DataError, DataResult};
use crate::silso::SILSO_SN_MONTHLY_URL;
use crate::source::MarketDataSource;

pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const DEFAULT_USER_AGENT: &str = concat!("solarquant/", env!("CARGO_PKG_VERSION"));

/// Endpoints and transport settings for `HttpSource`.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    pub yahoo_chart_base_url: String,
    pub sunspot_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            yahoo_chart_base_url: YAHOO_CHART_BASE_URL.to_string(),
            sunspot_url: SILSO_SN_MONTHLY_URL.to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    adjclose: Vec<Option<f64>>,
}

/// Blocking HTTP data source.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    config: HttpSourceConfig,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig) -> DataResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|source| DataError::Http {
                url: config.yahoo_chart_base_url.clone(),
                source,
            })?;
        Ok(Self { client, config })
    }

    fn get_text(&self, url: &str) -> DataResult<String> {
        let http_err = |source| DataError::Http {
            url: url.to_string(),
            source,
        };
        self.client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(http_err)
    }
}

/// Midnight UTC of `date` as unix seconds.
fn epoch_secs(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Decode a chart API payload into daily observations.
///
/// Timestamps are shifted by the exchange `gmtoffset` before taking the date,
/// so a 09:30 New York bar is dated on its New York trading day.
fn parse_chart_payload(symbol: &str, body: &str) -> DataResult<Vec<DailyObservation>> {
    let download_err = |reason: String| DataError::Download {
        symbol: symbol.to_string(),
        reason,
    };

    let resp: ChartResponse =
        serde_json::from_str(body).map_err(|e| download_err(format!("invalid chart JSON: {}", e)))?;

    if let Some(err) = resp.chart.error {
        return Err(download_err(format!(
            "{}: {}",
            err.code.unwrap_or_default(),
            err.description.unwrap_or_default()
        )));
    }

    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| download_err("empty chart result".to_string()))?;

    let adj = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .ok_or_else(|| download_err("Adj Close not found in chart payload".to_string()))?
        .adjclose;

    if adj.len() != result.timestamp.len() {
        return Err(download_err(format!(
            "timestamp/adjclose length mismatch: {} vs {}",
            result.timestamp.len(),
            adj.len()
        )));
    }

    let mut out: Vec<DailyObservation> = Vec::with_capacity(adj.len());
    for (ts, value) in result.timestamp.iter().zip(adj) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        let date = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .ok_or_else(|| download_err(format!("timestamp out of range: {}", ts)))?
            .date_naive();
        // Intraday snapshots of the current day can repeat the last date
        if let Some(last) = out.last_mut() {
            if last.date == date {
                last.value = value;
                continue;
            }
        }
        out.push(DailyObservation::new(date, value));
    }

    if out.is_empty() {
        return Err(download_err("no observations returned".to_string()));
    }
    Ok(out)
}

/// Daily chart URL covering `start..=end`. The API's `period2` is exclusive,
/// so it is set to the day after `end`.
fn chart_url(base_url: &str, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    let end_exclusive = end.succ_opt().unwrap_or(end);
    format!(
        "{}/{}?period1={}&period2={}&interval=1d&events=history&includeAdjustedClose=true",
        base_url.trim_end_matches('/'),
        symbol.replace('^', "%5E"),
        epoch_secs(start),
        epoch_secs(end_exclusive),
    )
}

/// Keep observations dated in `start..=end`. Nothing left is a download failure.
fn observations_in_window(
    symbol: &str,
    mut obs: Vec<DailyObservation>,
    start: NaiveDate,
    end: NaiveDate,
) -> DataResult<Vec<DailyObservation>> {
    obs.retain(|o| o.date >= start && o.date <= end);
    if obs.is_empty() {
        return Err(DataError::Download {
            symbol: symbol.to_string(),
            reason: format!("no observations in window {}..={}", start, end),
        });
    }
    Ok(obs)
}

impl MarketDataSource for HttpSource {
    fn daily_adj_close(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DataResult<Vec<DailyObservation>> {
        let url = chart_url(&self.config.yahoo_chart_base_url, symbol, start, end);
        let body = self.get_text(&url)?;
        let obs = observations_in_window(symbol, parse_chart_payload(symbol, &body)?, start, end)?;
        info!(symbol, observations = obs.len(), "Downloaded daily series");
        Ok(obs)
    }

    fn sunspot_monthly_text(&self) -> DataResult<String> {
        let text = self.get_text(&self.config.sunspot_url)?;
        info!(url = %self.config.sunspot_url, bytes = text.len(), "Downloaded SILSO monthly sunspot file");
        Ok(text)
    }
}
