//! # SolarQuant Data
//!
//! Acquisition and normalization of the study's raw inputs.
//!
//! ## Inputs
//! - Daily S&P 500 adjusted close (`^GSPC`)
//! - Daily 13-week T-bill yield, % p.a. (`^IRX`), the risk-free proxy
//! - SILSO monthly total sunspot number (`SN_m_tot_V2.0.txt`)
//!
//! ## Contents
//! - `silso`: sunspot file parser + data-quality summary
//! - `prices`: `Date,Adj Close` CSV codec
//! - `resample`: month-end / month-mean resampling, log returns, realized volatility
//! - `source`: `MarketDataSource` trait and the local `DirectorySource`
//! - `http`: `HttpSource` (Yahoo Finance chart API + SILSO)

pub mod error;
pub mod http;
pub mod prices;
pub mod resample;
pub mod silso;
pub mod source;

pub use error::{DataError, DataResult};
pub use http::{HttpSource, HttpSourceConfig};
pub use resample::{MonthlyRealizedVol, MonthlySeries};
pub use silso::{SilsoSummary, parse_silso_monthly};
pub use source::{DirectorySource, MarketDataSource, daily_file_name};
