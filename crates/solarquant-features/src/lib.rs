//! # SolarQuant Features
//!
//! Turns raw market and sunspot inputs into the aligned monthly dataset.
//!
//! ## Contents
//! - `window`: study window (trailing N years ending on a date)
//! - `sunspot`: full-history sunspot features + study-window z-score
//! - `dataset`: resampling, joins and the one-month look-ahead-free lag

pub mod dataset;
pub mod error;
pub mod sunspot;
pub mod window;

pub use dataset::{
    DatasetSummary, MarketInputs, MonthlyDataset, build_from_source, build_monthly_dataset,
    load_inputs,
};
pub use error::{FeatureError, FeatureResult};
pub use sunspot::FeatureConfig;
pub use window::StudyWindow;
