//! # SolarQuant Models
//!
//! Canonical types shared by every SolarQuant crate.
//!
//! ## Contents
//! - `MonthKey`: calendar month index for all monthly series
//! - `DailyObservation` / `SunspotRecord`: raw inputs
//! - `SunspotFeatures` / `SunspotFeature`: engineered sunspot signal
//! - `MonthlyRow` / `DatasetRecord`: the aligned monthly dataset

pub mod dataset;
pub mod features;
pub mod month;
pub mod series;

pub use dataset::{DatasetRecord, MonthlyRow};
pub use features::{SunspotFeature, SunspotFeatures, UnknownFeature};
pub use month::{MonthKey, MonthKeyError};
pub use series::{DailyObservation, SunspotRecord};
