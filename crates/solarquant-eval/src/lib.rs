//! # SolarQuant Eval
//!
//! Regression study of market returns on lagged sunspot features.
//!
//! ## Contents
//! - `design`: model specs and complete-case design matrices with month-of-year dummies
//! - `ols`: least squares fit with rank check
//! - `hac`: Newey-West covariance (Bartlett kernel)
//! - `inference`: two-sided p-values
//! - `study`: the target × predictor × seasonal grid
//! - `report`: deterministic report with SHA-256 digest

pub mod design;
pub mod error;
pub mod hac;
pub mod inference;
pub mod ols;
pub mod report;
pub mod study;

pub use design::{Design, INTERCEPT, ModelSpec, Target, build_design};
pub use error::{EvalError, EvalResult};
pub use hac::{HacConfig, bartlett_weight, default_lags, newey_west_cov};
pub use inference::Inference;
pub use ols::{OlsFit, fit_ols};
pub use report::{ReportDataset, STUDY_REPORT_SCHEMA_VERSION, StudyReport};
pub use study::{
    CoefficientEstimate, ModelFit, RegressionConfig, SkippedModel, StudyOutcome, fit_model,
    run_study,
};
