//! Model grid: every target × predictor × seasonal-control combination.

use serde::{Deserialize, Serialize};
use solarquant_models::{MonthKey, MonthlyRow, SunspotFeature};
use tracing::{info, warn};

use crate::design::{ModelSpec, Target, build_design};
use crate::error::{EvalError, EvalResult};
use crate::hac::{HacConfig, newey_west_cov};
use crate::inference::Inference;
use crate::ols::fit_ols;

/// Which models to fit and how to do inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionConfig {
    pub targets: Vec<Target>,
    pub predictors: Vec<SunspotFeature>,
    /// Seasonal-control variants to fit (e.g. `[false, true]`)
    pub seasonal: Vec<bool>,
    pub hac: HacConfig,
    pub inference: Inference,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            targets: Target::ALL.to_vec(),
            predictors: vec![SunspotFeature::SnZ],
            seasonal: vec![false, true],
            hac: HacConfig::default(),
            inference: Inference::Normal,
        }
    }
}

impl RegressionConfig {
    /// Model specs in report order: target, predictor, then seasonal variant.
    pub fn specs(&self) -> Vec<ModelSpec> {
        let mut specs = Vec::new();
        for target in &self.targets {
            for predictor in &self.predictors {
                for seasonal in &self.seasonal {
                    let spec = ModelSpec {
                        target: *target,
                        predictor: *predictor,
                        seasonal: *seasonal,
                    };
                    if !specs.contains(&spec) {
                        specs.push(spec);
                    }
                }
            }
        }
        specs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientEstimate {
    pub name: String,
    pub estimate: f64,
    pub std_error_ols: f64,
    pub std_error_hac: f64,
    pub t_stat: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFit {
    pub model: String,
    pub spec: ModelSpec,
    pub n_obs: usize,
    pub n_params: usize,
    pub first_month: Option<MonthKey>,
    pub last_month: Option<MonthKey>,
    /// Month of year absorbed by the intercept when seasonal dummies are used
    pub baseline_month: Option<u32>,
    pub hac_lags: usize,
    pub inference: Inference,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub residual_std_error: f64,
    pub coefficients: Vec<CoefficientEstimate>,
}

impl ModelFit {
    pub fn coefficient(&self, name: &str) -> Option<&CoefficientEstimate> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Estimate on the lagged sunspot predictor.
    pub fn predictor(&self) -> Option<&CoefficientEstimate> {
        self.coefficients.get(1)
    }
}

/// A model that could not be estimated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedModel {
    pub model: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudyOutcome {
    pub fits: Vec<ModelFit>,
    pub skipped: Vec<SkippedModel>,
}

/// Fit one model.
pub fn fit_model(rows: &[MonthlyRow], spec: &ModelSpec, cfg: &RegressionConfig) -> EvalResult<ModelFit> {
    let design = build_design(rows, spec)?;
    let fit = fit_ols(&design.x, &design.y)?;
    let lags = cfg.hac.lags_for(fit.n);
    let hac = newey_west_cov(&design.x, &fit, lags, cfg.hac.small_sample_correction);
    let ols = fit.classical_cov();
    let df = fit.n - fit.k;

    let mut coefficients = Vec::with_capacity(fit.k);
    for (j, name) in design.columns.iter().enumerate() {
        coefficients.push(coefficient_estimate(
            name,
            fit.beta[j],
            ols[(j, j)].max(0.0).sqrt(),
            hac[(j, j)].max(0.0).sqrt(),
            df,
            cfg.inference,
        )?);
    }

    Ok(ModelFit {
        model: spec.name(),
        spec: *spec,
        n_obs: fit.n,
        n_params: fit.k,
        first_month: design.months.first().copied(),
        last_month: design.months.last().copied(),
        baseline_month: design.baseline_month,
        hac_lags: lags,
        inference: cfg.inference,
        r_squared: fit.r_squared,
        adj_r_squared: fit.adj_r_squared,
        residual_std_error: fit.sigma2().sqrt(),
        coefficients,
    })
}

/// t-statistic and p-value of one coefficient. A zero HAC standard error
/// leaves the t-statistic undefined and fails the model.
fn coefficient_estimate(
    name: &str,
    estimate: f64,
    std_error_ols: f64,
    std_error_hac: f64,
    df: usize,
    inference: Inference,
) -> EvalResult<CoefficientEstimate> {
    if std_error_hac.is_nan() || std_error_hac <= 0.0 {
        return Err(EvalError::ZeroStandardError(name.to_string()));
    }
    let t_stat = estimate / std_error_hac;
    Ok(CoefficientEstimate {
        name: name.to_string(),
        estimate,
        std_error_ols,
        std_error_hac,
        t_stat,
        p_value: inference.p_value(t_stat, df)?,
    })
}

/// Fit the whole grid. Models that cannot be estimated are reported as skipped.
pub fn run_study(rows: &[MonthlyRow], cfg: &RegressionConfig) -> StudyOutcome {
    let mut outcome = StudyOutcome::default();
    for spec in cfg.specs() {
        match fit_model(rows, &spec, cfg) {
            Ok(fit) => {
                if let Some(beta) = fit.predictor() {
                    info!(
                        model = %fit.model,
                        n = fit.n_obs,
                        beta = beta.estimate,
                        t_hac = beta.t_stat,
                        p = beta.p_value,
                        r2 = fit.r_squared,
                        "Fitted model"
                    );
                }
                outcome.fits.push(fit);
            }
            Err(e) => {
                warn!(model = %spec.name(), error = %e, "Skipping model");
                outcome.skipped.push(SkippedModel {
                    model: spec.name(),
                    reason: e.to_string(),
                });
            }
        }
    }
    outcome
}
