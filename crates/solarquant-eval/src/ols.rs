//! Ordinary least squares.

use nalgebra::{DMatrix, DVector};

use crate::error::{EvalError, EvalResult};

/// Smallest accepted ratio of smallest to largest singular value of X.
const RANK_TOLERANCE: f64 = 1e-10;

/// Result of an OLS fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta: DVector<f64>,
    pub residuals: DVector<f64>,
    /// (XᵀX)⁻¹, reused by the covariance estimators
    pub xtx_inv: DMatrix<f64>,
    pub n: usize,
    pub k: usize,
    pub ssr: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
}

impl OlsFit {
    /// Residual variance estimate s² = SSR / (n - k).
    pub fn sigma2(&self) -> f64 {
        self.ssr / (self.n - self.k) as f64
    }

    /// Classical (homoskedastic) covariance s²(XᵀX)⁻¹.
    pub fn classical_cov(&self) -> DMatrix<f64> {
        &self.xtx_inv * self.sigma2()
    }
}

/// Fit `y = Xβ + ε`. `X` must include the intercept column.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> EvalResult<OlsFit> {
    let n = x.nrows();
    let k = x.ncols();
    if y.len() != n {
        return Err(EvalError::DimensionMismatch(format!(
            "X has {} rows, y has {}",
            n,
            y.len()
        )));
    }
    if n <= k {
        return Err(EvalError::InsufficientData {
            required: k,
            actual: n,
        });
    }

    // Rank check on X itself; inverting a numerically singular XᵀX can
    // succeed with garbage pivots.
    let sv = x.clone().singular_values();
    let (sv_max, sv_min) = (sv.max(), sv.min());
    if !(sv_max > 0.0) || sv_min / sv_max < RANK_TOLERANCE {
        return Err(EvalError::SingularDesign);
    }

    let xt = x.transpose();
    let xtx_inv = (&xt * x).try_inverse().ok_or(EvalError::SingularDesign)?;
    let beta = &xtx_inv * (&xt * y);
    if beta.iter().any(|b| !b.is_finite()) {
        return Err(EvalError::SingularDesign);
    }

    let residuals = y - x * &beta;
    let ssr = residuals.norm_squared();
    let y_mean = y.mean();
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / (n - k) as f64;

    Ok(OlsFit {
        beta,
        residuals,
        xtx_inv,
        n,
        k,
        ssr,
        r_squared,
        adj_r_squared,
    })
}
