//! Newey-West heteroskedasticity and autocorrelation consistent covariance.
//!
//! V = (XᵀX)⁻¹ S (XᵀX)⁻¹ with
//! S = Γ₀ + Σ_{l=1..L} w_l (Γ_l + Γ_lᵀ), Γ_l = Σ_t g_t g_{t-l}ᵀ, g_t = x_t u_t,
//! and Bartlett weights w_l = 1 - l / (L + 1).

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::ols::OlsFit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HacConfig {
    /// Fixed lag truncation; `None` applies `default_lags(n)`
    pub lags: Option<usize>,
    /// Scale by n / (n - k)
    pub small_sample_correction: bool,
}

impl Default for HacConfig {
    fn default() -> Self {
        Self {
            lags: None,
            small_sample_correction: true,
        }
    }
}

impl HacConfig {
    /// Lag truncation used for a sample of `n` observations (at most n - 1).
    pub fn lags_for(&self, n: usize) -> usize {
        self.lags
            .unwrap_or_else(|| default_lags(n))
            .min(n.saturating_sub(1))
    }
}

/// Newey-West (1994) plug-in rule: floor(4 · (n / 100)^(2/9)).
pub fn default_lags(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    (4.0 * (n as f64 / 100.0).powf(2.0 / 9.0)).floor() as usize
}

pub fn bartlett_weight(lag: usize, max_lag: usize) -> f64 {
    1.0 - lag as f64 / (max_lag as f64 + 1.0)
}

/// HAC covariance of the OLS coefficients.
pub fn newey_west_cov(x: &DMatrix<f64>, fit: &OlsFit, lags: usize, small_sample_correction: bool) -> DMatrix<f64> {
    let n = x.nrows();
    let k = x.ncols();

    // Score rows g_t = x_t * u_t
    let mut g = x.clone();
    for (t, mut row) in g.row_iter_mut().enumerate() {
        row *= fit.residuals[t];
    }

    let mut s = g.transpose() * &g;
    for l in 1..=lags.min(n.saturating_sub(1)) {
        let lead = g.rows(l, n - l);
        let lagged = g.rows(0, n - l);
        let gamma = lead.transpose() * lagged;
        let w = bartlett_weight(l, lags);
        s += (&gamma + gamma.transpose()) * w;
    }

    let mut cov = &fit.xtx_inv * s * &fit.xtx_inv;
    if small_sample_correction && n > k {
        cov *= n as f64 / (n - k) as f64;
    }
    cov
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ols::fit_ols;
    use nalgebra::DVector;

    fn sample() -> (DMatrix<f64>, DVector<f64>) {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let x = DMatrix::from_fn(5, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
        let y = DVector::from_vec(vec![1.0, 3.0, 2.0, 5.0, 4.0]);
        (x, y)
    }

    // For a simple regression the slope variance reduces to
    // Σ_t Σ_s w_|t-s| h_t h_s / Sxx² with h_t = (x_t - x̄) u_t.
    // Here h = [0.8, -0.8, 0, 1.2, -1.2] and Sxx = 10.

    #[test]
    fn test_zero_lags_is_white_hc0() {
        let (x, y) = sample();
        let fit = fit_ols(&x, &y).unwrap();
        let cov = newey_west_cov(&x, &fit, 0, false);
        // Σ h² = 4.16
        assert!((cov[(1, 1)] - 0.0416).abs() < 1e-12);
    }

    #[test]
    fn test_one_lag_bartlett() {
        let (x, y) = sample();
        let fit = fit_ols(&x, &y).unwrap();
        let cov = newey_west_cov(&x, &fit, 1, false);
        // 4.16 + 2 * 0.5 * (-2.08) = 2.08
        assert!((cov[(1, 1)] - 0.0208).abs() < 1e-12);
    }

    #[test]
    fn test_small_sample_correction() {
        let (x, y) = sample();
        let fit = fit_ols(&x, &y).unwrap();
        let raw = newey_west_cov(&x, &fit, 1, false);
        let corrected = newey_west_cov(&x, &fit, 1, true);
        assert!((corrected[(1, 1)] - raw[(1, 1)] * 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cov_is_symmetric() {
        let (x, y) = sample();
        let fit = fit_ols(&x, &y).unwrap();
        let cov = newey_west_cov(&x, &fit, 3, true);
        assert!((cov[(0, 1)] - cov[(1, 0)]).abs() < 1e-12);
    }

    #[test]
    fn test_default_lags() {
        assert_eq!(default_lags(0), 0);
        assert_eq!(default_lags(5), 2);
        assert_eq!(default_lags(100), 4);
        assert_eq!(default_lags(240), 4);
        assert_eq!(default_lags(1000), 6);
    }

    #[test]
    fn test_lags_capped_by_sample() {
        let cfg = HacConfig {
            lags: Some(12),
            small_sample_correction: true,
        };
        assert_eq!(cfg.lags_for(5), 4);
        assert_eq!(HacConfig::default().lags_for(240), 4);
    }
}
