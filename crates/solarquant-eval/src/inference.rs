//! Two-sided p-values for coefficient t-statistics.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::{EvalError, EvalResult};

/// Reference distribution of the t-statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inference {
    /// Asymptotic standard normal (usual for HAC inference)
    #[default]
    Normal,
    /// Student-t with n - k degrees of freedom
    StudentT,
}

impl Inference {
    pub fn p_value(&self, t_stat: f64, df: usize) -> EvalResult<f64> {
        if t_stat.is_nan() {
            return Err(EvalError::NonFinite("t-statistic".to_string()));
        }
        let tail = match self {
            Inference::Normal => Normal::new(0.0, 1.0)
                .map_err(|e| EvalError::Distribution(e.to_string()))?
                .sf(t_stat.abs()),
            Inference::StudentT => StudentsT::new(0.0, 1.0, df as f64)
                .map_err(|e| EvalError::Distribution(e.to_string()))?
                .sf(t_stat.abs()),
        };
        Ok((2.0 * tail).min(1.0))
    }
}
