pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Insufficient data: need more than {required} complete observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Design matrix is singular (collinear regressors)")]
    SingularDesign,

    #[error("Non-finite value in {0}")]
    NonFinite(String),

    #[error("Zero HAC standard error for {0}: t-statistic undefined")]
    ZeroStandardError(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Distribution error: {0}")]
    Distribution(String),

    #[error("Report serialization failed: {0}")]
    Serialization(String),
}
