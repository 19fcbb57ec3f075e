use solarquant_data::DataError;
use solarquant_models::MonthKeyError;

pub type FeatureResult<T> = Result<T, FeatureError>;

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Invalid month: {0}")]
    Month(#[from] MonthKeyError),

    #[error("Invalid feature configuration: {0}")]
    InvalidConfig(String),

    #[error("No sunspot observations in SILSO input")]
    NoSunspots,

    #[error("Dataset is empty: no month has both market and risk-free returns")]
    EmptyDataset,
}
