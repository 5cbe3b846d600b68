//! Error types for the fraud benchmark

use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, FraudBenchError>;

/// Main error type for the benchmark
#[derive(Error, Debug)]
pub enum FraudBenchError {
    #[error("Unknown dataset key: {0}")]
    UnknownDataset(String),

    #[error("Dataset '{key}' unavailable: {path} not found")]
    DatasetUnavailable { key: String, path: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),
}

impl From<polars::error::PolarsError> for FraudBenchError {
    fn from(err: polars::error::PolarsError) -> Self {
        FraudBenchError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for FraudBenchError {
    fn from(err: serde_json::Error) -> Self {
        FraudBenchError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for FraudBenchError {
    fn from(err: ndarray::ShapeError) -> Self {
        FraudBenchError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
