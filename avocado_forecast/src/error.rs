//! Error types for the avocado_forecast crate

use crate::validation::ValidationReport;
use chrono::NaiveDate;
use thiserror::Error;

/// Custom error types for the avocado_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Required columns are missing from a tabular source
    #[error("Schema error: missing column(s) {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A date or price cell could not be parsed
    #[error("Parse error at row {row}, column '{column}': {message}")]
    Parse {
        row: u64,
        column: String,
        message: String,
    },

    /// No usable records remained after loading
    #[error("Empty series: {0}")]
    EmptySeries(String),

    /// Not enough prior observations to build features for a date
    #[error(
        "Insufficient history for {target}: need {required} observations before it, have {available}"
    )]
    InsufficientHistory {
        target: NaiveDate,
        required: usize,
        available: usize,
    },

    /// Feature names or widths disagree with the model's feature columns
    #[error("Feature schema error: {0}")]
    FeatureSchema(String),

    /// Scaling was requested before scaling parameters were loaded
    #[error("Scaler not loaded: {0}")]
    ScalerNotLoaded(String),

    /// Inference was requested before a model was loaded
    #[error("Model not loaded")]
    ModelNotLoaded,

    /// The underlying model failed to produce a value
    #[error("Inference error: {0}")]
    Inference(String),

    /// A date string was malformed or not allowed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Aggregate validation failure
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data consistency
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from the CSV reader
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from the numeric helpers
    #[error("Math error: {0}")]
    MathError(#[from] price_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<ValidationReport> for ForecastError {
    fn from(report: ValidationReport) -> Self {
        ForecastError::Validation(report)
    }
}
