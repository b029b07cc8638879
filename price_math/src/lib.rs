//! # Price Math
//!
//! Numeric building blocks for price series analysis.
//! This crate provides the trailing-window statistics used to build model
//! features, period returns and streaks used for volatility analysis, and
//! quantiles with linear interpolation.

use thiserror::Error;

pub mod quantile;
pub mod returns;
pub mod rolling;

/// Errors that can occur in price series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for price math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub use quantile::quantile;
pub use returns::{differences, pct_change, streaks, Streaks};
pub use rolling::{mean, sample_std_dev, tail};
