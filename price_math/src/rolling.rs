//! Trailing-window statistics
//!
//! All functions work on plain slices ordered oldest to newest. A trailing
//! window of size `n` is the last `n` elements of the slice.

use crate::{MathError, Result};

/// Return the last `window` values of `values`
pub fn tail(values: &[f64], window: usize) -> Result<&[f64]> {
    if window == 0 {
        return Err(MathError::InvalidInput(
            "Window must be greater than zero".to_string(),
        ));
    }
    if values.len() < window {
        return Err(MathError::InsufficientData(format!(
            "Need {} values for the window, have {}.",
            window,
            values.len()
        )));
    }

    Ok(&values[values.len() - window..])
}

/// Arithmetic mean of a slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot take the mean of an empty slice".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std_dev(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Sample standard deviation needs at least 2 values, have {}.",
            values.len()
        )));
    }

    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|&value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;

    Ok(variance.sqrt())
}

/// Mean of the trailing window
pub fn trailing_mean(values: &[f64], window: usize) -> Result<f64> {
    mean(tail(values, window)?)
}

/// Sample standard deviation of the trailing window
pub fn trailing_std_dev(values: &[f64], window: usize) -> Result<f64> {
    sample_std_dev(tail(values, window)?)
}
