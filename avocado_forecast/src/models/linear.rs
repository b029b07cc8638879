//! Linear regression model

use crate::error::{ForecastError, Result};
use crate::models::{check_input, RegressionModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `y = intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        let model = Self {
            coefficients,
            intercept,
        };
        model.check()?;
        Ok(model)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.coefficients.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "Linear model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "Linear model parameters must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl RegressionModel for LinearRegressor {
    fn predict(&self, input: &[f64]) -> Result<f64> {
        check_input(self.name(), self.coefficients.len(), input)?;
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(input)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn name(&self) -> &str {
        "Linear Regression"
    }

    fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("intercept".to_string(), format!("{}", self.intercept));
        params
    }
}
