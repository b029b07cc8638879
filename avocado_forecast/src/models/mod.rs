//! Pre-trained regression models
//!
//! The forecast engine only sees the [`RegressionModel`] capability: a scaled
//! feature vector goes in, a scaled scalar comes out. Concrete backends are
//! selected by the `kind` tag of the serialized model.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

pub mod linear;
pub mod persistence;
pub mod svr;

pub use linear::LinearRegressor;
pub use persistence::Persistence;
pub use svr::{Kernel, SupportVectorRegressor};

/// A fitted regression model
pub trait RegressionModel: Debug + Send + Sync {
    /// Predict a scaled target from a scaled feature vector
    fn predict(&self, input: &[f64]) -> Result<f64>;

    /// Number of inputs the model was fit on
    fn n_features(&self) -> usize;

    /// Name of the model
    fn name(&self) -> &str;

    /// Hyperparameters worth showing to a user
    fn parameters(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Serialized model, tagged by backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearRegressor),
    Svr(SupportVectorRegressor),
    Persistence(Persistence),
}

impl ModelSpec {
    /// Check the parameters and build a shareable model
    pub fn build(self) -> Result<Arc<dyn RegressionModel>> {
        Ok(match self {
            ModelSpec::Linear(model) => {
                model.check()?;
                Arc::new(model)
            }
            ModelSpec::Svr(model) => {
                model.check()?;
                Arc::new(model)
            }
            ModelSpec::Persistence(model) => Arc::new(model),
        })
    }

    pub fn n_features(&self) -> Option<usize> {
        match self {
            ModelSpec::Linear(model) => Some(model.n_features()),
            ModelSpec::Svr(model) => Some(model.n_features()),
            // the baseline reads one column and accepts any width covering it
            ModelSpec::Persistence(_) => None,
        }
    }
}

/// Holds the loaded model and guards every call into it
#[derive(Debug, Clone, Default)]
pub struct ModelAdapter {
    model: Option<Arc<dyn RegressionModel>>,
}

impl ModelAdapter {
    pub fn new(model: Arc<dyn RegressionModel>) -> Self {
        Self { model: Some(model) }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&Arc<dyn RegressionModel>> {
        self.model.as_ref()
    }

    /// Run inference on a scaled feature vector
    pub fn predict(&self, input: &[f64]) -> Result<f64> {
        let model = self.model.as_ref().ok_or(ForecastError::ModelNotLoaded)?;
        let output = model.predict(input)?;
        if !output.is_finite() {
            return Err(ForecastError::Inference(format!(
                "{} produced a non-finite output",
                model.name()
            )));
        }
        Ok(output)
    }
}

/// Shared input width check for backends
pub(crate) fn check_input(name: &str, expected: usize, input: &[f64]) -> Result<()> {
    if input.len() != expected {
        return Err(ForecastError::Inference(format!(
            "{} expects {} inputs, got {}",
            name,
            expected,
            input.len()
        )));
    }
    Ok(())
}
