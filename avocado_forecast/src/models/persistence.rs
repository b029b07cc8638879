//! Persistence baseline: tomorrow looks like today

use crate::error::{ForecastError, Result};
use crate::models::RegressionModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Returns one input column unchanged, normally the most recent lag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persistence {
    pub feature_index: usize,
}

impl Persistence {
    pub fn new(feature_index: usize) -> Self {
        Self { feature_index }
    }
}

impl RegressionModel for Persistence {
    fn predict(&self, input: &[f64]) -> Result<f64> {
        input.get(self.feature_index).copied().ok_or_else(|| {
            ForecastError::Inference(format!(
                "persistence model reads input {}, got {} inputs",
                self.feature_index,
                input.len()
            ))
        })
    }

    fn n_features(&self) -> usize {
        self.feature_index + 1
    }

    fn name(&self) -> &str {
        "Persistence"
    }

    fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("feature_index".to_string(), self.feature_index.to_string());
        params
    }
}
