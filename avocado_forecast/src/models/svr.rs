//! Kernel support vector regression
//!
//! A fitted SVR predicts `f(x) = Σ αᵢ K(svᵢ, x) + b` over its support
//! vectors, where αᵢ are the dual coefficients.

use crate::error::{ForecastError, Result};
use crate::models::{check_input, RegressionModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kernel function of a fitted SVR
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf {
        gamma: f64,
    },
    Poly {
        degree: u32,
        gamma: f64,
        #[serde(default)]
        coef0: f64,
    },
    Sigmoid {
        gamma: f64,
        #[serde(default)]
        coef0: f64,
    },
}

impl Kernel {
    fn apply(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Kernel::Linear => dot(a, b),
            Kernel::Rbf { gamma } => {
                let squared_distance: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * squared_distance).exp()
            }
            Kernel::Poly {
                degree,
                gamma,
                coef0,
            } => (gamma * dot(a, b) + coef0).powi(degree as i32),
            Kernel::Sigmoid { gamma, coef0 } => (gamma * dot(a, b) + coef0).tanh(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Kernel::Linear => "linear",
            Kernel::Rbf { .. } => "rbf",
            Kernel::Poly { .. } => "poly",
            Kernel::Sigmoid { .. } => "sigmoid",
        }
    }

    fn gamma(&self) -> Option<f64> {
        match *self {
            Kernel::Linear => None,
            Kernel::Rbf { gamma } | Kernel::Poly { gamma, .. } | Kernel::Sigmoid { gamma, .. } => {
                Some(gamma)
            }
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Fitted epsilon-SVR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorRegressor {
    pub kernel: Kernel,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub intercept: f64,
    /// Regularization used at training time, informational only
    #[serde(default)]
    pub c: Option<f64>,
    /// Epsilon tube used at training time, informational only
    #[serde(default)]
    pub epsilon: Option<f64>,
}

impl SupportVectorRegressor {
    pub(crate) fn check(&self) -> Result<()> {
        if self.support_vectors.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "SVR model has no support vectors".to_string(),
            ));
        }
        if self.support_vectors.len() != self.dual_coef.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "SVR model has {} support vectors but {} dual coefficients",
                self.support_vectors.len(),
                self.dual_coef.len()
            )));
        }

        let width = self.support_vectors[0].len();
        if width == 0 || self.support_vectors.iter().any(|sv| sv.len() != width) {
            return Err(ForecastError::InvalidParameter(
                "SVR support vectors must share one non-zero width".to_string(),
            ));
        }
        let finite = self.intercept.is_finite()
            && self.dual_coef.iter().all(|a| a.is_finite())
            && self.support_vectors.iter().flatten().all(|v| v.is_finite());
        if !finite {
            return Err(ForecastError::InvalidParameter(
                "SVR model parameters must be finite".to_string(),
            ));
        }
        if let Some(gamma) = self.kernel.gamma() {
            if !gamma.is_finite() || gamma <= 0.0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "SVR kernel gamma must be positive, got {}",
                    gamma
                )));
            }
        }

        Ok(())
    }
}

impl RegressionModel for SupportVectorRegressor {
    fn predict(&self, input: &[f64]) -> Result<f64> {
        check_input(self.name(), self.n_features(), input)?;

        let decision: f64 = self
            .support_vectors
            .iter()
            .zip(&self.dual_coef)
            .map(|(sv, alpha)| alpha * self.kernel.apply(sv, input))
            .sum();

        Ok(decision + self.intercept)
    }

    fn n_features(&self) -> usize {
        self.support_vectors.first().map_or(0, Vec::len)
    }

    fn name(&self) -> &str {
        "Support Vector Regression"
    }

    fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("kernel".to_string(), self.kernel.label().to_string());
        if let Some(gamma) = self.kernel.gamma() {
            params.insert("gamma".to_string(), format!("{}", gamma));
        }
        if let Some(c) = self.c {
            params.insert("C".to_string(), format!("{}", c));
        }
        if let Some(epsilon) = self.epsilon {
            params.insert("epsilon".to_string(), format!("{}", epsilon));
        }
        params.insert(
            "support_vectors".to_string(),
            self.support_vectors.len().to_string(),
        );
        params
    }
}
