//! Pre-fit feature and target scaling
//!
//! Every supported scaler is an affine map applied per column,
//! `x' = x * a + b`, so transforms and inverses are exact and cheap.

use crate::error::{ForecastError, Result};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};

/// Serialized scaler parameters, as exported by the training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    /// Maps `[data_min, data_max]` onto `feature_range`
    MinMax {
        data_min: Vec<f64>,
        data_max: Vec<f64>,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },
    /// Standardizes with `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Passes values through unchanged
    Identity { n_features: usize },
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl ScalerSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            ScalerSpec::MinMax { .. } => "min_max",
            ScalerSpec::Standard { .. } => "standard",
            ScalerSpec::Identity { .. } => "identity",
        }
    }

    /// Number of columns the scaler was fit on
    pub fn n_features(&self) -> usize {
        match self {
            ScalerSpec::MinMax { data_min, .. } => data_min.len(),
            ScalerSpec::Standard { mean, .. } => mean.len(),
            ScalerSpec::Identity { n_features } => *n_features,
        }
    }
}

/// Column-wise affine transform compiled from a [`ScalerSpec`]
#[derive(Debug, Clone, PartialEq)]
pub struct AffineScaler {
    kind: &'static str,
    scale: Vec<f64>,
    offset: Vec<f64>,
}

impl AffineScaler {
    pub fn from_spec(spec: &ScalerSpec) -> Result<Self> {
        let (scale, offset) = match spec {
            ScalerSpec::MinMax {
                data_min,
                data_max,
                feature_range: (low, high),
            } => {
                if data_min.len() != data_max.len() {
                    return Err(ForecastError::InvalidParameter(format!(
                        "min-max scaler has {} minimums and {} maximums",
                        data_min.len(),
                        data_max.len()
                    )));
                }
                if high <= low {
                    return Err(ForecastError::InvalidParameter(format!(
                        "min-max feature range ({}, {}) is empty",
                        low, high
                    )));
                }
                data_min
                    .iter()
                    .zip(data_max)
                    .map(|(&min, &max)| {
                        let range = non_zero(max - min);
                        let a = (high - low) / range;
                        (a, low - min * a)
                    })
                    .unzip()
            }
            ScalerSpec::Standard { mean, scale } => {
                if mean.len() != scale.len() {
                    return Err(ForecastError::InvalidParameter(format!(
                        "standard scaler has {} means and {} scales",
                        mean.len(),
                        scale.len()
                    )));
                }
                mean.iter()
                    .zip(scale)
                    .map(|(&m, &s)| {
                        let s = non_zero(s);
                        (1.0 / s, -m / s)
                    })
                    .unzip()
            }
            ScalerSpec::Identity { n_features } => (vec![1.0; *n_features], vec![0.0; *n_features]),
        };

        let scaler = Self {
            kind: spec.kind(),
            scale,
            offset,
        };
        if scaler
            .scale
            .iter()
            .chain(&scaler.offset)
            .any(|v| !v.is_finite())
        {
            return Err(ForecastError::InvalidParameter(format!(
                "{} scaler parameters must be finite",
                scaler.kind
            )));
        }

        Ok(scaler)
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn n_features(&self) -> usize {
        self.scale.len()
    }

    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.check_width(values.len())?;
        Ok(values
            .iter()
            .zip(self.scale.iter().zip(&self.offset))
            .map(|(x, (a, b))| x * a + b)
            .collect())
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        self.check_width(values.len())?;
        Ok(values
            .iter()
            .zip(self.scale.iter().zip(&self.offset))
            .map(|(x, (a, b))| (x - b) / a)
            .collect())
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.n_features() {
            return Err(ForecastError::FeatureSchema(format!(
                "{} scaler expects {} values, got {}",
                self.kind,
                self.n_features(),
                width
            )));
        }
        Ok(())
    }
}

/// Zero spans map to scale 1, so constant columns pass through shifted
fn non_zero(span: f64) -> f64 {
    if span == 0.0 {
        1.0
    } else {
        span
    }
}

/// Feature and target scalers of one training run
#[derive(Debug, Clone, Default)]
pub struct ScalerAdapter {
    features: Option<AffineScaler>,
    target: Option<AffineScaler>,
}

impl ScalerAdapter {
    /// Adapter with both scalers loaded
    pub fn new(features: &ScalerSpec, target: &ScalerSpec) -> Result<Self> {
        let target = AffineScaler::from_spec(target)?;
        if target.n_features() != 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "target scaler must have exactly 1 column, has {}",
                target.n_features()
            )));
        }

        Ok(Self {
            features: Some(AffineScaler::from_spec(features)?),
            target: Some(target),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.features.is_some() && self.target.is_some()
    }

    pub fn feature_scaler(&self) -> Option<&AffineScaler> {
        self.features.as_ref()
    }

    pub fn target_scaler(&self) -> Option<&AffineScaler> {
        self.target.as_ref()
    }

    /// Scale a feature vector into model input space
    pub fn transform(&self, vector: &FeatureVector) -> Result<Vec<f64>> {
        let scaler = self
            .features
            .as_ref()
            .ok_or_else(|| ForecastError::ScalerNotLoaded("feature scaler".to_string()))?;
        scaler.transform(&vector.values())
    }

    /// Map a scaled model output back to a price
    pub fn inverse_transform(&self, scaled: f64) -> Result<f64> {
        let scaler = self
            .target
            .as_ref()
            .ok_or_else(|| ForecastError::ScalerNotLoaded("target scaler".to_string()))?;
        let values = scaler.inverse_transform(&[scaled])?;
        values
            .first()
            .copied()
            .ok_or_else(|| ForecastError::InvalidParameter("target scaler is empty".to_string()))
    }
}
