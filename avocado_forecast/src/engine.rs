//! Single-date and recursive multi-step forecasting
//!
//! A horizon forecast is an explicit loop over a private working copy of the
//! history: every step builds features from the copy, predicts, and appends
//! its own prediction so the next step sees it as the most recent price.

use crate::artifacts::ModelArtifacts;
use crate::config::{EngineSettings, Frequency};
use crate::data::{PriceRecord, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureEngineer, FeatureVector};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use price_math::{differences, sample_std_dev};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Nominal band around a predicted price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyBand {
    pub margin: f64,
    pub lower: f64,
    pub upper: f64,
}

impl UncertaintyBand {
    pub fn around(price: f64, margin: f64) -> Self {
        Self {
            margin,
            lower: price - margin,
            upper: price + margin,
        }
    }
}

/// One forecast value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub target_date: NaiveDate,
    pub predicted_price: f64,
    pub generated_at: DateTime<Utc>,
    /// Feature vector the model saw, before scaling
    pub features: FeatureVector,
    /// 1-based position within a horizon; single-date predictions are step 1
    pub step: usize,
    pub uncertainty: UncertaintyBand,
    /// Predicted records inside the lookback window used for the features
    pub feedback_inputs: usize,
}

/// Predictions for consecutive periods from one horizon request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSet {
    pub start_date: NaiveDate,
    pub frequency: Frequency,
    pub generated_at: DateTime<Utc>,
    pub predictions: Vec<Prediction>,
}

impl ForecastSet {
    pub fn new(start_date: NaiveDate, frequency: Frequency, generated_at: DateTime<Utc>) -> Self {
        Self {
            start_date,
            frequency,
            generated_at,
            predictions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.predictions.iter().map(|p| p.target_date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.predictions.iter().map(|p| p.predicted_price).collect()
    }
}

/// A horizon forecast that stopped before completing
///
/// `partial` holds every prediction made before the failing step. A `step`
/// of 0 means the request was rejected before any step ran.
#[derive(Debug, Error)]
#[error("Forecast stopped at step {step} ({target_date}): {source}")]
pub struct HorizonError {
    pub step: usize,
    pub target_date: NaiveDate,
    pub partial: ForecastSet,
    #[source]
    pub source: ForecastError,
}

/// Runs the feature, scaling and inference pipeline for forecast dates
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    artifacts: Arc<ModelArtifacts>,
    settings: EngineSettings,
}

impl ForecastEngine {
    pub fn new(artifacts: Arc<ModelArtifacts>, settings: EngineSettings) -> Result<Self> {
        settings.check()?;
        Ok(Self {
            artifacts,
            settings,
        })
    }

    pub fn artifacts(&self) -> &Arc<ModelArtifacts> {
        &self.artifacts
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Predict the price for one date after the end of `series`
    ///
    /// Dates on or before the last record are rejected with
    /// [`ForecastError::InvalidDate`].
    pub fn predict_single(&self, series: &TimeSeries, target: NaiveDate) -> Result<Prediction> {
        self.check_future(series, target)?;
        let margin = self.base_margin(series);
        self.infer(series, target, 1, margin, Utc::now())
    }

    /// Predict `n` consecutive periods starting at `start`
    ///
    /// Step `k` targets `start + (k - 1)` periods and sees every earlier
    /// step's prediction as history. The first failing step aborts the
    /// forecast; nothing is skipped.
    pub fn predict_horizon(
        &self,
        series: &TimeSeries,
        start: NaiveDate,
        n: usize,
    ) -> std::result::Result<ForecastSet, HorizonError> {
        let generated_at = Utc::now();
        let frequency = self.settings.frequency;
        let mut set = ForecastSet::new(start, frequency, generated_at);

        if n == 0 {
            return Err(HorizonError {
                step: 0,
                target_date: start,
                partial: set,
                source: ForecastError::InvalidParameter(
                    "Forecast horizon must be at least one period".to_string(),
                ),
            });
        }
        if let Err(source) = self.check_future(series, start) {
            return Err(HorizonError {
                step: 0,
                target_date: start,
                partial: set,
                source,
            });
        }

        let margin = self.base_margin(series);
        let mut working = series.clone();
        for k in 0..n {
            let step = k + 1;
            let target = match u32::try_from(k)
                .ok()
                .and_then(|periods| frequency.step(start, periods))
            {
                Some(date) => date,
                None => {
                    return Err(HorizonError {
                        step,
                        target_date: start,
                        partial: set,
                        source: ForecastError::InvalidDate(format!(
                            "{} periods after {} is out of range",
                            k, start
                        )),
                    })
                }
            };

            let outcome = self
                .infer(&working, target, step, margin, generated_at)
                .and_then(|prediction| {
                    working.push(PriceRecord::predicted(target, prediction.predicted_price))?;
                    Ok(prediction)
                });

            match outcome {
                Ok(prediction) => {
                    debug!(
                        "Step {}/{}: {} -> {:.4} ({} predicted input(s))",
                        step, n, target, prediction.predicted_price, prediction.feedback_inputs
                    );
                    set.predictions.push(prediction);
                }
                Err(source) => {
                    debug!("Step {}/{} for {} failed: {}", step, n, target, source);
                    return Err(HorizonError {
                        step,
                        target_date: target,
                        partial: set,
                        source,
                    });
                }
            }
        }

        Ok(set)
    }

    /// Independent single-date predictions, one result per date
    pub fn predict_many(&self, series: &TimeSeries, dates: &[NaiveDate]) -> Vec<Result<Prediction>> {
        dates
            .iter()
            .map(|&date| self.predict_single(series, date))
            .collect()
    }

    fn check_future(&self, series: &TimeSeries, target: NaiveDate) -> Result<()> {
        let last = series.last().ok_or_else(|| {
            ForecastError::EmptySeries("cannot forecast from an empty series".to_string())
        })?;
        if target <= last.date {
            return Err(ForecastError::InvalidDate(format!(
                "{} is not after the last observation ({})",
                target, last.date
            )));
        }
        Ok(())
    }

    /// One-step margin: `max(z * σ, r * |last price|)`
    ///
    /// σ is the sample standard deviation of first differences of the
    /// observed series; with fewer than two differences only the relative
    /// floor applies.
    fn base_margin(&self, series: &TimeSeries) -> f64 {
        let prices = series.prices();
        let sigma = sample_std_dev(&differences(&prices)).unwrap_or(0.0);
        let last = prices.last().map_or(0.0, |p| p.abs());
        (self.settings.confidence_z * sigma).max(self.settings.min_relative_margin * last)
    }

    fn infer(
        &self,
        series: &TimeSeries,
        target: NaiveDate,
        step: usize,
        base_margin: f64,
        generated_at: DateTime<Utc>,
    ) -> Result<Prediction> {
        let features = self.artifacts.engineer().build_features(series, target)?;
        let scaled = self.artifacts.scalers().transform(&features)?;
        let output = self.artifacts.model().predict(&scaled)?;
        let price = self.artifacts.scalers().inverse_transform(output)?;
        if !price.is_finite() || price <= 0.0 {
            return Err(ForecastError::Inference(format!(
                "model produced an invalid price {} for {}",
                price, target
            )));
        }

        let margin = base_margin * (step as f64).sqrt();
        Ok(Prediction {
            target_date: target,
            predicted_price: price,
            generated_at,
            feedback_inputs: FeatureEngineer::feedback_inputs(series, target),
            features,
            step,
            uncertainty: UncertaintyBand::around(price, margin),
        })
    }
}
