//! Forecasting sessions
//!
//! A [`ForecastSession`] owns one validated artifact set and one historical
//! series for its whole lifetime. Reloading never mutates a session: a new
//! one is built and swapped into a [`SessionHandle`], and callers still
//! holding the old `Arc` keep a consistent view until they drop it.

use crate::analysis::{self, PriceStatistics, TrendAnalysis, VolatilityAnalysis};
use crate::artifacts::ModelArtifacts;
use crate::config::ForecastConfig;
use crate::data::{DataLoader, TimeSeries};
use crate::engine::{ForecastEngine, ForecastSet, HorizonError, Prediction};
use crate::error::{ForecastError, Result};
use crate::export::{ExportEnvelope, ExportMetadata};
use crate::utils::future_dates;
use crate::validation::{validate_artifacts, validate_data, validate_date, validate_series};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Description of the loaded model and data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub parameters: BTreeMap<String, String>,
    pub run_id: Option<String>,
    pub n_features: usize,
    pub feature_names: Vec<String>,
    pub scaler_x_kind: Option<String>,
    pub scaler_y_kind: Option<String>,
    pub frequency: String,
    pub observations: usize,
    pub history_start: Option<NaiveDate>,
    pub history_end: Option<NaiveDate>,
}

/// Which parts of a session are usable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub model_loaded: bool,
    pub scalers_loaded: bool,
    pub features_loaded: bool,
    pub data_loaded: bool,
    pub fully_functional: bool,
}

/// Validated artifacts, history and engine settings
#[derive(Debug)]
pub struct ForecastSession {
    config: ForecastConfig,
    artifacts: Arc<ModelArtifacts>,
    series: Arc<TimeSeries>,
    engine: ForecastEngine,
}

impl ForecastSession {
    /// Validate the configured artifacts and data, then load them
    ///
    /// Every validation issue is reported together in one
    /// [`ForecastError::Validation`]; nothing is loaded when any is found.
    pub fn open(config: ForecastConfig) -> Result<Self> {
        let mut report = validate_artifacts(&config.artifacts);
        report.merge(validate_data(&config.data.path, &config.data.schema));
        let report = report.into_result()?;
        for warning in report.warnings() {
            warn!("{}", warning);
        }

        let artifacts = ModelArtifacts::load(&config.artifacts)?;
        let series = DataLoader::from_csv(&config.data.path, &config.data.schema)?;
        let session = Self::from_parts(config, artifacts, series)?;

        if let Some((first, last)) = session.series.date_range() {
            info!(
                "Session ready: {} over {} records ({} to {})",
                session.artifacts.model_name(),
                session.series.len(),
                first,
                last
            );
        }
        Ok(session)
    }

    /// Build a session from artifacts and a series already in memory
    pub fn from_parts(
        config: ForecastConfig,
        artifacts: ModelArtifacts,
        series: TimeSeries,
    ) -> Result<Self> {
        validate_series(&series).into_result()?;

        let artifacts = Arc::new(artifacts);
        let engine = ForecastEngine::new(Arc::clone(&artifacts), config.engine.clone())?;
        Ok(Self {
            config,
            artifacts,
            series: Arc::new(series),
            engine,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &Arc<ModelArtifacts> {
        &self.artifacts
    }

    pub fn series(&self) -> &Arc<TimeSeries> {
        &self.series
    }

    pub fn engine(&self) -> &ForecastEngine {
        &self.engine
    }

    /// Predict the price for a `YYYY-MM-DD` date
    pub fn predict_date(&self, date: &str) -> Result<Prediction> {
        let target = validate_date(date)?;
        self.engine.predict_single(&self.series, target)
    }

    /// Predict each date independently, one result per input
    pub fn predict_dates<S: AsRef<str>>(&self, dates: &[S]) -> Vec<Result<Prediction>> {
        dates
            .iter()
            .map(|date| self.predict_date(date.as_ref()))
            .collect()
    }

    /// Recursive forecast of `n` periods starting at `start`
    pub fn forecast(
        &self,
        start: NaiveDate,
        n: usize,
    ) -> std::result::Result<ForecastSet, HorizonError> {
        self.engine.predict_horizon(&self.series, start, n)
    }

    /// First period after the last observation
    pub fn next_period(&self) -> Result<NaiveDate> {
        let dates = self.future_dates(1)?;
        dates
            .first()
            .copied()
            .ok_or_else(|| ForecastError::InvalidDate("no period follows the history".to_string()))
    }

    /// The `n` periods following the last observation
    pub fn future_dates(&self, n: usize) -> Result<Vec<NaiveDate>> {
        let last = self
            .series
            .last()
            .ok_or_else(|| ForecastError::EmptySeries("session has no history".to_string()))?;
        future_dates(last.date, n, self.config.engine.frequency)
    }

    pub fn statistics(&self) -> Result<PriceStatistics> {
        analysis::statistics(&self.series)
    }

    /// Trend over `months`, or the configured default window
    pub fn trend(&self, months: Option<u32>) -> Result<TrendAnalysis> {
        let months = months.unwrap_or(self.config.analysis.trend_months);
        analysis::trend(&self.series, months, &self.config.analysis)
    }

    pub fn volatility(&self) -> Result<VolatilityAnalysis> {
        analysis::volatility(&self.series, &self.config.analysis)
    }

    pub fn model_info(&self) -> ModelInfo {
        let model = self.artifacts.model().model();
        let scalers = self.artifacts.scalers();
        let range = self.series.date_range();

        ModelInfo {
            model_name: self.artifacts.model_name(),
            parameters: model.map(|m| m.parameters()).unwrap_or_default(),
            run_id: self.artifacts.run_id().map(str::to_string),
            n_features: self.artifacts.engineer().columns().len(),
            feature_names: self
                .artifacts
                .engineer()
                .columns()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            scaler_x_kind: scalers.feature_scaler().map(|s| s.kind().to_string()),
            scaler_y_kind: scalers.target_scaler().map(|s| s.kind().to_string()),
            frequency: self.config.engine.frequency.label(),
            observations: self.series.len(),
            history_start: range.map(|(first, _)| first),
            history_end: range.map(|(_, last)| last),
        }
    }

    pub fn status(&self) -> SessionStatus {
        let model_loaded = self.artifacts.model().is_loaded();
        let scalers_loaded = self.artifacts.scalers().is_loaded();
        let features_loaded = !self.artifacts.engineer().columns().is_empty();
        let data_loaded = !self.series.is_empty();
        SessionStatus {
            model_loaded,
            scalers_loaded,
            features_loaded,
            data_loaded,
            fully_functional: model_loaded && scalers_loaded && features_loaded && data_loaded,
        }
    }

    pub fn export_metadata(&self) -> ExportMetadata {
        let range = self.series.date_range();
        ExportMetadata {
            model_name: self.artifacts.model_name(),
            run_id: self.artifacts.run_id().map(str::to_string),
            crate_version: crate::VERSION.to_string(),
            generated_at: Utc::now(),
            history_start: range.map(|(first, _)| first),
            history_end: range.map(|(_, last)| last),
            observations: self.series.len(),
        }
    }

    /// Wrap a result with this session's provenance
    pub fn export<T: Serialize>(&self, payload: T) -> ExportEnvelope<T> {
        ExportEnvelope::new(self.export_metadata(), payload)
    }
}

/// Shared slot holding the current session
#[derive(Debug, Default)]
pub struct SessionHandle {
    current: RwLock<Option<Arc<ForecastSession>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session from `config` and make it current
    ///
    /// On failure the previous session, if any, stays current.
    pub fn open(&self, config: ForecastConfig) -> Result<Arc<ForecastSession>> {
        let session = Arc::new(ForecastSession::open(config)?);
        if self.replace(Arc::clone(&session)).is_some() {
            info!("Replaced the previous forecasting session");
        }
        Ok(session)
    }

    /// Swap in `session`, returning the one it replaces
    pub fn replace(&self, session: Arc<ForecastSession>) -> Option<Arc<ForecastSession>> {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(session)
    }

    pub fn current(&self) -> Option<Arc<ForecastSession>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current session, or [`ForecastError::ModelNotLoaded`]
    pub fn require(&self) -> Result<Arc<ForecastSession>> {
        self.current().ok_or(ForecastError::ModelNotLoaded)
    }

    pub fn clear(&self) -> Option<Arc<ForecastSession>> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn status(&self) -> SessionStatus {
        self.current()
            .map(|session| session.status())
            .unwrap_or_default()
    }
}

#[allow(dead_code)]
fn assert_send_sync<T: Send + Sync>() {}

const _: fn() = || {
    assert_send_sync::<ForecastSession>();
    assert_send_sync::<SessionHandle>();
    assert_send_sync::<ForecastSet>();
};
