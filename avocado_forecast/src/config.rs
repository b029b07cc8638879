//! Serializable configuration for a forecasting session
//!
//! Every section has defaults, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! {
//!   "artifacts": { "dir": "data/models" },
//!   "data": { "path": "data/avocado_prices.csv" },
//!   "engine": { "frequency": "monthly", "confidence_z": 1.96 }
//! }
//! ```

use crate::error::{ForecastError, Result};
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub artifacts: ArtifactConfig,
    pub data: DataConfig,
    pub engine: EngineSettings,
    pub analysis: AnalysisSettings,
}

impl ForecastConfig {
    /// Configuration with default settings for the given locations
    pub fn with_paths(artifacts_dir: impl Into<PathBuf>, data_path: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.artifacts.dir = artifacts_dir.into();
        config.data.path = data_path.into();
        config
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.engine.check()?;
        Ok(config)
    }
}

/// Location and file names of the model artifact set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub scaler_x_file: String,
    pub scaler_y_file: String,
    pub feature_columns_file: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/models"),
            model_file: "model.json".to_string(),
            scaler_x_file: "scaler_x.json".to_string(),
            scaler_y_file: "scaler_y.json".to_string(),
            feature_columns_file: "feature_columns.json".to_string(),
        }
    }
}

impl ArtifactConfig {
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn scaler_x_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_x_file)
    }

    pub fn scaler_y_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_y_file)
    }

    pub fn feature_columns_path(&self) -> PathBuf {
        self.dir.join(&self.feature_columns_file)
    }
}

/// Location and column layout of the historical data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub schema: DataSchema,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/avocado_prices.csv"),
            schema: DataSchema::default(),
        }
    }
}

/// Names of the required columns in the historical data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSchema {
    pub date_column: String,
    pub price_column: String,
}

impl Default for DataSchema {
    fn default() -> Self {
        Self {
            date_column: "Fecha_Pub_DOF".to_string(),
            price_column: "Precio promedio".to_string(),
        }
    }
}

impl DataSchema {
    pub fn new(date_column: impl Into<String>, price_column: impl Into<String>) -> Self {
        Self {
            date_column: date_column.into(),
            price_column: price_column.into(),
        }
    }
}

/// Spacing between consecutive forecast periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Fixed number of days per period
    EveryDays(u32),
}

impl Frequency {
    /// Date that is `periods` periods after `start`
    ///
    /// Monthly steps are measured from `start` so month-end dates do not
    /// drift; a day that does not exist in the target month is clamped to
    /// that month's last day.
    pub fn step(self, start: NaiveDate, periods: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => start.checked_add_days(Days::new(u64::from(periods))),
            Frequency::Weekly => start.checked_add_days(Days::new(7 * u64::from(periods))),
            Frequency::Monthly => start.checked_add_months(Months::new(periods)),
            Frequency::EveryDays(days) => {
                start.checked_add_days(Days::new(u64::from(days) * u64::from(periods)))
            }
        }
    }

    pub fn label(self) -> String {
        match self {
            Frequency::Daily => "daily".to_string(),
            Frequency::Weekly => "weekly".to_string(),
            Frequency::Monthly => "monthly".to_string(),
            Frequency::EveryDays(days) => format!("every {} days", days),
        }
    }
}

/// Forecast engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub frequency: Frequency,
    /// Multiplier applied to the step volatility for the uncertainty band
    pub confidence_z: f64,
    /// Lower bound of the one-step margin as a fraction of the last price
    pub min_relative_margin: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            frequency: Frequency::Monthly,
            confidence_z: 1.96,
            min_relative_margin: 0.01,
        }
    }
}

impl EngineSettings {
    pub(crate) fn check(&self) -> Result<()> {
        if let Frequency::EveryDays(0) = self.frequency {
            return Err(ForecastError::InvalidParameter(
                "Frequency must advance by at least one day".to_string(),
            ));
        }
        if !self.confidence_z.is_finite() || self.confidence_z < 0.0 {
            return Err(ForecastError::InvalidParameter(
                "confidence_z must be a non-negative number".to_string(),
            ));
        }
        if !self.min_relative_margin.is_finite() || self.min_relative_margin <= 0.0 {
            return Err(ForecastError::InvalidParameter(
                "min_relative_margin must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for historical analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Percentage change beyond which a trend is rising or falling
    pub trend_threshold_pct: f64,
    /// Periods per year used to annualize return volatility
    pub periods_per_year: f64,
    /// Default trailing window for trend analysis
    pub trend_months: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            trend_threshold_pct: 5.0,
            periods_per_year: 252.0,
            trend_months: 12,
        }
    }
}
