//! # Avocado Forecast
//!
//! A Rust library for forecasting avocado prices from a pre-trained
//! regression model and a deterministic feature pipeline.
//!
//! ## Features
//!
//! - Historical price loading from CSV with schema checks
//! - Calendar, cyclical, lag and rolling features computed without lookahead
//! - Pre-fit min-max, standard and identity scalers
//! - Linear, support vector and persistence regression backends
//! - Single-date, multi-date and recursive multi-period forecasts with
//!   uncertainty bands
//! - Validation of model artifacts, data files and user dates
//! - Price statistics, trend and volatility analysis
//!
//! ## Pipeline
//!
//! ```text
//! CSV -> TimeSeries -> FeatureEngineer -> ScalerAdapter -> ModelAdapter
//!                                                             |
//!                         price <- ScalerAdapter (inverse) <--+
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use avocado_forecast::{ForecastConfig, ForecastSession};
//!
//! let config = ForecastConfig::with_paths("data/models", "data/avocado_prices.csv");
//! let session = ForecastSession::open(config)?;
//!
//! // One date
//! let prediction = session.predict_date("2025-03-01")?;
//! println!("{}: {:.2}", prediction.target_date, prediction.predicted_price);
//!
//! // Six months, each step feeding the next
//! let start = session.next_period()?;
//! let forecast = session.forecast(start, 6)?;
//! for p in &forecast.predictions {
//!     println!("{} {:.2} ± {:.2}", p.target_date, p.predicted_price, p.uncertainty.margin);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod artifacts;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod features;
pub mod models;
pub mod scaler;
pub mod session;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use crate::artifacts::ModelArtifacts;
pub use crate::config::{DataSchema, ForecastConfig, Frequency};
pub use crate::data::{DataLoader, PriceRecord, RecordOrigin, TimeSeries};
pub use crate::engine::{ForecastEngine, ForecastSet, HorizonError, Prediction, UncertaintyBand};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureEngineer, FeatureName, FeatureVector};
pub use crate::models::{ModelAdapter, ModelSpec, RegressionModel};
pub use crate::scaler::{ScalerAdapter, ScalerSpec};
pub use crate::session::{ForecastSession, SessionHandle};
pub use crate::validation::{validate_date, ValidationReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
