//! # Avocado Workspace
//!
//! Umbrella crate for the avocado price forecasting workspace.
//!
//! - [`price_math`]: rolling statistics, returns, quantiles and streaks
//! - [`avocado_forecast`]: data loading, features, scaling, models,
//!   forecasting, validation and analytics
//!
//! ## Example
//!
//! ```
//! use avocado_workspace::avocado_forecast::utils::SyntheticSeries;
//! use avocado_workspace::avocado_forecast::validate_date;
//! use avocado_workspace::price_math::quantile;
//!
//! let start = validate_date("2023-01-01").unwrap();
//! let series = SyntheticSeries::monthly(start, 12, 40.0, 1.0).generate().unwrap();
//! let median = quantile(&series.prices(), 0.5).unwrap();
//! assert_eq!(median, 45.5);
//! ```

pub use avocado_forecast;
pub use price_math;
