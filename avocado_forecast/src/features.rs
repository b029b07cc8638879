//! Feature engineering for a target date
//!
//! Features for a target date `t` are computed from the calendar fields of
//! `t` and from the records strictly before `t`. Nothing dated on or after
//! `t` is ever read, so a forecast can never see the value it predicts.

use crate::data::{RecordOrigin, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use price_math::rolling::{trailing_mean, trailing_std_dev};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Observations needed before a target date (the widest rolling window)
pub const MIN_HISTORY: usize = 6;

/// Every feature the engineer knows how to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    Year,
    Month,
    DayOfYear,
    Quarter,
    MonthSin,
    MonthCos,
    DaySin,
    DayCos,
    DaysSinceStart,
    PriceLag1,
    PriceLag2,
    PriceLag3,
    PriceMa3,
    PriceMa6,
    PriceStd3,
    PriceStd6,
    PriceDiff1,
    PriceDiff2,
}

impl FeatureName {
    pub const ALL: [FeatureName; 18] = [
        FeatureName::Year,
        FeatureName::Month,
        FeatureName::DayOfYear,
        FeatureName::Quarter,
        FeatureName::MonthSin,
        FeatureName::MonthCos,
        FeatureName::DaySin,
        FeatureName::DayCos,
        FeatureName::DaysSinceStart,
        FeatureName::PriceLag1,
        FeatureName::PriceLag2,
        FeatureName::PriceLag3,
        FeatureName::PriceMa3,
        FeatureName::PriceMa6,
        FeatureName::PriceStd3,
        FeatureName::PriceStd6,
        FeatureName::PriceDiff1,
        FeatureName::PriceDiff2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureName::Year => "year",
            FeatureName::Month => "month",
            FeatureName::DayOfYear => "day_of_year",
            FeatureName::Quarter => "quarter",
            FeatureName::MonthSin => "month_sin",
            FeatureName::MonthCos => "month_cos",
            FeatureName::DaySin => "day_sin",
            FeatureName::DayCos => "day_cos",
            FeatureName::DaysSinceStart => "days_since_start",
            FeatureName::PriceLag1 => "price_lag1",
            FeatureName::PriceLag2 => "price_lag2",
            FeatureName::PriceLag3 => "price_lag3",
            FeatureName::PriceMa3 => "price_ma3",
            FeatureName::PriceMa6 => "price_ma6",
            FeatureName::PriceStd3 => "price_std3",
            FeatureName::PriceStd6 => "price_std6",
            FeatureName::PriceDiff1 => "price_diff1",
            FeatureName::PriceDiff2 => "price_diff2",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        FeatureName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ForecastError::FeatureSchema(format!("unknown feature '{}'", s)))
    }
}

/// A named feature value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    pub name: FeatureName,
    pub value: f64,
}

/// Ordered feature values for one target date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    entries: Vec<FeatureValue>,
}

impl FeatureVector {
    pub fn new(entries: Vec<FeatureValue>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FeatureValue] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<FeatureName> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    pub fn get(&self, name: FeatureName) -> Option<f64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    /// Fail unless the names match `columns` exactly, in order
    pub fn ensure_matches(&self, columns: &[FeatureName]) -> Result<()> {
        if self.entries.len() != columns.len() {
            return Err(ForecastError::FeatureSchema(format!(
                "vector has {} features, model expects {}",
                self.entries.len(),
                columns.len()
            )));
        }
        for (position, (entry, expected)) in self.entries.iter().zip(columns).enumerate() {
            if entry.name != *expected {
                return Err(ForecastError::FeatureSchema(format!(
                    "feature {} is '{}', model expects '{}'",
                    position, entry.name, expected
                )));
            }
        }
        Ok(())
    }
}

/// Builds feature vectors in the column order a model was trained with
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEngineer {
    columns: Vec<FeatureName>,
}

impl FeatureEngineer {
    /// Create an engineer for the given column names
    ///
    /// Unknown, duplicated or empty column lists are rejected.
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Result<Self> {
        if columns.is_empty() {
            return Err(ForecastError::FeatureSchema(
                "feature column list is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut parsed = Vec::with_capacity(columns.len());
        for column in columns {
            let name: FeatureName = column.as_ref().parse()?;
            if !seen.insert(name) {
                return Err(ForecastError::FeatureSchema(format!(
                    "feature '{}' is listed more than once",
                    name
                )));
            }
            parsed.push(name);
        }

        Ok(Self { columns: parsed })
    }

    pub fn columns(&self) -> &[FeatureName] {
        &self.columns
    }

    /// Build the feature vector for `target` from the records before it
    pub fn build_features(&self, series: &TimeSeries, target: NaiveDate) -> Result<FeatureVector> {
        let history = series.before(target);
        if history.len() < MIN_HISTORY {
            return Err(ForecastError::InsufficientHistory {
                target,
                required: MIN_HISTORY,
                available: history.len(),
            });
        }

        let window: Vec<f64> = history[history.len() - MIN_HISTORY..]
            .iter()
            .map(|r| r.price)
            .collect();
        // history is non-empty, so the series start is before the target
        let start = history[0].date;

        let mut entries = Vec::with_capacity(self.columns.len());
        for &name in &self.columns {
            let value = compute(name, target, start, &window)?;
            if !value.is_finite() {
                return Err(ForecastError::FeatureSchema(format!(
                    "feature '{}' is not finite for {}",
                    name, target
                )));
            }
            entries.push(FeatureValue { name, value });
        }

        let vector = FeatureVector::new(entries);
        vector.ensure_matches(&self.columns)?;
        Ok(vector)
    }

    /// How many of the records feeding `target`'s window were predicted
    pub fn feedback_inputs(series: &TimeSeries, target: NaiveDate) -> usize {
        let history = series.before(target);
        history[history.len().saturating_sub(MIN_HISTORY)..]
            .iter()
            .filter(|r| r.origin == RecordOrigin::Predicted)
            .count()
    }
}

/// Value of one feature; `window` holds the last `MIN_HISTORY` prior prices
fn compute(name: FeatureName, target: NaiveDate, start: NaiveDate, window: &[f64]) -> Result<f64> {
    let lag = |k: usize| window[window.len() - k];
    let month = f64::from(target.month());
    let day_of_year = f64::from(target.ordinal());

    let value = match name {
        FeatureName::Year => f64::from(target.year()),
        FeatureName::Month => month,
        FeatureName::DayOfYear => day_of_year,
        FeatureName::Quarter => f64::from((target.month() - 1) / 3 + 1),
        FeatureName::MonthSin => (2.0 * PI * month / 12.0).sin(),
        FeatureName::MonthCos => (2.0 * PI * month / 12.0).cos(),
        FeatureName::DaySin => (2.0 * PI * day_of_year / 365.0).sin(),
        FeatureName::DayCos => (2.0 * PI * day_of_year / 365.0).cos(),
        FeatureName::DaysSinceStart => (target - start).num_days() as f64,
        FeatureName::PriceLag1 => lag(1),
        FeatureName::PriceLag2 => lag(2),
        FeatureName::PriceLag3 => lag(3),
        FeatureName::PriceMa3 => trailing_mean(window, 3)?,
        FeatureName::PriceMa6 => trailing_mean(window, 6)?,
        FeatureName::PriceStd3 => trailing_std_dev(window, 3)?,
        FeatureName::PriceStd6 => trailing_std_dev(window, 6)?,
        FeatureName::PriceDiff1 => lag(1) - lag(2),
        FeatureName::PriceDiff2 => lag(1) - lag(3),
    };

    Ok(value)
}
