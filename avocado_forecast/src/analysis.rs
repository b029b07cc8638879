//! Descriptive analytics of the historical price series

use crate::config::AnalysisSettings;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::{Months, NaiveDate};
use price_math::{pct_change, quantile, streaks, MathError, Streaks};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

/// Summary statistics of the whole series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStatistics {
    pub count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    pub median: f64,
}

impl PriceStatistics {
    /// Standard deviation as a percentage of the mean
    pub fn coefficient_of_variation(&self) -> f64 {
        self.std_dev / self.mean * 100.0
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Sample standard deviation (n - 1)
fn sample_std(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Standard deviation needs at least 2 values, got {}",
            values.len()
        ))
        .into());
    }
    Ok(values.iter().std_dev())
}

/// Compute summary statistics; needs at least two records
pub fn statistics(series: &TimeSeries) -> Result<PriceStatistics> {
    let (first_date, last_date) = series
        .date_range()
        .ok_or_else(|| ForecastError::EmptySeries("no records to describe".to_string()))?;
    let prices = series.prices();

    Ok(PriceStatistics {
        count: prices.len(),
        first_date,
        last_date,
        mean: prices.clone().mean(),
        min: Statistics::min(prices.iter()),
        max: Statistics::max(prices.iter()),
        std_dev: sample_std(&prices)?,
        median: quantile(&prices, 0.5)?,
    })
}

/// Direction of a price trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    /// Classify a percentage change against a symmetric threshold
    pub fn classify(change_pct: f64, threshold_pct: f64) -> Self {
        if change_pct > threshold_pct {
            TrendDirection::Rising
        } else if change_pct < -threshold_pct {
            TrendDirection::Falling
        } else {
            TrendDirection::Stable
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Price trend over a trailing window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub months: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub observations: usize,
    pub initial_price: f64,
    pub final_price: f64,
    pub change: f64,
    pub change_pct: f64,
    pub direction: TrendDirection,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    /// Sample standard deviation of prices in the window
    pub volatility: f64,
}

/// Trend over the last `months` months, ending at the last record
///
/// The window includes the record dated exactly `months` months before the
/// last one.
pub fn trend(series: &TimeSeries, months: u32, settings: &AnalysisSettings) -> Result<TrendAnalysis> {
    if months == 0 {
        return Err(ForecastError::InvalidParameter(
            "Trend window must cover at least one month".to_string(),
        ));
    }
    let last = series
        .last()
        .ok_or_else(|| ForecastError::EmptySeries("no records to analyze".to_string()))?;
    let cutoff = last
        .date
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN);

    let window = series.since(cutoff);
    if window.len() < 2 {
        return Err(ForecastError::DataError(format!(
            "Trend over {} months needs at least 2 records, found {}",
            months,
            window.len()
        )));
    }

    let prices: Vec<f64> = window.iter().map(|r| r.price).collect();
    let initial_price = prices[0];
    let final_price = prices[prices.len() - 1];
    let change = final_price - initial_price;
    let change_pct = change / initial_price * 100.0;

    Ok(TrendAnalysis {
        months,
        start_date: window[0].date,
        end_date: last.date,
        observations: prices.len(),
        initial_price,
        final_price,
        change,
        change_pct,
        direction: TrendDirection::classify(change_pct, settings.trend_threshold_pct),
        mean: prices.clone().mean(),
        max: Statistics::max(prices.iter()),
        min: Statistics::min(prices.iter()),
        volatility: sample_std(&prices)?,
    })
}

/// Volatility band by coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl VolatilityLevel {
    /// Below 15% is low, below 30% moderate, below 50% high
    pub fn from_cv(cv_pct: f64) -> Self {
        if cv_pct < 15.0 {
            VolatilityLevel::Low
        } else if cv_pct < 30.0 {
            VolatilityLevel::Moderate
        } else if cv_pct < 50.0 {
            VolatilityLevel::High
        } else {
            VolatilityLevel::VeryHigh
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            VolatilityLevel::Low => "low: relatively stable market",
            VolatilityLevel::Moderate => "moderate: typical commodity volatility",
            VolatilityLevel::High => "high: significant fluctuations",
            VolatilityLevel::VeryHigh => "very high: extremely volatile market",
        }
    }
}

/// Return and price dispersion of the whole series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityAnalysis {
    /// Sample standard deviation of prices
    pub price_std_dev: f64,
    /// Price standard deviation as a percentage of the mean price
    pub coefficient_of_variation: f64,
    /// Sample standard deviation of period returns, as a fraction
    pub returns_std_dev: f64,
    pub annualized_std_dev: f64,
    pub mean_return: f64,
    pub max_return: f64,
    pub min_return: f64,
    pub positive_returns: usize,
    pub negative_returns: usize,
    pub p5: f64,
    pub p95: f64,
    pub percentile_range: f64,
    pub streaks: Streaks,
    pub level: VolatilityLevel,
}

/// Analyze volatility; needs at least three records for two returns
pub fn volatility(series: &TimeSeries, settings: &AnalysisSettings) -> Result<VolatilityAnalysis> {
    if settings.periods_per_year <= 0.0 {
        return Err(ForecastError::InvalidParameter(
            "periods_per_year must be positive".to_string(),
        ));
    }
    let prices = series.prices();
    let returns = pct_change(&prices)?;
    let returns_std_dev = sample_std(&returns)?;
    let price_std_dev = sample_std(&prices)?;
    let coefficient_of_variation = price_std_dev / prices.clone().mean() * 100.0;
    let p5 = quantile(&prices, 0.05)?;
    let p95 = quantile(&prices, 0.95)?;

    Ok(VolatilityAnalysis {
        price_std_dev,
        coefficient_of_variation,
        returns_std_dev,
        annualized_std_dev: returns_std_dev * settings.periods_per_year.sqrt(),
        mean_return: returns.clone().mean(),
        max_return: Statistics::max(returns.iter()),
        min_return: Statistics::min(returns.iter()),
        positive_returns: returns.iter().filter(|&&r| r > 0.0).count(),
        negative_returns: returns.iter().filter(|&&r| r < 0.0).count(),
        p5,
        p95,
        percentile_range: p95 - p5,
        streaks: streaks(&prices),
        level: VolatilityLevel::from_cv(coefficient_of_variation),
    })
}
