//! Utility functions for the avocado_forecast crate

use crate::config::Frequency;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// The `n` period dates that follow `last`
pub fn future_dates(last: NaiveDate, n: usize, frequency: Frequency) -> Result<Vec<NaiveDate>> {
    (1..=n)
        .map(|k| {
            u32::try_from(k)
                .ok()
                .and_then(|periods| frequency.step(last, periods))
                .ok_or_else(|| {
                    ForecastError::InvalidDate(format!(
                        "{} {} periods after {} is out of range",
                        k,
                        frequency.label(),
                        last
                    ))
                })
        })
        .collect()
}

/// Recipe for a reproducible linear-trend series with Gaussian noise
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSeries {
    pub start: NaiveDate,
    pub periods: usize,
    pub frequency: Frequency,
    /// Price of the first period
    pub base: f64,
    /// Price change per period
    pub slope: f64,
    pub noise_sd: f64,
    pub seed: u64,
}

impl SyntheticSeries {
    /// Monthly series without noise
    pub fn monthly(start: NaiveDate, periods: usize, base: f64, slope: f64) -> Self {
        Self {
            start,
            periods,
            frequency: Frequency::Monthly,
            base,
            slope,
            noise_sd: 0.0,
            seed: 42,
        }
    }

    pub fn with_noise(mut self, noise_sd: f64, seed: u64) -> Self {
        self.noise_sd = noise_sd;
        self.seed = seed;
        self
    }

    /// Generate the series; prices are floored at one cent
    pub fn generate(&self) -> Result<TimeSeries> {
        if !(self.noise_sd.is_finite() && self.noise_sd >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Invalid noise level {}: must be a non-negative number",
                self.noise_sd
            )));
        }
        let noise = Normal::new(0.0, self.noise_sd).map_err(|e| {
            ForecastError::InvalidParameter(format!("Invalid noise level {}: {}", self.noise_sd, e))
        })?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut dates = Vec::with_capacity(self.periods);
        let mut prices = Vec::with_capacity(self.periods);
        for k in 0..self.periods {
            let date = u32::try_from(k)
                .ok()
                .and_then(|periods| self.frequency.step(self.start, periods))
                .ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "Synthetic series runs past the supported date range at period {}",
                        k
                    ))
                })?;
            let trend = self.base + self.slope * k as f64;
            dates.push(date);
            prices.push((trend + noise.sample(&mut rng)).max(0.01));
        }

        TimeSeries::from_pairs(dates, prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_future_dates_start_after_last() {
        let dates = future_dates(date(2024, 1, 15), 3, Frequency::Monthly).unwrap();
        assert_eq!(dates, vec![date(2024, 2, 15), date(2024, 3, 15), date(2024, 4, 15)]);
        assert!(future_dates(date(2024, 1, 15), 0, Frequency::Daily)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_synthetic_series_is_reproducible() {
        let recipe = SyntheticSeries::monthly(date(2020, 1, 1), 12, 40.0, 0.5).with_noise(0.3, 7);
        let a = recipe.generate().unwrap();
        let b = recipe.generate().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_eq!(a.last().unwrap().date, date(2020, 12, 1));
    }

    #[test]
    fn test_synthetic_series_without_noise_is_exact() {
        let series = SyntheticSeries::monthly(date(2020, 1, 1), 3, 10.0, 2.0)
            .generate()
            .unwrap();
        assert_eq!(series.prices(), vec![10.0, 12.0, 14.0]);
    }

    #[test]
    fn test_negative_noise_is_rejected() {
        let recipe = SyntheticSeries::monthly(date(2020, 1, 1), 3, 10.0, 0.0).with_noise(-1.0, 1);
        assert!(matches!(
            recipe.generate(),
            Err(ForecastError::InvalidParameter(_))
        ));
        let recipe = SyntheticSeries::monthly(date(2020, 1, 1), 3, 10.0, 0.0).with_noise(f64::NAN, 1);
        assert!(recipe.generate().is_err());
    }
}
