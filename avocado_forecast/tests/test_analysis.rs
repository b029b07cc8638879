use approx::assert_relative_eq;
use avocado_forecast::analysis::{
    statistics, trend, volatility, TrendDirection, VolatilityLevel,
};
use avocado_forecast::config::AnalysisSettings;
use avocado_forecast::data::TimeSeries;
use avocado_forecast::error::ForecastError;
use chrono::{Months, NaiveDate};
use price_math::Streaks;

fn monthly(prices: &[f64]) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let dates = (0..prices.len())
        .map(|i| start + Months::new(i as u32))
        .collect();
    TimeSeries::from_pairs(dates, prices.to_vec()).unwrap()
}

fn sample() -> TimeSeries {
    monthly(&[10.0, 12.0, 11.0, 13.0, 15.0, 14.0])
}

#[test]
fn test_statistics() {
    let stats = statistics(&sample()).unwrap();

    assert_eq!(stats.count, 6);
    assert_eq!(stats.first_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    assert_eq!(stats.last_date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    assert_relative_eq!(stats.mean, 12.5, epsilon = 1e-12);
    assert_eq!(stats.min, 10.0);
    assert_eq!(stats.max, 15.0);
    assert_relative_eq!(stats.median, 12.5, epsilon = 1e-12);
    assert_relative_eq!(stats.std_dev, 3.5f64.sqrt(), epsilon = 1e-12);
    assert_relative_eq!(stats.range(), 5.0);
}

#[test]
fn test_statistics_need_two_records() {
    assert!(statistics(&monthly(&[10.0])).is_err());
    assert!(matches!(
        statistics(&TimeSeries::new(Vec::new()).unwrap()),
        Err(ForecastError::EmptySeries(_))
    ));
}

#[test]
fn test_trend_over_trailing_window() {
    let settings = AnalysisSettings::default();
    // Mar..Jun: 11 -> 14
    let analysis = trend(&sample(), 3, &settings).unwrap();

    assert_eq!(analysis.observations, 4);
    assert_eq!(
        analysis.start_date,
        NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
    );
    assert_eq!(analysis.initial_price, 11.0);
    assert_eq!(analysis.final_price, 14.0);
    assert_relative_eq!(analysis.change, 3.0);
    assert_relative_eq!(analysis.change_pct, 300.0 / 11.0, epsilon = 1e-9);
    assert_eq!(analysis.direction, TrendDirection::Rising);
    assert_relative_eq!(analysis.mean, 13.25, epsilon = 1e-12);
    assert_eq!(analysis.max, 15.0);
    assert_eq!(analysis.min, 11.0);
}

#[test]
fn test_trend_direction_uses_threshold() {
    let settings = AnalysisSettings::default();

    let falling = trend(&monthly(&[20.0, 19.0, 18.5]), 12, &settings).unwrap();
    assert_eq!(falling.direction, TrendDirection::Falling);

    let stable = trend(&monthly(&[20.0, 21.0, 20.5]), 12, &settings).unwrap();
    assert_eq!(stable.direction, TrendDirection::Stable);

    let strict = AnalysisSettings {
        trend_threshold_pct: 1.0,
        ..AnalysisSettings::default()
    };
    let rising = trend(&monthly(&[20.0, 21.0, 20.5]), 12, &strict).unwrap();
    assert_eq!(rising.direction, TrendDirection::Rising);
}

#[test]
fn test_trend_window_too_short() {
    let settings = AnalysisSettings::default();
    let series = monthly(&[10.0, 11.0]);
    assert!(trend(&series, 0, &settings).is_err());

    // the six months before 2023-01-01 hold only that record
    let sparse = TimeSeries::from_pairs(
        vec![
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        ],
        vec![10.0, 11.0],
    )
    .unwrap();
    assert!(matches!(
        trend(&sparse, 6, &settings),
        Err(ForecastError::DataError(_))
    ));
}

#[test]
fn test_volatility() {
    let settings = AnalysisSettings::default();
    let analysis = volatility(&sample(), &settings).unwrap();

    assert_eq!(analysis.positive_returns, 3);
    assert_eq!(analysis.negative_returns, 2);
    assert_relative_eq!(analysis.max_return, 0.2, epsilon = 1e-12);
    assert_relative_eq!(analysis.min_return, 11.0 / 12.0 - 1.0, epsilon = 1e-12);
    assert_relative_eq!(
        analysis.annualized_std_dev,
        analysis.returns_std_dev * 252f64.sqrt(),
        epsilon = 1e-12
    );

    assert_relative_eq!(analysis.p5, 10.25, epsilon = 1e-12);
    assert_relative_eq!(analysis.p95, 14.75, epsilon = 1e-12);
    assert_relative_eq!(analysis.percentile_range, 4.5, epsilon = 1e-12);

    assert_relative_eq!(
        analysis.coefficient_of_variation,
        3.5f64.sqrt() / 12.5 * 100.0,
        epsilon = 1e-9
    );
    assert_eq!(analysis.level, VolatilityLevel::Low);
    assert_eq!(
        analysis.streaks,
        Streaks {
            rising: 2,
            falling: 2,
            longest_rising: 2,
            longest_falling: 1,
        }
    );
}

#[test]
fn test_volatility_level_of_wild_series() {
    let settings = AnalysisSettings::default();
    let analysis = volatility(&monthly(&[10.0, 30.0, 12.0, 35.0, 9.0]), &settings).unwrap();
    assert_eq!(analysis.level, VolatilityLevel::VeryHigh);
}
