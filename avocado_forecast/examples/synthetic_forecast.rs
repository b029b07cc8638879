use avocado_forecast::artifacts::{FeatureColumnsFile, ModelArtifacts, ModelFile, ScalerFile};
use avocado_forecast::models::{LinearRegressor, ModelSpec};
use avocado_forecast::scaler::ScalerSpec;
use avocado_forecast::utils::SyntheticSeries;
use avocado_forecast::{validate_date, ForecastConfig, ForecastSession};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three years of monthly prices with a mild upward drift
    let series = SyntheticSeries::monthly(validate_date("2021-01-01")?, 36, 38.0, 0.4)
        .with_noise(1.5, 7)
        .generate()?;
    println!("Generated {} monthly prices", series.len());

    // A hand-written model in place of a trained one
    let columns = vec!["price_lag1".to_string(), "price_ma3".to_string()];
    let artifacts = ModelArtifacts::from_parts(
        ModelFile {
            run_id: Some("synthetic".to_string()),
            model: ModelSpec::Linear(LinearRegressor::new(vec![0.7, 0.3], 0.4)?),
        },
        ScalerFile {
            run_id: None,
            scaler: ScalerSpec::Identity { n_features: 2 },
        },
        ScalerFile {
            run_id: None,
            scaler: ScalerSpec::Identity { n_features: 1 },
        },
        FeatureColumnsFile::Plain(columns),
    )?;

    let session = ForecastSession::from_parts(ForecastConfig::default(), artifacts, series)?;

    // Forecast the next 6 months
    let start = session.next_period()?;
    let forecast = session.forecast(start, 6)?;

    println!("Forecast using {}:", session.artifacts().model_name());
    for prediction in &forecast.predictions {
        println!(
            "{}: {:.2} ({:.2} to {:.2})",
            prediction.target_date,
            prediction.predicted_price,
            prediction.uncertainty.lower,
            prediction.uncertainty.upper
        );
    }

    let trend = session.trend(Some(12))?;
    println!(
        "12-month trend: {} ({:+.1}%)",
        trend.direction, trend.change_pct
    );

    Ok(())
}
