//! Avocado forecast CLI: validate artifacts, predict prices, analyze history.
//!
//! Commands:
//! - `validate`: check model artifacts and the data file, listing every issue
//! - `predict`: predict one or more dates independently
//! - `forecast`: recursive multi-period forecast
//! - `stats`, `trend`, `volatility`: historical analytics
//! - `info`: loaded model and data summary
//! - `dates`: upcoming period dates

use anyhow::{bail, Context, Result};
use avocado_forecast::validation::{validate_artifacts, validate_data};
use avocado_forecast::{validate_date, ForecastConfig, ForecastSession};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "avocado_forecast",
    about = "Avocado price forecasting from a pre-trained model"
)]
struct Cli {
    /// JSON configuration file. Flags below override its paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding model.json, scaler_x.json, scaler_y.json and feature_columns.json.
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    /// Historical price CSV.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check model artifacts and the data file.
    Validate,
    /// Predict prices for one or more dates (YYYY-MM-DD).
    Predict {
        #[arg(required = true)]
        dates: Vec<String>,
    },
    /// Forecast consecutive periods, feeding each prediction into the next.
    Forecast {
        /// First period (YYYY-MM-DD). Defaults to the period after the last record.
        #[arg(long)]
        start: Option<String>,

        /// Number of periods.
        #[arg(long, default_value_t = 6)]
        periods: usize,

        /// Write the forecast with export metadata to this JSON file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Summary statistics of the history.
    Stats,
    /// Price trend over trailing windows.
    Trend {
        /// Window lengths in months.
        #[arg(long, value_delimiter = ',', default_values_t = vec![3, 6, 12])]
        months: Vec<u32>,
    },
    /// Volatility analysis of the history.
    Volatility,
    /// Loaded model and data summary.
    Info,
    /// Dates of the next periods.
    Dates {
        #[arg(long, default_value_t = 6)]
        periods: usize,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Commands::Validate = cli.command {
        return run_validate(&config, cli.json);
    }

    let session = ForecastSession::open(config).context("failed to open forecasting session")?;

    match cli.command {
        Commands::Validate => Ok(()),
        Commands::Predict { dates } => run_predict(&session, &dates, cli.json),
        Commands::Forecast {
            start,
            periods,
            output,
        } => run_forecast(&session, start.as_deref(), periods, output, cli.json),
        Commands::Stats => {
            let stats = session.statistics()?;
            if cli.json {
                return print_json(&stats);
            }
            println!("Records:       {}", stats.count);
            println!("Period:        {} to {}", stats.first_date, stats.last_date);
            println!("Mean price:    {:.2}", stats.mean);
            println!("Min price:     {:.2}", stats.min);
            println!("Max price:     {:.2}", stats.max);
            println!("Median:        {:.2}", stats.median);
            println!("Std deviation: {:.2}", stats.std_dev);
            println!("Coeff. of variation: {:.1}%", stats.coefficient_of_variation());
            println!("Price range:   {:.2}", stats.range());
            Ok(())
        }
        Commands::Trend { months } => {
            let mut trends = Vec::with_capacity(months.len());
            for window in months {
                match session.trend(Some(window)) {
                    Ok(trend) => trends.push(trend),
                    Err(e) => warn!("Trend over {} months unavailable: {}", window, e),
                }
            }
            if cli.json {
                return print_json(&trends);
            }
            for trend in &trends {
                println!("{} months ({} to {})", trend.months, trend.start_date, trend.end_date);
                println!("  Initial price: {:.2}", trend.initial_price);
                println!("  Final price:   {:.2}", trend.final_price);
                println!(
                    "  Change:        {:+.2} ({:+.1}%)",
                    trend.change, trend.change_pct
                );
                println!("  Direction:     {}", trend.direction);
                println!("  Mean price:    {:.2}", trend.mean);
                println!("  Volatility:    {:.2}", trend.volatility);
                println!("  Range:         {:.2} - {:.2}", trend.min, trend.max);
            }
            Ok(())
        }
        Commands::Volatility => {
            let vol = session.volatility()?;
            if cli.json {
                return print_json(&vol);
            }
            println!("Price std deviation:   {:.2}", vol.price_std_dev);
            println!("Coeff. of variation:   {:.1}%", vol.coefficient_of_variation);
            println!("Return volatility:     {:.2}%", vol.returns_std_dev * 100.0);
            println!("Annualized volatility: {:.1}%", vol.annualized_std_dev * 100.0);
            println!("Mean return:           {:+.2}%", vol.mean_return * 100.0);
            println!("Best period:           {:+.1}%", vol.max_return * 100.0);
            println!("Worst period:          {:+.1}%", vol.min_return * 100.0);
            println!("Rising periods:        {}", vol.positive_returns);
            println!("Falling periods:       {}", vol.negative_returns);
            println!("5th percentile:        {:.2}", vol.p5);
            println!("95th percentile:       {:.2}", vol.p95);
            println!("Inter-percentile range: {:.2}", vol.percentile_range);
            println!(
                "Rising streaks:        {} (longest {})",
                vol.streaks.rising, vol.streaks.longest_rising
            );
            println!(
                "Falling streaks:       {} (longest {})",
                vol.streaks.falling, vol.streaks.longest_falling
            );
            println!("Level:                 {}", vol.level.description());
            Ok(())
        }
        Commands::Info => {
            let info = session.model_info();
            if cli.json {
                return print_json(&info);
            }
            println!("Model:     {}", info.model_name);
            if let Some(run_id) = &info.run_id {
                println!("Run:       {}", run_id);
            }
            for (name, value) in &info.parameters {
                println!("  {} = {}", name, value);
            }
            println!(
                "Features:  {} ({})",
                info.n_features,
                info.feature_names.join(", ")
            );
            println!(
                "Scalers:   {} / {}",
                info.scaler_x_kind.as_deref().unwrap_or("none"),
                info.scaler_y_kind.as_deref().unwrap_or("none")
            );
            println!("Frequency: {}", info.frequency);
            println!("History:   {} records", info.observations);
            if let (Some(start), Some(end)) = (info.history_start, info.history_end) {
                println!("           {} to {}", start, end);
            }
            Ok(())
        }
        Commands::Dates { periods } => {
            let dates = session.future_dates(periods)?;
            if cli.json {
                return print_json(&dates);
            }
            for date in dates {
                println!("{}", date);
            }
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<ForecastConfig> {
    let mut config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => ForecastConfig::default(),
    };
    if let Some(dir) = &cli.models_dir {
        config.artifacts.dir = dir.clone();
    }
    if let Some(path) = &cli.data {
        config.data.path = path.clone();
    }
    Ok(config)
}

fn run_validate(config: &ForecastConfig, json: bool) -> Result<()> {
    let mut report = validate_artifacts(&config.artifacts);
    report.merge(validate_data(&config.data.path, &config.data.schema));

    if json {
        print_json(&report)?;
    } else {
        for issue in report.issues() {
            println!("ERROR   {}", issue);
        }
        for warning in report.warnings() {
            println!("WARNING {}", warning);
        }
    }

    if !report.is_ok() {
        bail!("validation found {} issue(s)", report.issues().len());
    }
    info!("Artifacts and data are valid");
    Ok(())
}

fn run_predict(session: &ForecastSession, dates: &[String], json: bool) -> Result<()> {
    let mut failures = 0usize;
    let mut predictions = Vec::with_capacity(dates.len());
    for (date, result) in dates.iter().zip(session.predict_dates(dates)) {
        match result {
            Ok(prediction) => predictions.push(prediction),
            Err(e) => {
                failures += 1;
                warn!("{}: {}", date, e);
            }
        }
    }

    if json {
        print_json(&session.export(&predictions))?;
    } else {
        for p in &predictions {
            println!(
                "{}  {:.2}  [{:.2}, {:.2}]",
                p.target_date, p.predicted_price, p.uncertainty.lower, p.uncertainty.upper
            );
        }
    }

    if failures > 0 {
        bail!("{} of {} date(s) could not be predicted", failures, dates.len());
    }
    Ok(())
}

fn run_forecast(
    session: &ForecastSession,
    start: Option<&str>,
    periods: usize,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let start = match start {
        Some(text) => validate_date(text)?,
        None => session.next_period()?,
    };

    let forecast = match session.forecast(start, periods) {
        Ok(forecast) => forecast,
        Err(e) => {
            for p in &e.partial.predictions {
                println!("{}  {:.2}", p.target_date, p.predicted_price);
            }
            return Err(e.into());
        }
    };

    let envelope = session.export(&forecast);
    if let Some(path) = &output {
        envelope
            .write_json(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote forecast to {}", path.display());
    }

    if json {
        return print_json(&envelope);
    }
    println!(
        "{} forecast from {} ({} periods)",
        forecast.frequency.label(),
        forecast.start_date,
        forecast.len()
    );
    for p in &forecast.predictions {
        println!(
            "{:>3}  {}  {:.2}  ± {:.2}",
            p.step, p.target_date, p.predicted_price, p.uncertainty.margin
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
