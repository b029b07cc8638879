use avocado_forecast::artifacts::{FeatureColumnsFile, ModelFile, ScalerFile};
use avocado_forecast::config::{ArtifactConfig, DataSchema};
use avocado_forecast::data::TimeSeries;
use avocado_forecast::error::ForecastError;
use avocado_forecast::models::{LinearRegressor, ModelSpec, Persistence};
use avocado_forecast::scaler::ScalerSpec;
use avocado_forecast::validation::{
    validate_artifacts, validate_components, validate_data, validate_data_reader, validate_date,
    validate_series, IssueKind,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

const VALID_CSV: &str = "Fecha_Pub_DOF,Precio promedio\n\
                         2023-01-01,40.0\n\
                         2023-02-01,41.0\n\
                         2023-03-01,42.5\n\
                         2023-04-01,41.5\n\
                         2023-05-01,43.0\n\
                         2023-06-01,44.0\n";

fn identity(n: usize) -> ScalerFile {
    ScalerFile {
        run_id: None,
        scaler: ScalerSpec::Identity { n_features: n },
    }
}

fn columns(names: &[&str]) -> FeatureColumnsFile {
    FeatureColumnsFile::Plain(names.iter().map(|n| n.to_string()).collect())
}

fn linear(n: usize) -> ModelFile {
    ModelFile {
        run_id: None,
        model: ModelSpec::Linear(LinearRegressor::new(vec![0.5; n], 0.0).unwrap()),
    }
}

#[test]
fn test_validate_date() {
    assert_eq!(
        validate_date("2024-12-15").unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 15).unwrap()
    );
    assert!(matches!(
        validate_date("2024-13-01"),
        Err(ForecastError::InvalidDate(_))
    ));
    assert!(matches!(
        validate_date("15-12-2024"),
        Err(ForecastError::InvalidDate(_))
    ));
}

#[test]
fn test_well_formed_data_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", VALID_CSV).unwrap();

    let report = validate_data(file.path(), &DataSchema::default());
    assert!(report.is_ok(), "unexpected issues: {}", report);
    assert!(report.warnings().is_empty());
}

#[test]
fn test_missing_price_column_is_named() {
    let csv = "Fecha_Pub_DOF,Precio\n2023-01-01,40.0\n";
    let report = validate_data_reader(csv.as_bytes(), &DataSchema::default());

    assert!(!report.is_ok());
    assert_eq!(report.issues().len(), 1);
    assert_eq!(report.issues()[0].kind, IssueKind::MissingColumn);
    assert_eq!(report.issues()[0].subject, "Precio promedio");
}

#[test]
fn test_every_bad_cell_is_reported() {
    let csv = "Fecha_Pub_DOF,Precio promedio\n\
               2023-01-01,40.0\n\
               2023-02-30,41.0\n\
               2023-03-01,-2\n\
               2023-04-01,abc\n";
    let report = validate_data_reader(csv.as_bytes(), &DataSchema::default());

    let subjects: Vec<&str> = report
        .issues()
        .iter()
        .filter(|i| i.kind == IssueKind::InvalidValue)
        .map(|i| i.subject.as_str())
        .collect();
    assert_eq!(
        subjects,
        vec![
            "row 3, column 'Fecha_Pub_DOF'",
            "row 4, column 'Precio promedio'",
            "row 5, column 'Precio promedio'",
        ]
    );
}

#[test]
fn test_short_history_and_empty_data() {
    let csv = "Fecha_Pub_DOF,Precio promedio\n2023-01-01,40.0\n2023-02-01,41.0\n";
    let report = validate_data_reader(csv.as_bytes(), &DataSchema::default());
    assert!(report.has(IssueKind::InsufficientData));

    let csv = "Fecha_Pub_DOF,Precio promedio\n";
    let report = validate_data_reader(csv.as_bytes(), &DataSchema::default());
    assert!(report.has(IssueKind::Empty));
}

#[test]
fn test_duplicates_and_blanks_are_warnings() {
    let csv = format!("{}2023-06-01,44.5\n2023-07-01,\n", VALID_CSV);
    let report = validate_data_reader(csv.as_bytes(), &DataSchema::default());

    assert!(report.is_ok());
    let kinds: Vec<IssueKind> = report.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![IssueKind::Empty, IssueKind::Duplicate]);
}

#[test]
fn test_missing_data_file() {
    let report = validate_data("does/not/exist.csv", &DataSchema::default());
    assert!(report.has(IssueKind::MissingFile));
}

#[test]
fn test_consistent_components() {
    let report = validate_components(
        Some(&linear(2)),
        Some(&identity(2)),
        Some(&identity(1)),
        Some(&columns(&["price_lag1", "price_ma3"])),
    );
    assert!(report.is_ok(), "unexpected issues: {}", report);
}

#[test]
fn test_component_problems_are_all_reported() {
    let report = validate_components(
        Some(&linear(3)),
        Some(&identity(2)),
        Some(&identity(2)),
        Some(&columns(&["price_lag1", "price_lag1", "volume"])),
    );

    // duplicate and unknown feature, scaler_x width, scaler_y width
    assert!(report.has(IssueKind::Duplicate));
    assert!(report.has(IssueKind::InvalidValue));
    let mismatched: Vec<&str> = report
        .issues()
        .iter()
        .filter(|i| i.kind == IssueKind::Mismatch)
        .map(|i| i.subject.as_str())
        .collect();
    assert_eq!(mismatched, vec!["scaler_x", "scaler_y"]);
}

#[test]
fn test_model_width_and_persistence_range() {
    let report = validate_components(
        Some(&linear(4)),
        None,
        None,
        Some(&columns(&["year", "month"])),
    );
    assert!(report.has(IssueKind::Mismatch));

    let persistence = ModelFile {
        run_id: None,
        model: ModelSpec::Persistence(Persistence::new(5)),
    };
    let report = validate_components(Some(&persistence), None, None, Some(&columns(&["year"])));
    assert!(report.has(IssueKind::OutOfRange));
}

#[test]
fn test_empty_feature_list() {
    let report = validate_components(None, None, None, Some(&columns(&[])));
    assert!(report.has(IssueKind::Empty));
}

#[test]
fn test_run_id_mismatch() {
    let mut model = linear(1);
    model.run_id = Some("2024-05-run".to_string());
    let tagged = FeatureColumnsFile::Tagged {
        run_id: Some("2024-06-run".to_string()),
        columns: vec!["price_lag1".to_string()],
    };

    let report = validate_components(Some(&model), Some(&identity(1)), Some(&identity(1)), Some(&tagged));
    assert_eq!(report.issues().len(), 1);
    assert_eq!(report.issues()[0].subject, "run_id");
}

#[test]
fn test_artifact_directory() {
    let dir = tempdir().unwrap();
    let config = ArtifactConfig {
        dir: dir.path().to_path_buf(),
        ..ArtifactConfig::default()
    };

    // nothing written yet: four missing files
    let report = validate_artifacts(&config);
    assert_eq!(report.issues().len(), 4);
    assert!(report.issues().iter().all(|i| i.kind == IssueKind::MissingFile));

    fs::write(
        config.model_path(),
        serde_json::to_string(&linear(1)).unwrap(),
    )
    .unwrap();
    fs::write(
        config.scaler_x_path(),
        serde_json::to_string(&identity(1)).unwrap(),
    )
    .unwrap();
    fs::write(
        config.scaler_y_path(),
        serde_json::to_string(&identity(1)).unwrap(),
    )
    .unwrap();
    fs::write(config.feature_columns_path(), "[\"price_lag1\"").unwrap();

    let report = validate_artifacts(&config);
    assert_eq!(report.issues().len(), 1);
    assert_eq!(report.issues()[0].kind, IssueKind::InvalidValue);

    fs::write(config.feature_columns_path(), "[\"price_lag1\"]").unwrap();
    assert!(validate_artifacts(&config).is_ok());
}

#[test]
fn test_series_checks() {
    let short = TimeSeries::from_pairs(
        vec![NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()],
        vec![10.0],
    )
    .unwrap();
    assert!(validate_series(&short).has(IssueKind::InsufficientData));

    let empty = TimeSeries::new(Vec::new()).unwrap();
    assert!(validate_series(&empty).has(IssueKind::Empty));
}
