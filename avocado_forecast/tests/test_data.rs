use avocado_forecast::config::DataSchema;
use avocado_forecast::data::{DataLoader, RecordOrigin, TimeSeries};
use avocado_forecast::error::ForecastError;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Fecha_Pub_DOF,Precio promedio,Estado").unwrap();
    writeln!(file, "2023-01-01,45.5,Michoacan").unwrap();
    writeln!(file, "2023-02-01 00:00:00,47.25,Michoacan").unwrap();
    writeln!(file, "2023-03-01, 46.0 ,Jalisco").unwrap();

    let series = DataLoader::from_csv(file.path(), &DataSchema::default()).unwrap();

    assert_eq!(series.len(), 3);
    assert_eq!(series.prices(), vec![45.5, 47.25, 46.0]);
    assert_eq!(
        series.date_range(),
        Some((date(2023, 1, 1), date(2023, 3, 1)))
    );
    assert!(series
        .records()
        .iter()
        .all(|r| r.origin == RecordOrigin::Observed));
}

#[test]
fn test_rows_are_sorted_and_duplicates_keep_last() {
    let csv = "Fecha_Pub_DOF,Precio promedio\n\
               2023-03-01,30.0\n\
               2023-01-01,10.0\n\
               2023-03-01,31.0\n\
               2023-02-01,20.0\n";

    let series = DataLoader::from_reader(csv.as_bytes(), &DataSchema::default()).unwrap();

    assert_eq!(
        series.dates(),
        vec![date(2023, 1, 1), date(2023, 2, 1), date(2023, 3, 1)]
    );
    assert_eq!(series.prices(), vec![10.0, 20.0, 31.0]);
}

#[test]
fn test_blank_prices_are_skipped() {
    let csv = "Fecha_Pub_DOF,Precio promedio\n2023-01-01,10.0\n2023-02-01,\n2023-03-01,12.0\n";

    let series = DataLoader::from_reader(csv.as_bytes(), &DataSchema::default()).unwrap();
    assert_eq!(series.len(), 2);
}

#[test]
fn test_custom_schema() {
    let csv = "date,price\n2023-01-01,10.0\n";
    let schema = DataSchema::new("date", "price");

    let series = DataLoader::from_reader(csv.as_bytes(), &schema).unwrap();
    assert_eq!(series.len(), 1);
}

#[test]
fn test_missing_columns_are_all_named() {
    let csv = "fecha,precio\n2023-01-01,10.0\n";

    match DataLoader::from_reader(csv.as_bytes(), &DataSchema::default()) {
        Err(ForecastError::Schema { missing }) => assert_eq!(
            missing,
            vec!["Fecha_Pub_DOF".to_string(), "Precio promedio".to_string()]
        ),
        other => panic!("Expected Schema error, got {:?}", other),
    }
}

#[test]
fn test_bad_cells_report_row_and_column() {
    let csv = "Fecha_Pub_DOF,Precio promedio\n2023-01-01,10.0\n2023-02-01,abc\n";

    match DataLoader::from_reader(csv.as_bytes(), &DataSchema::default()) {
        Err(ForecastError::Parse { row, column, .. }) => {
            assert_eq!(row, 3);
            assert_eq!(column, "Precio promedio");
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }

    let csv = "Fecha_Pub_DOF,Precio promedio\n01/02/2023,10.0\n";
    match DataLoader::from_reader(csv.as_bytes(), &DataSchema::default()) {
        Err(ForecastError::Parse { row, column, .. }) => {
            assert_eq!(row, 2);
            assert_eq!(column, "Fecha_Pub_DOF");
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_invalid_utf8_names_the_row() {
    let mut header = b"Fecha_Pub_DOF,Precio promedio".to_vec();
    header.extend_from_slice(b"\xff\n2023-01-01,10.0\n");
    match DataLoader::from_reader(header.as_slice(), &DataSchema::default()) {
        Err(ForecastError::Parse { row, .. }) => assert_eq!(row, 1),
        other => panic!("Expected Parse error, got {:?}", other),
    }

    let mut body = b"Fecha_Pub_DOF,Precio promedio\n2023-01-01,10.0\n".to_vec();
    body.extend_from_slice(b"2023-02-01,1\xff\n");
    match DataLoader::from_reader(body.as_slice(), &DataSchema::default()) {
        Err(ForecastError::Parse { row, .. }) => assert_eq!(row, 3),
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_date_with_malformed_time_part_is_rejected() {
    let csv = "Fecha_Pub_DOF,Precio promedio\n2023-01-01Tgarbage,1.0\n";
    match DataLoader::from_reader(csv.as_bytes(), &DataSchema::default()) {
        Err(ForecastError::Parse { row, column, .. }) => {
            assert_eq!(row, 2);
            assert_eq!(column, "Fecha_Pub_DOF");
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_non_positive_price_is_a_parse_error() {
    let csv = "Fecha_Pub_DOF,Precio promedio\n2023-01-01,0\n";
    assert!(matches!(
        DataLoader::from_reader(csv.as_bytes(), &DataSchema::default()),
        Err(ForecastError::Parse { .. })
    ));
}

#[test]
fn test_empty_sources() {
    let header_only = "Fecha_Pub_DOF,Precio promedio\n";
    assert!(matches!(
        DataLoader::from_reader(header_only.as_bytes(), &DataSchema::default()),
        Err(ForecastError::EmptySeries(_))
    ));

    let all_blank = "Fecha_Pub_DOF,Precio promedio\n2023-01-01,\n";
    assert!(matches!(
        DataLoader::from_reader(all_blank.as_bytes(), &DataSchema::default()),
        Err(ForecastError::EmptySeries(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = DataLoader::from_csv("nonexistent_file.csv", &DataSchema::default());
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_time_series_rejects_unordered_or_invalid_records() {
    assert!(TimeSeries::from_pairs(
        vec![date(2023, 2, 1), date(2023, 1, 1)],
        vec![1.0, 2.0]
    )
    .is_err());
    assert!(TimeSeries::from_pairs(vec![date(2023, 1, 1)], vec![-1.0]).is_err());
    assert!(TimeSeries::from_pairs(vec![date(2023, 1, 1)], vec![1.0, 2.0]).is_err());
}
