//! Pre-flight checks for artifacts, data files and user dates
//!
//! Validators never stop at the first problem. They collect every issue they
//! find into a [`ValidationReport`] so a caller can show the whole picture at
//! once. Findings that do not block a session, such as duplicate dates that
//! the loader resolves, are kept as warnings.

use crate::artifacts::{FeatureColumnsFile, ModelFile, ScalerFile};
use crate::config::{ArtifactConfig, DataSchema};
use crate::data::{parse_date_cell, parse_price_cell, DataLoader, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureName, MIN_HISTORY};
use crate::models::ModelSpec;
use crate::scaler::AffineScaler;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingFile,
    UnreadableFile,
    MissingColumn,
    InvalidValue,
    OutOfRange,
    Mismatch,
    Duplicate,
    InsufficientData,
    Empty,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// What the finding is about: a file, a column, a row
    pub subject: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Every issue and warning found by one validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing blocks a session
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|issue| issue.kind == kind)
    }

    pub fn push(&mut self, kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(kind, subject, message));
    }

    pub fn warn(&mut self, kind: IssueKind, subject: impl Into<String>, message: impl Into<String>) {
        self.warnings
            .push(ValidationIssue::new(kind, subject, message));
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
        self.warnings.extend(other.warnings);
    }

    /// `Ok(self)` when there are no blocking issues
    pub fn into_result(self) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ForecastError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "no issues");
        }
        write!(f, "{} issue(s): ", self.issues.len())?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// Check that the four artifact files exist, parse and agree with each other
pub fn validate_artifacts(config: &ArtifactConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    let model: Option<ModelFile> = read_resource(&config.model_path(), &mut report);
    let scaler_x: Option<ScalerFile> = read_resource(&config.scaler_x_path(), &mut report);
    let scaler_y: Option<ScalerFile> = read_resource(&config.scaler_y_path(), &mut report);
    let columns: Option<FeatureColumnsFile> =
        read_resource(&config.feature_columns_path(), &mut report);

    report.merge(validate_components(
        model.as_ref(),
        scaler_x.as_ref(),
        scaler_y.as_ref(),
        columns.as_ref(),
    ));
    report
}

fn read_resource<T: DeserializeOwned>(path: &Path, report: &mut ValidationReport) -> Option<T> {
    let subject = path.display().to_string();
    if !path.exists() {
        report.push(IssueKind::MissingFile, subject, "file not found");
        return None;
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            report.push(IssueKind::UnreadableFile, subject, e.to_string());
            return None;
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            report.push(
                IssueKind::InvalidValue,
                subject,
                format!("malformed content: {}", e),
            );
            None
        }
    }
}

/// Cross-check parsed artifact resources
///
/// Absent resources are skipped, so a partially readable artifact set still
/// gets every check its present parts allow.
pub fn validate_components(
    model: Option<&ModelFile>,
    scaler_x: Option<&ScalerFile>,
    scaler_y: Option<&ScalerFile>,
    columns: Option<&FeatureColumnsFile>,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    let width = columns.map(|file| {
        check_columns(file.columns(), &mut report);
        file.columns().len()
    });

    if let Some(file) = scaler_x {
        if let Err(e) = AffineScaler::from_spec(&file.scaler) {
            report.push(IssueKind::InvalidValue, "scaler_x", e.to_string());
        }
        if let Some(width) = width {
            if file.scaler.n_features() != width {
                report.push(
                    IssueKind::Mismatch,
                    "scaler_x",
                    format!(
                        "fit on {} features, feature list has {}",
                        file.scaler.n_features(),
                        width
                    ),
                );
            }
        }
    }

    if let Some(file) = scaler_y {
        if let Err(e) = AffineScaler::from_spec(&file.scaler) {
            report.push(IssueKind::InvalidValue, "scaler_y", e.to_string());
        }
        if file.scaler.n_features() != 1 {
            report.push(
                IssueKind::Mismatch,
                "scaler_y",
                format!(
                    "target scaler must have 1 column, has {}",
                    file.scaler.n_features()
                ),
            );
        }
    }

    if let Some(file) = model {
        if let Err(e) = file.model.clone().build() {
            report.push(IssueKind::InvalidValue, "model", e.to_string());
        }

        let expected = width.or_else(|| scaler_x.map(|s| s.scaler.n_features()));
        if let Some(expected) = expected {
            match &file.model {
                ModelSpec::Persistence(p) if p.feature_index >= expected => report.push(
                    IssueKind::OutOfRange,
                    "model",
                    format!(
                        "persistence reads input {}, only {} features are built",
                        p.feature_index, expected
                    ),
                ),
                spec => {
                    if let Some(n) = spec.n_features().filter(|&n| n != expected) {
                        report.push(
                            IssueKind::Mismatch,
                            "model",
                            format!("fit on {} features, inputs have {}", n, expected),
                        );
                    }
                }
            }
        }
    }

    check_run_ids(
        &[
            ("model", model.and_then(|f| f.run_id.as_deref())),
            ("scaler_x", scaler_x.and_then(|f| f.run_id.as_deref())),
            ("scaler_y", scaler_y.and_then(|f| f.run_id.as_deref())),
            ("feature_columns", columns.and_then(|f| f.run_id())),
        ],
        &mut report,
    );

    report
}

fn check_columns(columns: &[String], report: &mut ValidationReport) {
    if columns.is_empty() {
        report.push(IssueKind::Empty, "feature_columns", "feature list is empty");
        return;
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.parse::<FeatureName>().is_err() {
            report.push(
                IssueKind::InvalidValue,
                "feature_columns",
                format!("unknown feature '{}'", column),
            );
        }
        if !seen.insert(column.as_str()) {
            report.push(
                IssueKind::Duplicate,
                "feature_columns",
                format!("feature '{}' is listed more than once", column),
            );
        }
    }
}

fn check_run_ids(ids: &[(&str, Option<&str>)], report: &mut ValidationReport) {
    let present: Vec<(&str, &str)> = ids
        .iter()
        .filter_map(|(resource, id)| id.map(|id| (*resource, id)))
        .collect();

    let distinct: HashSet<&str> = present.iter().map(|(_, id)| *id).collect();
    if distinct.len() > 1 {
        let listing: Vec<String> = present
            .iter()
            .map(|(resource, id)| format!("{}={}", resource, id))
            .collect();
        report.push(
            IssueKind::Mismatch,
            "run_id",
            format!("artifacts come from different runs ({})", listing.join(", ")),
        );
    }
}

/// Check a historical data file
pub fn validate_data<P: AsRef<Path>>(path: P, schema: &DataSchema) -> ValidationReport {
    let path = path.as_ref();
    if !path.exists() {
        let mut report = ValidationReport::new();
        report.push(
            IssueKind::MissingFile,
            path.display().to_string(),
            "file not found",
        );
        return report;
    }

    match File::open(path) {
        Ok(file) => validate_data_reader(file, schema),
        Err(e) => {
            let mut report = ValidationReport::new();
            report.push(
                IssueKind::UnreadableFile,
                path.display().to_string(),
                e.to_string(),
            );
            report
        }
    }
}

/// Check historical data from any CSV source
///
/// Applies the same cell rules as [`DataLoader::from_reader`], but reports
/// every bad cell instead of stopping at the first.
pub fn validate_data_reader<R: Read>(reader: R, schema: &DataSchema) -> ValidationReport {
    let mut report = ValidationReport::new();
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = match csv_reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            report.push(IssueKind::UnreadableFile, "data", e.to_string());
            return report;
        }
    };

    let (date_idx, price_idx) = match DataLoader::locate_columns(&headers, schema) {
        Ok(positions) => positions,
        Err(ForecastError::Schema { missing }) => {
            for column in missing {
                report.push(IssueKind::MissingColumn, column, "required column is missing");
            }
            return report;
        }
        Err(e) => {
            report.push(IssueKind::InvalidValue, "data", e.to_string());
            return report;
        }
    };

    let mut rows = 0usize;
    let mut blank = 0usize;
    let mut duplicates = 0usize;
    let mut dates = HashSet::new();
    for (index, row) in csv_reader.records().enumerate() {
        let row_number = index + 2;
        rows += 1;

        let row = match row {
            Ok(row) => row,
            Err(e) => {
                report.push(IssueKind::InvalidValue, format!("row {}", row_number), e.to_string());
                continue;
            }
        };

        let price_cell = row.get(price_idx).unwrap_or("");
        if price_cell.is_empty() {
            blank += 1;
            continue;
        }

        let date = parse_date_cell(row.get(date_idx).unwrap_or(""));
        if let Err(message) = &date {
            report.push(
                IssueKind::InvalidValue,
                format!("row {}, column '{}'", row_number, schema.date_column),
                message.clone(),
            );
        }
        let price = parse_price_cell(price_cell);
        if let Err(message) = &price {
            report.push(
                IssueKind::InvalidValue,
                format!("row {}, column '{}'", row_number, schema.price_column),
                message.clone(),
            );
        }

        if let (Ok(date), Ok(_)) = (date, price) {
            if !dates.insert(date) {
                duplicates += 1;
            }
        }
    }

    if rows == 0 {
        report.push(IssueKind::Empty, "data", "file has no data rows");
    } else if dates.is_empty() {
        if report.is_ok() {
            report.push(IssueKind::Empty, "data", "no valid price records");
        }
    } else if dates.len() < MIN_HISTORY {
        report.push(
            IssueKind::InsufficientData,
            "data",
            format!(
                "{} distinct dates, forecasting needs at least {}",
                dates.len(),
                MIN_HISTORY
            ),
        );
    }

    if blank > 0 {
        report.warn(
            IssueKind::Empty,
            schema.price_column.clone(),
            format!("{} row(s) with a blank price will be skipped", blank),
        );
    }
    if duplicates > 0 {
        report.warn(
            IssueKind::Duplicate,
            schema.date_column.clone(),
            format!(
                "{} duplicate date(s), the last occurrence of each is kept",
                duplicates
            ),
        );
    }

    report
}

/// Check an in-memory series before forecasting from it
pub fn validate_series(series: &TimeSeries) -> ValidationReport {
    let mut report = ValidationReport::new();
    if series.is_empty() {
        report.push(IssueKind::Empty, "series", "series has no records");
        return report;
    }

    for (index, record) in series.records().iter().enumerate() {
        if !record.price.is_finite() || record.price <= 0.0 {
            report.push(
                IssueKind::OutOfRange,
                record.date.to_string(),
                format!("price must be positive, got {}", record.price),
            );
        }
        if index > 0 && series.records()[index - 1].date >= record.date {
            report.push(
                IssueKind::InvalidValue,
                record.date.to_string(),
                "dates are not strictly increasing",
            );
        }
    }

    if series.len() < MIN_HISTORY {
        report.push(
            IssueKind::InsufficientData,
            "series",
            format!(
                "{} records, forecasting needs at least {}",
                series.len(),
                MIN_HISTORY
            ),
        );
    }

    report
}

/// Parse a user supplied date in strict `YYYY-MM-DD` form
pub fn validate_date(input: &str) -> Result<NaiveDate> {
    let well_formed = input.len() == 10
        && input.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(ForecastError::InvalidDate(format!(
            "'{}' is not in YYYY-MM-DD format",
            input
        )));
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| ForecastError::InvalidDate(format!("'{}' is not a calendar date", input)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaler::ScalerSpec;
    use rstest::rstest;

    #[rstest]
    #[case("2024-12-15", true)]
    #[case("2024-02-29", true)]
    #[case("2023-02-29", false)]
    #[case("2024-13-01", false)]
    #[case("2024-1-01", false)]
    #[case("15/12/2024", false)]
    #[case("2024-12-15 00:00:00", false)]
    #[case(" 2024-12-15 ", false)]
    #[case("", false)]
    fn test_validate_date(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(validate_date(input).is_ok(), valid);
    }

    #[test]
    fn test_report_display_lists_every_issue() {
        let mut report = ValidationReport::new();
        assert_eq!(report.to_string(), "no issues");

        report.push(IssueKind::MissingFile, "model.json", "file not found");
        report.push(IssueKind::MissingColumn, "Precio promedio", "required column is missing");
        assert_eq!(
            report.to_string(),
            "2 issue(s): model.json: file not found; Precio promedio: required column is missing"
        );
    }

    #[test]
    fn test_warnings_do_not_fail_the_report() {
        let mut report = ValidationReport::new();
        report.warn(IssueKind::Duplicate, "Fecha_Pub_DOF", "1 duplicate date(s)");
        assert!(report.is_ok());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_components_report_dimension_mismatch() {
        let columns = FeatureColumnsFile::Plain(vec!["year".to_string(), "month".to_string()]);
        let scaler_x = ScalerFile {
            run_id: None,
            scaler: ScalerSpec::Identity { n_features: 3 },
        };
        let scaler_y = ScalerFile {
            run_id: None,
            scaler: ScalerSpec::Identity { n_features: 2 },
        };

        let report = validate_components(None, Some(&scaler_x), Some(&scaler_y), Some(&columns));
        assert_eq!(report.issues().len(), 2);
        assert!(report.has(IssueKind::Mismatch));
    }
}
