//! Historical price series and CSV loading

use crate::config::DataSchema;
use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// Loaded from the historical data source
    Observed,
    /// Appended by a horizon forecast
    Predicted,
}

/// One dated price observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub origin: RecordOrigin,
}

impl PriceRecord {
    pub fn observed(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price,
            origin: RecordOrigin::Observed,
        }
    }

    pub fn predicted(date: NaiveDate, price: f64) -> Self {
        Self {
            date,
            price,
            origin: RecordOrigin::Predicted,
        }
    }
}

/// Price series with strictly increasing dates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    records: Vec<PriceRecord>,
}

impl TimeSeries {
    /// Build a series from records that are already in date order
    pub fn new(records: Vec<PriceRecord>) -> Result<Self> {
        for (index, record) in records.iter().enumerate() {
            if !record.price.is_finite() || record.price <= 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Price on {} must be a positive number, got {}",
                    record.date, record.price
                )));
            }
            if index > 0 && records[index - 1].date >= record.date {
                return Err(ForecastError::DataError(format!(
                    "Dates must be strictly increasing: {} follows {}",
                    record.date,
                    records[index - 1].date
                )));
            }
        }

        Ok(Self { records })
    }

    /// Build an observed series from parallel date and price vectors
    pub fn from_pairs(dates: Vec<NaiveDate>, prices: Vec<f64>) -> Result<Self> {
        if dates.len() != prices.len() {
            return Err(ForecastError::DataError(format!(
                "Dates length ({}) doesn't match prices length ({})",
                dates.len(),
                prices.len()
            )));
        }

        Self::new(
            dates
                .into_iter()
                .zip(prices)
                .map(|(date, price)| PriceRecord::observed(date, price))
                .collect(),
        )
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&PriceRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&PriceRecord> {
        self.records.last()
    }

    /// Get the prices as a vector
    pub fn prices(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.price).collect()
    }

    /// Get the dates as a vector
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// First and last date, if any
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first()?.date, self.last()?.date))
    }

    /// Records dated strictly before `date`
    pub fn before(&self, date: NaiveDate) -> &[PriceRecord] {
        let end = self.records.partition_point(|r| r.date < date);
        &self.records[..end]
    }

    /// Records dated on or after `date`
    pub fn since(&self, date: NaiveDate) -> &[PriceRecord] {
        let start = self.records.partition_point(|r| r.date < date);
        &self.records[start..]
    }

    /// Append a record after the current last date
    pub(crate) fn push(&mut self, record: PriceRecord) -> Result<()> {
        if let Some(last) = self.records.last() {
            if record.date <= last.date {
                return Err(ForecastError::DataError(format!(
                    "Cannot append {} after {}",
                    record.date, last.date
                )));
            }
        }
        if !record.price.is_finite() || record.price <= 0.0 {
            return Err(ForecastError::DataError(format!(
                "Cannot append non-positive price {} for {}",
                record.price, record.date
            )));
        }

        self.records.push(record);
        Ok(())
    }
}

/// Data loader for historical price files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a price series from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, schema: &DataSchema) -> Result<TimeSeries> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let series = Self::from_reader(file, schema)?;
        info!(
            "Loaded {} price records from {}",
            series.len(),
            path.display()
        );
        Ok(series)
    }

    /// Load a price series from any CSV source
    ///
    /// Blank price cells are treated as missing observations and skipped.
    /// When a date appears more than once, the last occurrence in the file wins.
    pub fn from_reader<R: Read>(reader: R, schema: &DataSchema) -> Result<TimeSeries> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers().map_err(|e| row_error(e, 1))?;
        let (date_idx, price_idx) = Self::locate_columns(headers, schema)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (index, row) in csv_reader.records().enumerate() {
            // header is line 1
            let row_number = index as u64 + 2;
            let row = row.map_err(|e| row_error(e, row_number))?;

            let price_cell = row.get(price_idx).unwrap_or("");
            if price_cell.is_empty() {
                skipped += 1;
                continue;
            }

            let date = parse_date_cell(row.get(date_idx).unwrap_or("")).map_err(|message| {
                ForecastError::Parse {
                    row: row_number,
                    column: schema.date_column.clone(),
                    message,
                }
            })?;
            let price = parse_price_cell(price_cell).map_err(|message| ForecastError::Parse {
                row: row_number,
                column: schema.price_column.clone(),
                message,
            })?;

            records.push(PriceRecord::observed(date, price));
        }

        if skipped > 0 {
            warn!("Skipped {} rows with a blank price", skipped);
        }
        if records.is_empty() {
            return Err(ForecastError::EmptySeries(
                "no valid price records in source".to_string(),
            ));
        }

        let (records, duplicates) = sort_and_dedup(records);
        if duplicates > 0 {
            warn!(
                "Dropped {} duplicate date(s), keeping the last occurrence of each",
                duplicates
            );
        }
        debug!("Series spans {} records after cleaning", records.len());

        TimeSeries::new(records)
    }

    /// Find the date and price column positions in a header row
    pub(crate) fn locate_columns(
        headers: &csv::StringRecord,
        schema: &DataSchema,
    ) -> Result<(usize, usize)> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let date_idx = find(&schema.date_column);
        let price_idx = find(&schema.price_column);

        match (date_idx, price_idx) {
            (Some(date_idx), Some(price_idx)) => Ok((date_idx, price_idx)),
            _ => {
                let mut missing = Vec::new();
                if date_idx.is_none() {
                    missing.push(schema.date_column.clone());
                }
                if price_idx.is_none() {
                    missing.push(schema.price_column.clone());
                }
                Err(ForecastError::Schema { missing })
            }
        }
    }
}

/// Parse a date cell; an `HH:MM:SS` time part is accepted and dropped
pub(crate) fn parse_date_cell(cell: &str) -> std::result::Result<NaiveDate, String> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(cell, format) {
            return Ok(timestamp.date());
        }
    }

    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", cell, e))
}

/// Parse a price cell as a positive finite number
pub(crate) fn parse_price_cell(cell: &str) -> std::result::Result<f64, String> {
    let price: f64 = cell
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", cell, e))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(format!("price must be positive, got {}", cell));
    }

    Ok(price)
}

fn row_error(err: csv::Error, row_number: u64) -> ForecastError {
    let row = err
        .position()
        .map(|p| p.line())
        .unwrap_or(row_number);
    ForecastError::Parse {
        row,
        column: "*".to_string(),
        message: err.to_string(),
    }
}

/// Sort by date and keep the last occurrence of each date
fn sort_and_dedup(mut records: Vec<PriceRecord>) -> (Vec<PriceRecord>, usize) {
    // stable, so file order is kept among equal dates
    records.sort_by_key(|r| r.date);

    let total = records.len();
    let mut deduped: Vec<PriceRecord> = Vec::with_capacity(total);
    for record in records {
        match deduped.last_mut() {
            Some(last) if last.date == record.date => *last = record,
            _ => deduped.push(record),
        }
    }

    let duplicates = total - deduped.len();
    (deduped, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_cell_accepts_time_suffix() {
        assert_eq!(parse_date_cell("2023-04-05"), Ok(date(2023, 4, 5)));
        assert_eq!(parse_date_cell("2023-04-05 00:00:00"), Ok(date(2023, 4, 5)));
        assert_eq!(parse_date_cell("2023-04-05T12:30:00"), Ok(date(2023, 4, 5)));
        assert!(parse_date_cell("05/04/2023").is_err());
        assert!(parse_date_cell("2023-02-30").is_err());
        assert!(parse_date_cell("2023-01-01Tgarbage").is_err());
        assert!(parse_date_cell("2023-01-01 noon").is_err());
        assert!(parse_date_cell("2023-01-01T25:00:00").is_err());
    }

    #[test]
    fn test_parse_price_cell() {
        assert_eq!(parse_price_cell("45.5"), Ok(45.5));
        assert!(parse_price_cell("abc").is_err());
        assert!(parse_price_cell("0").is_err());
        assert!(parse_price_cell("-3.2").is_err());
        assert!(parse_price_cell("NaN").is_err());
    }

    #[test]
    fn test_sort_and_dedup_keeps_last_occurrence() {
        let records = vec![
            PriceRecord::observed(date(2023, 3, 1), 30.0),
            PriceRecord::observed(date(2023, 1, 1), 10.0),
            PriceRecord::observed(date(2023, 3, 1), 31.0),
            PriceRecord::observed(date(2023, 2, 1), 20.0),
        ];

        let (deduped, duplicates) = sort_and_dedup(records);
        assert_eq!(duplicates, 1);
        let prices: Vec<f64> = deduped.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![10.0, 20.0, 31.0]);
    }

    #[test]
    fn test_before_and_since_split_on_date() {
        let series = TimeSeries::from_pairs(
            vec![date(2023, 1, 1), date(2023, 2, 1), date(2023, 3, 1)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();

        assert_eq!(series.before(date(2023, 2, 1)).len(), 1);
        assert_eq!(series.before(date(2023, 2, 2)).len(), 2);
        assert_eq!(series.since(date(2023, 2, 1)).len(), 2);
        assert_eq!(series.before(date(2022, 1, 1)).len(), 0);
    }

    #[test]
    fn test_push_requires_later_date() {
        let mut series =
            TimeSeries::from_pairs(vec![date(2023, 1, 1)], vec![1.0]).unwrap();
        assert!(series
            .push(PriceRecord::predicted(date(2023, 1, 1), 2.0))
            .is_err());
        assert!(series
            .push(PriceRecord::predicted(date(2023, 2, 1), 2.0))
            .is_ok());
        assert_eq!(series.last().unwrap().origin, RecordOrigin::Predicted);
    }
}
