//! CSV ingest and validation.
//!
//! Turns a production-history CSV into clean `WellPoint`s that are safe to
//! hand to the fitter.
//!
//! Design goals:
//! - **Strict schema**: the `time` and `production` columns must exist, with
//!   clear errors (exit code 2) when they don't
//! - **Row-level validation**: bad rows are skipped but reported, never
//!   silently dropped
//! - **No fitting logic here**: output is plain points plus bookkeeping

use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{DatasetStats, WellPoint};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: points + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub points: Vec<WellPoint>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Resolved indices of the two required columns.
struct Columns {
    time: usize,
    production: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, AppError> {
        Ok(Self {
            time: find_column(headers, "time")?,
            production: find_column(headers, "production")?,
        })
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, AppError> {
    headers
        .iter()
        .position(|h| normalize_header_name(h) == name)
        .ok_or_else(|| AppError::usage(format!("Missing required column: `{name}`")))
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on
    // the first header (e.g. "﻿time"). Strip it, or schema validation will
    // incorrectly report the column missing.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

/// Load a production-history CSV from disk.
pub fn load_well_points(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_well_points(file)
}

/// Parse a production-history CSV from any reader.
pub fn read_well_points<R: std::io::Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let columns = {
        let headers = reader
            .headers()
            .map_err(|e| AppError::usage(format!("Failed to read CSV headers: {e}")))?;
        Columns::resolve(headers)?
    };

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header row, and CSV line numbers are
        // 1-based, hence +2.
        let line = idx + 2;
        rows_read += 1;

        let outcome = result
            .map_err(|e| format!("CSV parse error: {e}"))
            .and_then(|record| parse_row(&record, &columns));
        match outcome {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = points.len();
    if rows_used == 0 {
        return Err(AppError::data("No valid data rows remain after parsing."));
    }

    let stats = DatasetStats::from_points(&points)
        .ok_or_else(|| AppError::data("No finite data points remain after parsing."))?;

    Ok(IngestedData {
        points,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<WellPoint, String> {
    Ok(WellPoint {
        time: parse_field(record, columns.time, "time")?,
        production: parse_field(record, columns.production, "production")?,
    })
}

fn parse_field(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{name}` value."))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid `{name}` value: '{raw}'."))?;
    if !value.is_finite() {
        return Err(format!("Non-finite `{name}` value."));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_csv() {
        let csv = "time,production\n0,100\n1,90.5\n2,82\n";
        let data = read_well_points(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 3);
        assert_eq!(data.rows_used, 3);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.points[1].time, 1.0);
        assert_eq!(data.points[1].production, 90.5);
        assert_eq!(data.stats.n_points, 3);
        assert_eq!(data.stats.time_max, 2.0);
        assert_eq!(data.stats.production_max, 100.0);
    }

    #[test]
    fn headers_are_normalized() {
        // BOM on the first header, mixed case, padding spaces.
        let csv = "\u{feff}Time , PRODUCTION\n0,10\n1,9\n";
        let data = read_well_points(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_used, 2);
    }

    #[test]
    fn extra_columns_are_ignored() {
        let csv = "well,time,production,comment\nW-1,0,100,first\nW-1,1,91,\n";
        let data = read_well_points(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.points[0].production, 100.0);
    }

    #[test]
    fn missing_time_column_is_a_usage_error() {
        let csv = "t,production\n0,100\n";
        let err = read_well_points(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("`time`"), "{err}");
    }

    #[test]
    fn missing_production_column_is_a_usage_error() {
        let csv = "time,rate\n0,100\n";
        let err = read_well_points(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("`production`"), "{err}");
    }

    #[test]
    fn bad_rows_are_reported_but_not_fatal() {
        let csv = "time,production\n0,100\nabc,90\n2,\n3,nan\n4,70\n";
        let data = read_well_points(csv.as_bytes()).unwrap();
        assert_eq!(data.rows_read, 5);
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.row_errors.len(), 3);
        assert_eq!(data.row_errors[0].line, 3);
        assert!(data.row_errors[0].message.contains("`time`"));
        assert!(data.row_errors[1].message.contains("`production`"));
        assert!(data.row_errors[2].message.contains("Non-finite"));
    }

    #[test]
    fn all_rows_bad_is_a_data_error() {
        let csv = "time,production\nx,y\n,\n";
        let err = read_well_points(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn header_only_file_is_a_data_error() {
        let csv = "time,production\n";
        let err = read_well_points(csv.as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
