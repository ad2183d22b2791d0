//! Shared CSV ingest helpers.
//!
//! The three upstream formats (JH wide, OWID long, population) differ in
//! layout, but share the same low-level needs:
//! - **Header lookup** that tolerates BOMs, stray whitespace, and case
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Lenient numbers**: blanks and garbage become `None`, never an error

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::AppError;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// What happened while reading one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

impl IngestReport {
    pub fn skip(&mut self, line: usize, message: impl Into<String>) {
        self.row_errors.push(RowError {
            line,
            message: message.into(),
        });
    }
}

/// Open a CSV file for one of the loaders.
pub fn open_csv(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::usage(format!("Failed to open CSV '{}': {e}", path.display())))
}

/// A lenient CSV reader (ragged rows allowed, fields trimmed).
pub fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Header name -> column index.
pub type HeaderMap = HashMap<String, usize>;

pub fn build_header_map(headers: &StringRecord) -> HeaderMap {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

pub fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

pub fn require_column(header_map: &HeaderMap, name: &str, what: &str) -> Result<usize, AppError> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| AppError::usage(format!("Missing required column in {what}: `{name}`")))
}

pub fn get_field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a count the way upstream tables mean it: leading integer part only.
///
/// `"1234"` and `"1234.0"` give 1234; blanks, `"."`, `"NaN"` and garbage give `None`.
pub fn parse_count(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v.trunc())
    } else {
        None
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parse a US short date header (`M/D/YY`, years in 2000s).
pub fn parse_us_short_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().split('/');
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    let year_raw = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let year: i32 = year_raw.parse().ok()?;
    let year = if year_raw.len() <= 2 { 2000 + year } else { year };
    NaiveDate::from_ymd_opt(year, month, day)
}
