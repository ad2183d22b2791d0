//! Johns Hopkins CSSE time series (wide format).
//!
//! One CSV per kind, one row per province/country, one column per date:
//!
//! `Province/State, Country/Region, Lat, Long, 1/22/20, 1/23/20, ...`
//!
//! Provinces are summed per canonical country and a `World` total is added
//! for every date.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::data::countries::{WORLD, canonical_country_name};
use crate::domain::{DatasetId, Observation};
use crate::error::AppError;
use crate::io::ingest::{self, IngestReport};

pub const KEY_COUNTRY: &str = "Country/Region";
pub const KEY_STATE: &str = "Province/State";
pub const KEY_LATITUDE: &str = "Lat";
pub const KEY_LONGITUDE: &str = "Long";

/// Expected file name for a JH dataset inside the data directory.
pub fn file_name(dataset: DatasetId) -> Option<String> {
    match dataset {
        DatasetId::JhConfirmed | DatasetId::JhDeaths | DatasetId::JhRecovered => {
            Some(format!("{}.csv", dataset.as_str()))
        }
        _ => None,
    }
}

/// Parse one JH time-series CSV into per-country observations for `dataset`.
///
/// A missing or malformed cell makes that country's total for that date
/// `None` (and the `World` total too), mirroring how the upstream sums behave.
pub fn read_time_series<R: Read>(input: R, dataset: DatasetId) -> Result<(Vec<Observation>, IngestReport), AppError> {
    let mut reader = ingest::csv_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| AppError::usage(format!("Failed to read {dataset} CSV headers: {e}")))?
        .clone();
    let header_map = ingest::build_header_map(&headers);
    let country_col = ingest::require_column(&header_map, KEY_COUNTRY, "Johns Hopkins CSV")?;

    // Every column that is not metadata must be a date.
    let metadata = [KEY_COUNTRY, KEY_STATE, KEY_LATITUDE, KEY_LONGITUDE].map(ingest::normalize_header_name);
    let mut date_cols: Vec<(usize, NaiveDate)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if metadata.contains(&ingest::normalize_header_name(name)) {
            continue;
        }
        let date = ingest::parse_us_short_date(name)
            .ok_or_else(|| AppError::usage(format!("Unexpected column '{name}' in {dataset} CSV")))?;
        date_cols.push((idx, date));
    }

    let mut report = IngestReport::default();
    let mut by_country: BTreeMap<String, BTreeMap<NaiveDate, Option<f64>>> = BTreeMap::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        report.rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                report.skip(line, format!("CSV parse error: {e}"));
                continue;
            }
        };
        let Some(country) = ingest::get_field(&record, country_col) else {
            report.skip(line, "missing country");
            continue;
        };
        report.rows_used += 1;

        let dates = by_country.entry(canonical_country_name(country)).or_default();
        for &(col, date) in &date_cols {
            let value = ingest::get_field(&record, col).and_then(ingest::parse_count);
            let total = dates.entry(date).or_insert(Some(0.0));
            *total = total.zip(value).map(|(a, b)| a + b);
        }
    }

    for err in &report.row_errors {
        warn!(line = err.line, %dataset, "row skipped: {}", err.message);
    }

    let mut world: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    let mut observations = Vec::new();
    for (country, dates) in by_country {
        for (date, value) in dates {
            let total = world.entry(date).or_insert(Some(0.0));
            *total = total.zip(value).map(|(a, b)| a + b);
            observations.push(Observation {
                country: country.clone(),
                date,
                value,
                source: dataset,
            });
        }
    }
    // A source that already carries a "World" row would collide with the
    // aggregate; the joiner reports that as a duplicate.
    for (date, value) in world {
        observations.push(Observation {
            country: WORLD.to_string(),
            date,
            value,
            source: dataset,
        });
    }

    debug!(%dataset, observations = observations.len(), dates = date_cols.len(), "JH time series parsed");
    Ok((observations, report))
}
