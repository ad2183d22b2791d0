//! Our World in Data `full_data.csv` (long format).
//!
//! One row per country and date; every row yields one observation per kind
//! (`total_cases`, `total_deaths`).

use std::io::Read;

use tracing::{debug, warn};

use crate::data::countries::canonical_country_name;
use crate::domain::{DatasetId, Observation};
use crate::error::AppError;
use crate::io::ingest::{self, IngestReport};

pub const KEY_DATE: &str = "date";
pub const KEY_COUNTRY: &str = "location";
pub const TYPE_CASES: &str = "total_cases";
pub const TYPE_DEATHS: &str = "total_deaths";

/// Expected file name inside the data directory.
pub const FILE_NAME: &str = "owid_full_data.csv";

/// Column -> dataset pairs produced by this source.
pub const TYPES: [(&str, DatasetId); 2] = [
    (TYPE_CASES, DatasetId::OwidTotalCases),
    (TYPE_DEATHS, DatasetId::OwidTotalDeaths),
];

/// Parse `full_data.csv` into observations for both OWID datasets.
pub fn read_full_data<R: Read>(input: R) -> Result<(Vec<Observation>, IngestReport), AppError> {
    let mut reader = ingest::csv_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| AppError::usage(format!("Failed to read OWID CSV headers: {e}")))?
        .clone();
    let header_map = ingest::build_header_map(&headers);
    let date_col = ingest::require_column(&header_map, KEY_DATE, "OWID CSV")?;
    let country_col = ingest::require_column(&header_map, KEY_COUNTRY, "OWID CSV")?;
    let mut type_cols = Vec::with_capacity(TYPES.len());
    for (column, dataset) in TYPES {
        type_cols.push((ingest::require_column(&header_map, column, "OWID CSV")?, dataset));
    }

    let mut report = IngestReport::default();
    let mut observations = Vec::new();

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
        let Some(date) = ingest::get_field(&record, date_col).and_then(ingest::parse_iso_date) else {
            report.skip(line, "missing or invalid date");
            continue;
        };
        let Some(country) = ingest::get_field(&record, country_col) else {
            report.skip(line, "missing location");
            continue;
        };
        report.rows_used += 1;

        let country = canonical_country_name(country);
        for &(col, dataset) in &type_cols {
            observations.push(Observation {
                country: country.clone(),
                date,
                value: ingest::get_field(&record, col).and_then(ingest::parse_count),
                source: dataset,
            });
        }
    }

    for err in &report.row_errors {
        warn!(line = err.line, "OWID row skipped: {}", err.message);
    }
    debug!(observations = observations.len(), rows = report.rows_read, "OWID data parsed");
    Ok((observations, report))
}
