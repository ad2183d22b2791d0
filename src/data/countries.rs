//! Country name canonicalization and population data.
//!
//! The upstream tables spell several countries differently. Every loader
//! passes names through `canonical_country_name` so that a single display
//! name keys both the time series and the population table.

use std::collections::HashMap;
use std::io::Read;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::CountryInfo;
use crate::error::AppError;
use crate::io::ingest::{self, IngestReport};

/// Source spelling -> display name.
pub const NAME_MAPPING: [(&str, &str); 18] = [
    ("Brunei", "Brunei Darussalam"),
    ("Congo (Kinshasa)", "Democratic Republic of the Congo"),
    ("Congo, Dem. Rep.", "Democratic Republic of the Congo"),
    ("Czechia", "Czech Republic"),
    ("Gambia, The", "The Gambia"),
    ("Egypt, Arab Rep.", "Egypt"),
    ("Eswatini", "Swaziland"),
    ("Iran, Islamic Rep.", "Iran"),
    ("Bahamas, The", "The Bahamas"),
    ("Korea, Rep.", "South Korea"),
    ("Korea, South", "South Korea"),
    ("Macedonia, FYR", "North Macedonia"),
    ("Russian Federation", "Russia"),
    ("Saint Lucia", "St. Lucia"),
    ("Saint Vincent and the Grenadines", "St. Vincent and the Grenadines"),
    ("Slovakia", "Slovak Republic"),
    ("US", "United States"),
    ("Venezuela, RB", "Venezuela"),
];

/// Name of the aggregate row added to Johns Hopkins data.
pub const WORLD: &str = "World";

/// Display name for `country` (unchanged when there is no alias).
pub fn canonical_country_name(country: &str) -> String {
    let trimmed = country.trim();
    NAME_MAPPING
        .iter()
        .find(|(from, _)| *from == trimmed)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Population rows keyed by canonical country name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CountryTable {
    by_name: HashMap<String, CountryInfo>,
}

impl CountryTable {
    pub fn from_infos(infos: impl IntoIterator<Item = CountryInfo>) -> Self {
        Self {
            by_name: infos.into_iter().map(|i| (i.country.clone(), i)).collect(),
        }
    }

    pub fn get(&self, country: &str) -> Option<&CountryInfo> {
        self.by_name.get(country)
    }

    /// Population usable for normalization (`None` when unknown or zero).
    pub fn population(&self, country: &str) -> Option<u64> {
        self.get(country).map(|i| i.population).filter(|p| *p > 0)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Read `population.csv` (`Country Name, Country Code, Year, Value`).
///
/// With `year = Some(y)` only rows for that year are used; otherwise the
/// latest year per country wins.
pub fn read_population<R: Read>(input: R, year: Option<i32>) -> Result<(CountryTable, IngestReport), AppError> {
    let mut reader = ingest::csv_reader(input);
    let headers = reader
        .headers()
        .map_err(|e| AppError::usage(format!("Failed to read population CSV headers: {e}")))?
        .clone();
    let header_map = ingest::build_header_map(&headers);
    let name_col = ingest::require_column(&header_map, "Country Name", "population CSV")?;
    let code_col = ingest::require_column(&header_map, "Country Code", "population CSV")?;
    let year_col = ingest::require_column(&header_map, "Year", "population CSV")?;
    let value_col = ingest::require_column(&header_map, "Value", "population CSV")?;

    let mut report = IngestReport::default();
    let mut best: HashMap<String, (i32, CountryInfo)> = HashMap::new();

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

        let Some(name) = ingest::get_field(&record, name_col) else {
            report.skip(line, "missing country name");
            continue;
        };
        let Some(row_year) = ingest::get_field(&record, year_col).and_then(|y| y.parse::<i32>().ok()) else {
            report.skip(line, format!("invalid year for '{name}'"));
            continue;
        };
        if year.is_some_and(|y| y != row_year) {
            continue;
        }
        let Some(population) = ingest::get_field(&record, value_col).and_then(ingest::parse_count) else {
            report.skip(line, format!("invalid population for '{name}'"));
            continue;
        };

        let country = canonical_country_name(name);
        let info = CountryInfo {
            country: country.clone(),
            code: ingest::get_field(&record, code_col).unwrap_or_default().to_string(),
            population: population.max(0.0) as u64,
        };
        report.rows_used += 1;
        match best.get(&country) {
            Some((seen_year, _)) if *seen_year > row_year => {}
            _ => {
                best.insert(country, (row_year, info));
            }
        }
    }

    for err in &report.row_errors {
        warn!(line = err.line, "population row skipped: {}", err.message);
    }
    debug!(countries = best.len(), rows = report.rows_read, "population table loaded");

    Ok((CountryTable::from_infos(best.into_values().map(|(_, i)| i)), report))
}
