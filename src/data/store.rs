//! Dataset store: lazy, permanently cached loads per dataset id.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::data::countries::CountryTable;
use crate::data::loader::RowLoader;
use crate::domain::{ChartConfig, DatasetId, Series};
use crate::series::{DuplicateObservation, JoinedTable, join};

/// Joined observations for every dataset fetched so far.
///
/// A dataset whose load fails or yields no rows is marked unavailable and
/// never retried in the same session.
pub struct DatasetStore {
    loader: Box<dyn RowLoader>,
    table: JoinedTable,
    unavailable: HashMap<DatasetId, String>,
    countries: Option<CountryTable>,
    countries_error: Option<String>,
    duplicates: Vec<DuplicateObservation>,
}

impl DatasetStore {
    pub fn new(loader: Box<dyn RowLoader>) -> Self {
        Self {
            loader,
            table: JoinedTable::default(),
            unavailable: HashMap::new(),
            countries: None,
            countries_error: None,
            duplicates: Vec::new(),
        }
    }

    pub fn describe_source(&self) -> String {
        self.loader.describe()
    }

    /// Make sure `dataset` is loaded. Returns whether it is available.
    pub fn fetch(&mut self, dataset: DatasetId) -> bool {
        if self.table.contains(dataset) {
            debug!(%dataset, "dataset cache hit");
            return true;
        }
        if self.unavailable.contains_key(&dataset) {
            return false;
        }

        let rows = match self.loader.load_rows(dataset) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(%dataset, "dataset unavailable: {err}");
                self.unavailable.insert(dataset, err.message().to_string());
                return false;
            }
        };

        let out = join(rows);
        self.duplicates.extend(out.duplicates);
        // Sibling datasets loaded from the same file are cached as well.
        for loaded in out.table.datasets() {
            info!(dataset = %loaded, countries = out.table.countries(loaded).len(), "dataset cached");
        }
        self.table.merge(out.table);

        if self.table.contains(dataset) {
            true
        } else {
            warn!(%dataset, "dataset has no rows; marking unavailable");
            self.unavailable.insert(dataset, "no rows".to_string());
            false
        }
    }

    /// Load the population table once. A failed load leaves an empty table.
    pub fn ensure_countries(&mut self) -> &CountryTable {
        if self.countries.is_none() {
            let table = match self.loader.load_countries() {
                Ok(table) => table,
                Err(err) => {
                    warn!("population data unavailable: {err}");
                    self.countries_error = Some(err.message().to_string());
                    CountryTable::default()
                }
            };
            self.countries = Some(table);
        }
        self.countries.get_or_insert_with(CountryTable::default)
    }

    /// Load everything `config` needs before rendering.
    pub fn prepare(&mut self, config: &ChartConfig) -> bool {
        if config.active().normalize() {
            self.ensure_countries();
        }
        self.fetch(config.dataset)
    }

    pub fn is_available(&self, dataset: DatasetId) -> bool {
        self.table.contains(dataset)
    }

    /// Why `dataset` is unavailable, if it is.
    pub fn unavailable_reason(&self, dataset: DatasetId) -> Option<&str> {
        self.unavailable.get(&dataset).map(String::as_str)
    }

    pub fn countries(&self) -> Option<&CountryTable> {
        self.countries.as_ref()
    }

    pub fn countries_error(&self) -> Option<&str> {
        self.countries_error.as_deref()
    }

    pub fn population(&self, country: &str) -> Option<u64> {
        self.countries.as_ref()?.population(country)
    }

    pub fn has_country(&self, dataset: DatasetId, country: &str) -> bool {
        self.table.has_country(dataset, country)
    }

    pub fn series(&self, dataset: DatasetId, country: &str) -> Series {
        self.table.series(dataset, country)
    }

    pub fn table(&self) -> &JoinedTable {
        &self.table
    }

    pub fn duplicates(&self) -> &[DuplicateObservation] {
        &self.duplicates
    }
}
