//! Row loaders: where observations and population rows come from.
//!
//! `RowLoader` is the seam between the dataset store and the outside world.
//! `FileLoader` reads the upstream CSV exports from a local directory;
//! `SampleLoader` (see `data::sample`) generates a synthetic dataset.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::data::countries::{CountryTable, read_population};
use crate::data::{jh, owid};
use crate::domain::{DatasetId, Observation, SourceFamily};
use crate::error::AppError;
use crate::io::ingest::open_csv;

/// Expected population file name inside the data directory.
pub const POPULATION_FILE: &str = "population.csv";

pub trait RowLoader: Send + Sync {
    /// Load the rows that contain `dataset`.
    ///
    /// A loader may return rows for sibling datasets of the same source
    /// family as well (OWID ships cases and deaths in one file).
    fn load_rows(&self, dataset: DatasetId) -> Result<Vec<Observation>, AppError>;

    /// Load the population table.
    fn load_countries(&self) -> Result<CountryTable, AppError>;

    /// Short description for log lines and summaries.
    fn describe(&self) -> String;
}

/// Reads CSV exports from a directory.
///
/// Layout: `owid_full_data.csv`, `jh_Confirmed.csv`, `jh_Deaths.csv`,
/// `jh_Recovered.csv`, `population.csv`.
#[derive(Debug, Clone)]
pub struct FileLoader {
    data_dir: PathBuf,
    population_year: Option<i32>,
}

impl FileLoader {
    pub fn new(data_dir: impl Into<PathBuf>, population_year: Option<i32>) -> Self {
        Self {
            data_dir: data_dir.into(),
            population_year,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file holding `dataset`.
    pub fn dataset_path(&self, dataset: DatasetId) -> PathBuf {
        match dataset.family() {
            SourceFamily::Owid => self.data_dir.join(owid::FILE_NAME),
            SourceFamily::Jh => self
                .data_dir
                .join(jh::file_name(dataset).unwrap_or_else(|| format!("{dataset}.csv"))),
        }
    }

    fn existing(&self, path: PathBuf) -> Result<PathBuf, AppError> {
        if path.is_file() {
            Ok(path)
        } else {
            Err(AppError::data_source(format!("Data file not found: '{}'", path.display())))
        }
    }
}

impl RowLoader for FileLoader {
    fn load_rows(&self, dataset: DatasetId) -> Result<Vec<Observation>, AppError> {
        let path = self.existing(self.dataset_path(dataset))?;
        debug!(path = %path.display(), %dataset, "reading dataset file");
        let file = open_csv(&path)?;
        let (rows, report) = match dataset.family() {
            SourceFamily::Owid => owid::read_full_data(file)?,
            SourceFamily::Jh => jh::read_time_series(file, dataset)?,
        };
        info!(
            %dataset,
            rows_read = report.rows_read,
            rows_skipped = report.row_errors.len(),
            observations = rows.len(),
            "dataset loaded"
        );
        Ok(rows)
    }

    fn load_countries(&self) -> Result<CountryTable, AppError> {
        let path = self.existing(self.data_dir.join(POPULATION_FILE))?;
        let (table, report) = read_population(open_csv(&path)?, self.population_year)?;
        info!(
            countries = table.len(),
            rows_skipped = report.row_errors.len(),
            "population loaded"
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("files in {}", self.data_dir.display())
    }
}
