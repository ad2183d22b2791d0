//! Shared render workflow used by every command.
//!
//! load (cached) -> per-country pipeline -> view model -> summaries
//!
//! A `Session` owns the dataset cache and the current config. Each state
//! change produces a new config and a fresh render; the render gate makes
//! sure only the newest render is published.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::cli::SourceArgs;
use crate::data::{DatasetStore, FileLoader, RowLoader, SampleLoader};
use crate::domain::{ChartConfig, DatasetId, Patch};
use crate::error::AppError;
use crate::report::{CurveSummary, summarize};
use crate::view::{RenderGate, ViewModel, render};

/// First date of the Johns Hopkins series; synthetic data starts here too.
pub const SAMPLE_START: (i32, u32, u32) = (2020, 1, 22);

/// All computed outputs of a single `covplot plot` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub config: ChartConfig,
    pub view: ViewModel,
    pub summaries: Vec<CurveSummary>,
    pub source: String,
}

/// Pick the row loader the source flags describe.
pub fn build_loader(source: &SourceArgs) -> Box<dyn RowLoader> {
    if source.sample {
        let (y, m, d) = SAMPLE_START;
        let start = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        Box::new(SampleLoader::new(source.seed, start, source.sample_days))
    } else {
        Box::new(FileLoader::new(&source.data_dir, source.population_year))
    }
}

pub struct Session {
    store: DatasetStore,
    gate: RenderGate,
    config: ChartConfig,
}

impl Session {
    pub fn new(loader: Box<dyn RowLoader>, config: ChartConfig) -> Self {
        Self {
            store: DatasetStore::new(loader),
            gate: RenderGate::new(),
            config,
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Load what the current config needs and render it.
    ///
    /// Fails only when the dataset itself cannot be loaded; per-country
    /// problems end up as diagnostics on the view.
    ///
    /// `&mut self` serializes renders within one session, so every commit
    /// here is current. The gate only rejects views from callers that render
    /// the same store concurrently (see `view::gate`).
    pub fn render(&mut self) -> Result<ViewModel, AppError> {
        let ticket = self.gate.begin();
        let dataset = self.config.dataset;
        if !self.store.prepare(&self.config) {
            let reason = self.store.unavailable_reason(dataset).unwrap_or("no rows");
            return Err(AppError::data_source(format!("Dataset '{dataset}' is unavailable: {reason}")));
        }

        let view = render(&self.config, &self.store);
        if !self.gate.commit(ticket, view.clone()) {
            debug!(version = view.version, "render superseded");
        }
        Ok(self.gate.latest().unwrap_or(view))
    }

    /// Apply a state transition and render the result.
    pub fn update(&mut self, patch: Patch) -> Result<ViewModel, AppError> {
        self.config = self.config.apply(patch);
        self.render()
    }
}

/// Execute one render for `config` and summarize it.
pub fn run_plot(config: ChartConfig, loader: Box<dyn RowLoader>, rank: bool) -> Result<RunOutput, AppError> {
    let mut session = Session::new(loader, config);
    let source = session.store().describe_source();
    info!(%source, dataset = %session.config().dataset, plot = session.config().plot.as_str(), "rendering");

    let view = session.render()?;
    let summaries = summarize(&view, rank);

    Ok(RunOutput {
        config: session.config().clone(),
        view,
        summaries,
        source,
    })
}

/// Countries present in `dataset`, optionally filtered by a case-insensitive substring.
pub fn list_countries(store: &mut DatasetStore, dataset: DatasetId, filter: Option<&str>) -> Result<Vec<String>, AppError> {
    if !store.fetch(dataset) {
        let reason = store.unavailable_reason(dataset).unwrap_or("no rows");
        return Err(AppError::data_source(format!("Dataset '{dataset}' is unavailable: {reason}")));
    }
    let needle = filter.map(str::to_lowercase);
    Ok(store
        .table()
        .countries(dataset)
        .into_iter()
        .filter(|c| needle.as_ref().is_none_or(|n| c.to_lowercase().contains(n.as_str())))
        .collect())
}

/// Try to load every dataset. `Ok(countries)` for available ones, `Err(reason)` otherwise.
pub fn check_datasets(store: &mut DatasetStore) -> Vec<(DatasetId, Result<usize, String>)> {
    DatasetId::ALL
        .iter()
        .map(|&id| {
            let status = if store.fetch(id) {
                Ok(store.table().countries(id).len())
            } else {
                Err(store.unavailable_reason(id).unwrap_or("no rows").to_string())
            };
            (id, status)
        })
        .collect()
}
