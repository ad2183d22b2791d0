//! Command-line parsing for the COVID-19 curve plotter.
//!
//! Argument parsing and command dispatch stay separate from the pipeline
//! code: this module only describes flags and turns the plot flags into a
//! `ChartConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{
    AlignMode, CalendarPatch, ChartConfig, DatasetId, DoublingPatch, Patch, PlotKind, RatioWindow,
    ReproductionPatch, SmoothWindow, TrajectoryPatch,
};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covplot", version, about = "COVID-19 case and death curves in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render curves for a set of countries, print a summary, and optionally export.
    Plot(PlotArgs),
    /// List the countries present in a dataset.
    Countries(CountriesArgs),
    /// List the known datasets (optionally checking which ones load).
    Datasets(DatasetsArgs),
}

/// Where the data comes from. Shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Directory holding the CSV exports.
    #[arg(long, env = "COVPLOT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Use population figures for this year (default: latest per country).
    #[arg(long)]
    pub population_year: Option<i32>,

    /// Use seeded synthetic data instead of the data directory.
    #[arg(long)]
    pub sample: bool,

    /// Random seed for `--sample`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of days generated by `--sample`.
    #[arg(long, default_value_t = 150)]
    pub sample_days: usize,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SmoothChoice {
    Off,
    #[value(name = "3")]
    Three,
    #[value(name = "7")]
    Seven,
}

impl SmoothChoice {
    pub fn window(self) -> Option<SmoothWindow> {
        match self {
            SmoothChoice::Off => None,
            SmoothChoice::Three => Some(SmoothWindow::Three),
            SmoothChoice::Seven => Some(SmoothWindow::Seven),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlignChoice {
    /// Calendar dates.
    Full,
    /// Days since the series first reached the alignment threshold.
    Threshold,
    /// Calendar dates, last N days only (see `--last-days`).
    Last,
}

/// Days kept by `--align last` when `--last-days` is not given.
pub const DEFAULT_LAST_DAYS: u32 = 28;

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Plot kind.
    #[arg(short = 'p', long = "plot", value_enum, default_value_t = PlotKind::Calendar)]
    pub kind: PlotKind,

    /// Dataset id (see `covplot datasets`).
    #[arg(short = 'd', long, default_value_t = DatasetId::DEFAULT)]
    pub dataset: DatasetId,

    /// Country to plot (repeatable; default: a fixed set of countries).
    #[arg(short = 'c', long = "country")]
    pub countries: Vec<String>,

    /// Divide by population (per 100,000 inhabitants).
    #[arg(long)]
    pub normalize: Option<bool>,

    /// Cumulative totals instead of daily values (calendar only).
    #[arg(long)]
    pub cumulative: Option<bool>,

    /// Log-scale axes (calendar and trajectory).
    #[arg(long)]
    pub logplot: Option<bool>,

    /// Moving-average window.
    #[arg(long, value_enum)]
    pub smooth: Option<SmoothChoice>,

    /// X-axis alignment (calendar and reproduction).
    #[arg(long, value_enum)]
    pub align: Option<AlignChoice>,

    /// Window for `--align last` (implies it when given alone).
    #[arg(long)]
    pub last_days: Option<u32>,

    /// Lag for the reproduction ratio.
    #[arg(long, value_enum)]
    pub ratio_window: Option<RatioWindow>,

    /// Order the summary table by final value.
    #[arg(long)]
    pub rank: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export drawn points to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the whole view model (with its config) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CountriesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Dataset id.
    #[arg(short = 'd', long, default_value_t = DatasetId::DEFAULT)]
    pub dataset: DatasetId,

    /// Case-insensitive substring filter.
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct DatasetsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Try loading every dataset and report which are available.
    #[arg(long)]
    pub check: bool,
}

impl PlotArgs {
    /// Build the chart config the flags describe.
    ///
    /// A flag the chosen plot kind does not understand is a usage error.
    pub fn chart_config(&self) -> Result<ChartConfig, AppError> {
        let mut patches = vec![Patch::SetPlot(self.kind), Patch::SetDataset(self.dataset)];
        if !self.countries.is_empty() {
            patches.push(Patch::SetCountries(self.countries.clone()));
        }

        let align = self.align_mode()?;
        let smooth = self.smooth.map(SmoothChoice::window);

        match self.kind {
            PlotKind::Calendar => {
                self.reject(self.ratio_window.is_some(), "--ratio-window")?;
                let current = ChartConfig::default().params.calendar;
                if self.logplot == Some(true) && self.cumulative == Some(false) {
                    return Err(AppError::usage("--logplot true requires cumulative values"));
                }
                if self.normalize.is_some_and(|v| v != current.normalize) {
                    patches.push(Patch::Calendar(CalendarPatch::ToggleNormalize));
                }
                // Turning cumulative off also turns the log axis off (see `ChartConfig::apply`).
                if self.cumulative.is_some_and(|v| v != current.cumulative) {
                    patches.push(Patch::Calendar(CalendarPatch::ToggleCumulative));
                }
                if self.logplot.is_some_and(|v| v != current.logplot) {
                    patches.push(Patch::Calendar(CalendarPatch::ToggleLogplot));
                }
                if let Some(w) = smooth {
                    patches.push(Patch::Calendar(CalendarPatch::SetSmooth(w)));
                }
                if let Some(mode) = align {
                    patches.push(Patch::Calendar(CalendarPatch::SetAlign(mode)));
                }
            }
            PlotKind::Trajectory => {
                self.reject(self.cumulative.is_some(), "--cumulative")?;
                self.reject(align.is_some(), "--align/--last-days")?;
                self.reject(self.ratio_window.is_some(), "--ratio-window")?;
                let current = ChartConfig::default().params.trajectory;
                if self.normalize.is_some_and(|v| v != current.normalize) {
                    patches.push(Patch::Trajectory(TrajectoryPatch::ToggleNormalize));
                }
                if self.logplot.is_some_and(|v| v != current.logplot) {
                    patches.push(Patch::Trajectory(TrajectoryPatch::ToggleLogplot));
                }
                if let Some(w) = smooth {
                    patches.push(Patch::Trajectory(TrajectoryPatch::SetSmooth(w)));
                }
            }
            PlotKind::Doubling => {
                self.reject(self.normalize.is_some(), "--normalize")?;
                self.reject(self.cumulative.is_some(), "--cumulative")?;
                self.reject(self.logplot.is_some(), "--logplot")?;
                self.reject(align.is_some(), "--align/--last-days")?;
                self.reject(self.ratio_window.is_some(), "--ratio-window")?;
                if let Some(w) = smooth {
                    patches.push(Patch::Doubling(DoublingPatch::SetSmooth(w)));
                }
            }
            PlotKind::Reproduction => {
                self.reject(self.cumulative.is_some(), "--cumulative")?;
                self.reject(self.logplot.is_some(), "--logplot")?;
                let current = ChartConfig::default().params.reproduction;
                if self.normalize.is_some_and(|v| v != current.normalize) {
                    patches.push(Patch::Reproduction(ReproductionPatch::ToggleNormalize));
                }
                if let Some(w) = smooth {
                    patches.push(Patch::Reproduction(ReproductionPatch::SetSmooth(w)));
                }
                if let Some(w) = self.ratio_window {
                    patches.push(Patch::Reproduction(ReproductionPatch::SetWindow(w)));
                }
                if let Some(mode) = align {
                    patches.push(Patch::Reproduction(ReproductionPatch::SetAlign(mode)));
                }
            }
        }

        let config = ChartConfig::default().apply_all(patches);
        if config.countries.is_empty() {
            return Err(AppError::usage("At least one non-empty --country is required"));
        }
        Ok(config)
    }

    fn align_mode(&self) -> Result<Option<AlignMode>, AppError> {
        if self.last_days == Some(0) {
            return Err(AppError::usage("--last-days must be at least 1"));
        }
        match (self.align, self.last_days) {
            (None, None) => Ok(None),
            (None | Some(AlignChoice::Last), Some(n)) => Ok(Some(AlignMode::LastNDays(n))),
            (Some(AlignChoice::Last), None) => Ok(Some(AlignMode::LastNDays(DEFAULT_LAST_DAYS))),
            (Some(AlignChoice::Full), None) => Ok(Some(AlignMode::Full)),
            (Some(AlignChoice::Threshold), None) => Ok(Some(AlignMode::FirstAboveThreshold)),
            (Some(_), Some(_)) => Err(AppError::usage("--last-days only applies to --align last")),
        }
    }

    fn reject(&self, present: bool, flag: &str) -> Result<(), AppError> {
        if present {
            Err(AppError::usage(format!(
                "{flag} does not apply to the {} plot",
                self.kind.as_str()
            )))
        } else {
            Ok(())
        }
    }
}
