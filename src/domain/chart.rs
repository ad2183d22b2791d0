//! Chart configuration: plot kinds, their parameter records, and state transitions.
//!
//! A `ChartConfig` is never modified in place. `ChartConfig::apply` takes a
//! `Patch` and returns the next config with a bumped `version`, so a render is
//! always a pure function of `(config, data)`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::DatasetId;

/// Countries shown when none are requested.
pub const DEFAULT_COUNTRIES: [&str; 7] = [
    "China", "Italy", "Denmark", "Germany", "Sweden", "Greece", "France",
];

/// Which plot to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    /// Values over calendar time (or days since alignment).
    Calendar,
    /// New values against the cumulative total.
    Trajectory,
    /// Days it took for the cumulative total to double.
    Doubling,
    /// New values divided by new values a fixed number of days earlier.
    Reproduction,
}

impl PlotKind {
    pub const ALL: [PlotKind; 4] = [
        PlotKind::Calendar,
        PlotKind::Trajectory,
        PlotKind::Doubling,
        PlotKind::Reproduction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlotKind::Calendar => "calendar",
            PlotKind::Trajectory => "trajectory",
            PlotKind::Doubling => "doubling",
            PlotKind::Reproduction => "reproduction",
        }
    }

    pub fn cycle(self, step: isize) -> PlotKind {
        let len = Self::ALL.len() as isize;
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0) as isize;
        Self::ALL[(idx + step).rem_euclid(len) as usize]
    }
}

/// Moving-average window lengths offered for smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SmoothWindow {
    #[serde(rename = "3")]
    #[value(name = "3")]
    Three,
    #[serde(rename = "7")]
    #[value(name = "7")]
    Seven,
}

impl SmoothWindow {
    pub fn len(self) -> usize {
        match self {
            SmoothWindow::Three => 3,
            SmoothWindow::Seven => 7,
        }
    }

    /// Off -> 3 -> 7 -> off.
    pub fn next(current: Option<SmoothWindow>) -> Option<SmoothWindow> {
        match current {
            None => Some(SmoothWindow::Three),
            Some(SmoothWindow::Three) => Some(SmoothWindow::Seven),
            Some(SmoothWindow::Seven) => None,
        }
    }
}

/// Lag (in days) used by the reproduction ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum RatioWindow {
    #[serde(rename = "4")]
    #[value(name = "4")]
    Four,
    #[serde(rename = "7")]
    #[value(name = "7")]
    Seven,
}

impl RatioWindow {
    pub fn len(self) -> usize {
        match self {
            RatioWindow::Four => 4,
            RatioWindow::Seven => 7,
        }
    }
}

/// How the x-axis is based.
///
/// The alignment threshold is not stored here: it follows from whether the
/// curve is normalized (see `alignment_threshold`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "days", rename_all = "snake_case")]
pub enum AlignMode {
    /// Calendar dates, unmodified.
    Full,
    /// Calendar dates, restricted to the last N days of each series.
    LastNDays(u32),
    /// Days since the first date the cumulative value reached the threshold.
    FirstAboveThreshold,
}

/// Align by first day with at least 0.1 per 100,000 inhabitants.
pub const ALIGN_THRESHOLD_NORMALIZED: f64 = 0.1;
/// Align by first day with at least 100 cases.
pub const ALIGN_THRESHOLD: f64 = 100.0;

pub fn alignment_threshold(normalize: bool) -> f64 {
    if normalize {
        ALIGN_THRESHOLD_NORMALIZED
    } else {
        ALIGN_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarParams {
    pub normalize: bool,
    pub cumulative: bool,
    pub logplot: bool,
    pub smooth: Option<SmoothWindow>,
    pub align: AlignMode,
}

impl Default for CalendarParams {
    fn default() -> Self {
        Self {
            normalize: true,
            cumulative: true,
            logplot: true,
            smooth: None,
            align: AlignMode::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrajectoryParams {
    pub normalize: bool,
    pub logplot: bool,
    pub smooth: Option<SmoothWindow>,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            normalize: true,
            logplot: true,
            smooth: Some(SmoothWindow::Three),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoublingParams {
    pub smooth: Option<SmoothWindow>,
}

impl Default for DoublingParams {
    fn default() -> Self {
        Self {
            smooth: Some(SmoothWindow::Three),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReproductionParams {
    pub normalize: bool,
    pub smooth: Option<SmoothWindow>,
    pub window: RatioWindow,
    pub align: AlignMode,
}

impl Default for ReproductionParams {
    fn default() -> Self {
        Self {
            normalize: false,
            smooth: Some(SmoothWindow::Seven),
            window: RatioWindow::Seven,
            align: AlignMode::Full,
        }
    }
}

/// The active plot together with the parameters only that plot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "plot", content = "params", rename_all = "lowercase")]
pub enum Plot {
    Calendar(CalendarParams),
    Trajectory(TrajectoryParams),
    Doubling(DoublingParams),
    Reproduction(ReproductionParams),
}

impl Plot {
    pub fn kind(&self) -> PlotKind {
        match self {
            Plot::Calendar(_) => PlotKind::Calendar,
            Plot::Trajectory(_) => PlotKind::Trajectory,
            Plot::Doubling(_) => PlotKind::Doubling,
            Plot::Reproduction(_) => PlotKind::Reproduction,
        }
    }

    pub fn normalize(&self) -> bool {
        match self {
            Plot::Calendar(p) => p.normalize,
            Plot::Trajectory(p) => p.normalize,
            Plot::Doubling(_) => false,
            Plot::Reproduction(p) => p.normalize,
        }
    }

    pub fn logplot(&self) -> bool {
        match self {
            Plot::Calendar(p) => p.logplot,
            Plot::Trajectory(p) => p.logplot,
            Plot::Doubling(_) | Plot::Reproduction(_) => false,
        }
    }
}

/// Remembered parameters for every plot kind, so switching plots and back
/// restores the previous toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlotParams {
    pub calendar: CalendarParams,
    pub trajectory: TrajectoryParams,
    pub doubling: DoublingParams,
    pub reproduction: ReproductionParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarPatch {
    ToggleNormalize,
    ToggleCumulative,
    ToggleLogplot,
    CycleSmooth,
    SetSmooth(Option<SmoothWindow>),
    SetAlign(AlignMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryPatch {
    ToggleNormalize,
    ToggleLogplot,
    CycleSmooth,
    SetSmooth(Option<SmoothWindow>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoublingPatch {
    CycleSmooth,
    SetSmooth(Option<SmoothWindow>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReproductionPatch {
    ToggleNormalize,
    CycleSmooth,
    SetSmooth(Option<SmoothWindow>),
    SetWindow(RatioWindow),
    SetAlign(AlignMode),
}

/// A single state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    SetPlot(PlotKind),
    CyclePlot(isize),
    SetDataset(DatasetId),
    CycleDataset(isize),
    SetCountries(Vec<String>),
    AddCountry(String),
    RemoveCountry(String),
    Calendar(CalendarPatch),
    Trajectory(TrajectoryPatch),
    Doubling(DoublingPatch),
    Reproduction(ReproductionPatch),
}

/// Immutable, versioned chart configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub version: u64,
    pub plot: PlotKind,
    pub params: PlotParams,
    pub dataset: DatasetId,
    pub countries: Vec<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            version: 0,
            plot: PlotKind::Calendar,
            params: PlotParams::default(),
            dataset: DatasetId::DEFAULT,
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ChartConfig {
    /// The active plot with its parameter record.
    pub fn active(&self) -> Plot {
        match self.plot {
            PlotKind::Calendar => Plot::Calendar(self.params.calendar),
            PlotKind::Trajectory => Plot::Trajectory(self.params.trajectory),
            PlotKind::Doubling => Plot::Doubling(self.params.doubling),
            PlotKind::Reproduction => Plot::Reproduction(self.params.reproduction),
        }
    }

    /// Apply one transition and return the next config.
    pub fn apply(&self, patch: Patch) -> ChartConfig {
        let mut next = self.clone();
        match patch {
            Patch::SetPlot(kind) => next.plot = kind,
            Patch::CyclePlot(step) => next.plot = next.plot.cycle(step),
            Patch::SetDataset(dataset) => next.dataset = dataset,
            Patch::CycleDataset(step) => next.dataset = next.dataset.cycle(step),
            Patch::SetCountries(countries) => {
                next.countries = Vec::new();
                for c in countries {
                    push_unique(&mut next.countries, c);
                }
            }
            Patch::AddCountry(country) => push_unique(&mut next.countries, country),
            Patch::RemoveCountry(country) => next.countries.retain(|c| *c != country),
            Patch::Calendar(p) => apply_calendar(&mut next.params.calendar, p),
            Patch::Trajectory(p) => apply_trajectory(&mut next.params.trajectory, p),
            Patch::Doubling(p) => apply_doubling(&mut next.params.doubling, p),
            Patch::Reproduction(p) => apply_reproduction(&mut next.params.reproduction, p),
        }
        next.fix_state();
        next.version = self.version + 1;
        next
    }

    /// Apply a sequence of transitions in order.
    pub fn apply_all(&self, patches: impl IntoIterator<Item = Patch>) -> ChartConfig {
        patches
            .into_iter()
            .fold(self.clone(), |config, patch| config.apply(patch))
    }

    // A log-scale calendar only makes sense for cumulative curves.
    fn fix_state(&mut self) {
        let calendar = &mut self.params.calendar;
        if calendar.logplot && !calendar.cumulative {
            calendar.logplot = false;
        }
    }
}

fn push_unique(countries: &mut Vec<String>, country: String) {
    let country = country.trim().to_string();
    if !country.is_empty() && !countries.contains(&country) {
        countries.push(country);
    }
}

fn apply_calendar(params: &mut CalendarParams, patch: CalendarPatch) {
    match patch {
        CalendarPatch::ToggleNormalize => params.normalize = !params.normalize,
        CalendarPatch::ToggleCumulative => params.cumulative = !params.cumulative,
        CalendarPatch::ToggleLogplot => params.logplot = !params.logplot,
        CalendarPatch::CycleSmooth => params.smooth = SmoothWindow::next(params.smooth),
        CalendarPatch::SetSmooth(w) => params.smooth = w,
        CalendarPatch::SetAlign(mode) => params.align = mode,
    }
}

fn apply_trajectory(params: &mut TrajectoryParams, patch: TrajectoryPatch) {
    match patch {
        TrajectoryPatch::ToggleNormalize => params.normalize = !params.normalize,
        TrajectoryPatch::ToggleLogplot => params.logplot = !params.logplot,
        TrajectoryPatch::CycleSmooth => params.smooth = SmoothWindow::next(params.smooth),
        TrajectoryPatch::SetSmooth(w) => params.smooth = w,
    }
}

fn apply_doubling(params: &mut DoublingParams, patch: DoublingPatch) {
    match patch {
        DoublingPatch::CycleSmooth => params.smooth = SmoothWindow::next(params.smooth),
        DoublingPatch::SetSmooth(w) => params.smooth = w,
    }
}

fn apply_reproduction(params: &mut ReproductionParams, patch: ReproductionPatch) {
    match patch {
        ReproductionPatch::ToggleNormalize => params.normalize = !params.normalize,
        ReproductionPatch::CycleSmooth => params.smooth = SmoothWindow::next(params.smooth),
        ReproductionPatch::SetSmooth(w) => params.smooth = w,
        ReproductionPatch::SetWindow(w) => params.window = w,
        ReproductionPatch::SetAlign(mode) => params.align = mode,
    }
}
