//! View-model types: everything a renderer needs, nothing it has to compute.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{DatasetId, Plot, PlotKind, XCoord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Time,
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub scale: ScaleKind,
    pub label: String,
}

/// One drawable point. `y` (and `x` on log axes) is already clamped for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub date: NaiveDate,
    /// Raw observation behind the point.
    pub value: Option<f64>,
    pub x: XCoord,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub country: String,
    /// Position in the requested country list (stable colour slot).
    pub index: usize,
    pub points: Vec<CurvePoint>,
}

impl Curve {
    pub fn last(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    pub fn max_y(&self) -> Option<f64> {
        self.points.iter().map(|p| p.y).reduce(f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The dataset has no row for this country.
    UnknownCountry,
    /// Normalization was requested but no population is known.
    MissingPopulation,
    /// The dataset could not be loaded this session.
    DatasetUnavailable,
    /// The pipeline left no drawable points (e.g. threshold never reached).
    EmptyCurve,
    /// The population table failed to load; normalized curves are skipped.
    PopulationUnavailable,
    /// The dataset repeated some `(country, date)` pairs; later values were kept.
    DuplicateObservations,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub country: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, country: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            country: country.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    /// Version of the `ChartConfig` this view was rendered from.
    pub version: u64,
    pub plot: Plot,
    pub dataset: DatasetId,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub curves: Vec<Curve>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ViewModel {
    pub fn kind(&self) -> PlotKind {
        self.plot.kind()
    }

    /// Curves with at least one point.
    pub fn drawable(&self) -> impl Iterator<Item = &Curve> {
        self.curves.iter().filter(|c| !c.points.is_empty())
    }

    pub fn point_count(&self) -> usize {
        self.curves.iter().map(|c| c.points.len()).sum()
    }
}
