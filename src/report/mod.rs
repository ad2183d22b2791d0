//! Reporting utilities: per-curve summaries and formatted terminal output.

pub mod format;

pub use format::*;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::XCoord;
use crate::view::{Curve, ViewModel};

/// Headline numbers for one rendered curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSummary {
    pub country: String,
    pub index: usize,
    pub points: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub last_x: Option<XCoord>,
    pub last_y: Option<f64>,
    pub max_y: Option<f64>,
}

pub fn summarize_curve(curve: &Curve) -> CurveSummary {
    let last = curve.last();
    CurveSummary {
        country: curve.country.clone(),
        index: curve.index,
        points: curve.points.len(),
        first_date: curve.points.first().map(|p| p.date),
        last_date: last.map(|p| p.date),
        last_x: last.map(|p| p.x),
        last_y: last.map(|p| p.y),
        max_y: curve.max_y(),
    }
}

/// Summaries in request order, highest final value first when `rank` is set.
pub fn summarize(view: &ViewModel, rank: bool) -> Vec<CurveSummary> {
    let mut out: Vec<CurveSummary> = view.curves.iter().map(summarize_curve).collect();
    if rank {
        out.sort_by(|a, b| {
            b.last_y
                .unwrap_or(f64::NEG_INFINITY)
                .partial_cmp(&a.last_y.unwrap_or(f64::NEG_INFINITY))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    out
}
