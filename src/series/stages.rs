//! Pure per-series transform stages.
//!
//! Every stage takes a chronologically sorted slice of points for one
//! country and returns a new vector of the same length. Bad data never
//! raises an error: it turns into `y = None` and is dropped by `drop_invalid`.

use std::collections::VecDeque;

use crate::domain::{Point, XCoord};

/// Per-capita scale: values are expressed per 100,000 inhabitants.
pub const PER_CAPITA_SCALE: f64 = 100_000.0;

/// `y = value`.
pub fn to_y(points: &[Point]) -> Vec<Point> {
    points.iter().map(|p| p.with_y(p.value)).collect()
}

/// `y *= 100000 / population`; every `y` becomes `None` without a usable population.
pub fn normalize(points: &[Point], population: Option<u64>) -> Vec<Point> {
    let factor = match population {
        Some(pop) if pop > 0 => Some(PER_CAPITA_SCALE / pop as f64),
        _ => None,
    };
    points
        .iter()
        .map(|p| p.with_y(factor.and_then(|f| p.y.map(|y| y * f))))
        .collect()
}

/// Convert cumulative totals into day-over-day differences.
///
/// The previous total starts at 0 and only advances on valid (`> 0`) values;
/// invalid points pass through unchanged and are dropped later.
pub fn cumulative_to_delta(points: &[Point]) -> Vec<Point> {
    let mut previous = 0.0;
    points
        .iter()
        .map(|p| match p.valid_y() {
            Some(cumulative) if cumulative > 0.0 => {
                let delta = cumulative - previous;
                previous = cumulative;
                p.with_y(Some(delta))
            }
            _ => *p,
        })
        .collect()
}

/// Running sum; the inverse of `cumulative_to_delta` on non-decreasing input.
pub fn cumulative_sum(points: &[Point]) -> Vec<Point> {
    let mut total = 0.0;
    points
        .iter()
        .map(|p| match p.y {
            Some(y) => {
                total += y;
                p.with_y(Some(total))
            }
            None => *p,
        })
        .collect()
}

/// Trailing moving average over the last `window` samples.
///
/// The buffer is seeded with zeros, so the first `window - 1` outputs are
/// biased towards zero. A missing value anywhere in the window makes the
/// output missing. A window of 0 behaves like 1.
pub fn smooth(points: &[Point], window: usize) -> Vec<Point> {
    let window = window.max(1);
    let mut buffer: VecDeque<Option<f64>> = std::iter::repeat(Some(0.0)).take(window).collect();
    points
        .iter()
        .map(|p| {
            buffer.pop_front();
            buffer.push_back(p.valid_y());
            let sum: Option<f64> = buffer.iter().copied().sum();
            p.with_y(sum.map(|s| s / window as f64))
        })
        .collect()
}

/// `y[i] / y[i - window]` when the lagged value is at least 1, else unchanged.
///
/// Lagged values before the start of the series count as 1.
pub fn reproduction_ratio(points: &[Point], window: usize) -> Vec<Point> {
    let mut lagged: VecDeque<Option<f64>> = std::iter::repeat(Some(1.0)).take(window).collect();
    points
        .iter()
        .map(|p| {
            let current = p.valid_y();
            lagged.push_back(current);
            let reference = lagged.pop_front().flatten();
            match (current, reference) {
                (Some(y), Some(r)) if r >= 1.0 => p.with_y(Some(y / r)),
                _ => *p,
            }
        })
        .collect()
}

/// `x` becomes the current (cumulative) `y`.
pub fn trajectory_x(points: &[Point]) -> Vec<Point> {
    points
        .iter()
        .map(|p| p.with_x(p.valid_y().map(XCoord::Value)))
        .collect()
}

/// Doubling time in days, from a cumulative series.
///
/// For each point, `y` becomes the number of days since the last date before
/// the series first reached half of the point's value. Points whose half-value
/// is already reached by the first sample have no doubling time.
pub fn doubling_time(points: &[Point]) -> Vec<Point> {
    points
        .iter()
        .map(|p| {
            let days = p.valid_y().filter(|y| *y > 0.0).and_then(|y| {
                crate::series::align::last_date_below_threshold(points, y / 2.0)
                    .map(|last| (p.date - last).num_days() as f64)
            });
            p.with_y(days)
        })
        .collect()
}

/// Remove points that cannot be drawn: `y` missing, not finite, or `<= 0`,
/// or `x` missing.
pub fn drop_invalid(points: &[Point]) -> Vec<Point> {
    points
        .iter()
        .filter(|p| p.x.is_some() && p.valid_y().is_some_and(|y| y > 0.0))
        .copied()
        .collect()
}
