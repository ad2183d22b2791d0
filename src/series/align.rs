//! Alignment: re-basing the x-axis of a curve.

use chrono::{Days, NaiveDate};

use crate::domain::{Point, XCoord};

/// Alignment with its threshold resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alignment {
    /// `x = date`.
    Full,
    /// `x = date` for the last `n` days of the series, others dropped.
    LastNDays(u32),
    /// `x = days since the first date with y >= threshold`, earlier points dropped.
    FirstAboveThreshold(f64),
}

/// Alignment with its anchor fixed against a specific series.
///
/// The anchor is resolved on the cumulative series, before any delta or
/// smoothing stage runs, and then applied at the end of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAlignment {
    Full,
    Since(NaiveDate),
    /// Threshold never reached: the curve is empty by definition.
    Unreached,
}

impl Alignment {
    pub fn resolve(self, points: &[Point]) -> ResolvedAlignment {
        match self {
            Alignment::Full => ResolvedAlignment::Full,
            Alignment::LastNDays(n) => match points.last() {
                // Day N-1 before the last date is the oldest one kept; a window
                // reaching past the calendar keeps the whole series.
                Some(last) => last
                    .date
                    .checked_sub_days(Days::new(u64::from(n).saturating_sub(1)))
                    .map_or(ResolvedAlignment::Full, ResolvedAlignment::Since),
                None => ResolvedAlignment::Unreached,
            },
            Alignment::FirstAboveThreshold(t) => match first_date_above_threshold(points, t) {
                Some(anchor) => ResolvedAlignment::Since(anchor),
                None => ResolvedAlignment::Unreached,
            },
        }
    }
}

/// First date whose `y` is at least `threshold`.
pub fn first_date_above_threshold(points: &[Point], threshold: f64) -> Option<NaiveDate> {
    points
        .iter()
        .find(|p| p.valid_y().is_some_and(|y| y >= threshold))
        .map(|p| p.date)
}

/// Date of the point immediately before the first point with `y >= threshold`.
///
/// `None` if the threshold is never reached or is reached by the first point.
pub fn last_date_below_threshold(points: &[Point], threshold: f64) -> Option<NaiveDate> {
    let idx = points
        .iter()
        .position(|p| p.valid_y().is_some_and(|y| y >= threshold))?;
    idx.checked_sub(1).map(|prev| points[prev].date)
}

/// Set `x` according to the alignment. Points outside the aligned range get `x = None`.
pub fn align(points: &[Point], alignment: Alignment, anchor: ResolvedAlignment) -> Vec<Point> {
    points
        .iter()
        .map(|p| {
            let x = match (alignment, anchor) {
                (_, ResolvedAlignment::Unreached) => None,
                (_, ResolvedAlignment::Full) => Some(XCoord::Date(p.date)),
                (Alignment::LastNDays(_), ResolvedAlignment::Since(start)) => {
                    (p.date >= start).then_some(XCoord::Date(p.date))
                }
                (_, ResolvedAlignment::Since(start)) => {
                    (p.date >= start).then(|| XCoord::Days((p.date - start).num_days()))
                }
            };
            p.with_x(x)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::series::stages::{drop_invalid, to_y};

    fn series(values: &[f64]) -> Vec<Point> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let seeded: Vec<Point> = values
            .iter()
            .enumerate()
            .map(|(i, v)| Point::new(start + Duration::days(i as i64), Some(*v)))
            .collect();
        to_y(&seeded)
    }

    #[test]
    fn first_date_above_threshold_scans_forward() {
        let pts = series(&[10.0, 99.0, 100.0, 50.0, 300.0]);
        assert_eq!(first_date_above_threshold(&pts, 100.0), Some(pts[2].date));
        assert_eq!(first_date_above_threshold(&pts, 1000.0), None);
    }

    #[test]
    fn threshold_alignment_counts_days_and_drops_earlier_points() {
        let pts = series(&[10.0, 120.0, 130.0, 140.0]);
        let alignment = Alignment::FirstAboveThreshold(100.0);
        let out = drop_invalid(&align(&pts, alignment, alignment.resolve(&pts)));
        let xs: Vec<Option<XCoord>> = out.iter().map(|p| p.x).collect();
        assert_eq!(
            xs,
            vec![Some(XCoord::Days(0)), Some(XCoord::Days(1)), Some(XCoord::Days(2))]
        );
    }

    #[test]
    fn unreached_threshold_gives_empty_curve() {
        let pts = series(&[1.0, 2.0, 3.0]);
        let alignment = Alignment::FirstAboveThreshold(100.0);
        assert_eq!(alignment.resolve(&pts), ResolvedAlignment::Unreached);
        assert!(drop_invalid(&align(&pts, alignment, alignment.resolve(&pts))).is_empty());
    }

    #[test]
    fn last_n_days_keeps_calendar_dates() {
        let pts = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let alignment = Alignment::LastNDays(2);
        let out = drop_invalid(&align(&pts, alignment, alignment.resolve(&pts)));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].x, Some(XCoord::Date(pts[3].date)));
    }

    #[test]
    fn last_n_days_beyond_the_calendar_keeps_everything() {
        let pts = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let alignment = Alignment::LastNDays(100_000_000);
        assert_eq!(alignment.resolve(&pts), ResolvedAlignment::Full);
        let out = drop_invalid(&align(&pts, alignment, alignment.resolve(&pts)));
        assert_eq!(out.len(), pts.len());
        assert_eq!(out[0].x, Some(XCoord::Date(pts[0].date)));
    }

    #[test]
    fn full_alignment_uses_dates() {
        let pts = series(&[1.0, 2.0]);
        let out = align(&pts, Alignment::Full, Alignment::Full.resolve(&pts));
        assert_eq!(out[1].x, Some(XCoord::Date(pts[1].date)));
    }

    #[test]
    fn last_date_below_threshold_needs_a_predecessor() {
        let pts = series(&[1.0, 2.0, 4.0]);
        assert_eq!(last_date_below_threshold(&pts, 3.0), Some(pts[1].date));
        assert_eq!(last_date_below_threshold(&pts, 0.5), None);
        assert_eq!(last_date_below_threshold(&pts, 10.0), None);
    }
}
