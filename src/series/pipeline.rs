//! Typed, ordered composition of transform stages.
//!
//! A `Pipeline` can only be built from a `Plot`, which fixes the stage order:
//!
//! `to_y -> normalize -> (resolve alignment anchor) -> trajectory_x ->
//!  cumulative_to_delta -> smooth -> reproduction_ratio -> align -> drop_invalid`
//!
//! Doubling-time plots smooth the cumulative series and then replace `y` with
//! the doubling time; they skip the delta stage.

use crate::domain::{Plot, Point, alignment_threshold};
use crate::series::align::{Alignment, ResolvedAlignment, align};
use crate::series::stages;

/// One transform step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Normalize { population: Option<u64> },
    TrajectoryX,
    CumulativeToDelta,
    Smooth { window: usize },
    ReproductionRatio { window: usize },
    DoublingTime,
}

impl Stage {
    pub fn apply(self, points: &[Point]) -> Vec<Point> {
        match self {
            Stage::Normalize { population } => stages::normalize(points, population),
            Stage::TrajectoryX => stages::trajectory_x(points),
            Stage::CumulativeToDelta => stages::cumulative_to_delta(points),
            Stage::Smooth { window } => stages::smooth(points, window),
            Stage::ReproductionRatio { window } => stages::reproduction_ratio(points, window),
            Stage::DoublingTime => stages::doubling_time(points),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Normalize { .. } => "normalize",
            Stage::TrajectoryX => "trajectory_x",
            Stage::CumulativeToDelta => "cumulative_to_delta",
            Stage::Smooth { .. } => "smooth",
            Stage::ReproductionRatio { .. } => "reproduction_ratio",
            Stage::DoublingTime => "doubling_time",
        }
    }
}

/// Stages for one plot, split around the point where the alignment anchor is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    /// Stages that run on the cumulative series, before the anchor is fixed.
    before_anchor: Vec<Stage>,
    /// Stages that run after the anchor is fixed.
    after_anchor: Vec<Stage>,
    alignment: Alignment,
}

impl Pipeline {
    /// Build the canonical pipeline for `plot`.
    ///
    /// `population` is only consulted when the plot normalizes.
    pub fn for_plot(plot: &Plot, population: Option<u64>) -> Pipeline {
        let mut before_anchor = Vec::new();
        let mut after_anchor = Vec::new();

        if plot.normalize() {
            before_anchor.push(Stage::Normalize { population });
        }
        let threshold = alignment_threshold(plot.normalize());

        let alignment = match plot {
            Plot::Calendar(p) => {
                if !p.cumulative {
                    after_anchor.push(Stage::CumulativeToDelta);
                }
                if let Some(w) = p.smooth {
                    after_anchor.push(Stage::Smooth { window: w.len() });
                }
                to_alignment(p.align, threshold)
            }
            Plot::Trajectory(p) => {
                after_anchor.push(Stage::TrajectoryX);
                after_anchor.push(Stage::CumulativeToDelta);
                if let Some(w) = p.smooth {
                    after_anchor.push(Stage::Smooth { window: w.len() });
                }
                Alignment::Full
            }
            Plot::Doubling(p) => {
                if let Some(w) = p.smooth {
                    after_anchor.push(Stage::Smooth { window: w.len() });
                }
                after_anchor.push(Stage::DoublingTime);
                Alignment::Full
            }
            Plot::Reproduction(p) => {
                after_anchor.push(Stage::CumulativeToDelta);
                if let Some(w) = p.smooth {
                    after_anchor.push(Stage::Smooth { window: w.len() });
                }
                after_anchor.push(Stage::ReproductionRatio {
                    window: p.window.len(),
                });
                to_alignment(p.align, threshold)
            }
        };

        Pipeline {
            before_anchor,
            after_anchor,
            alignment,
        }
    }

    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.before_anchor.iter().chain(self.after_anchor.iter()).copied()
    }

    /// Run every stage on `points` (seeded from a date-sorted series) and
    /// return only drawable points.
    pub fn run(&self, points: &[Point]) -> Vec<Point> {
        let mut current = stages::to_y(points);
        for stage in &self.before_anchor {
            current = stage.apply(&current);
        }

        let anchor = self.alignment.resolve(&current);
        if anchor == ResolvedAlignment::Unreached {
            return Vec::new();
        }

        for stage in &self.after_anchor {
            current = stage.apply(&current);
        }

        // Trajectory plots set x themselves; everything else is aligned here.
        let aligned = if self.after_anchor.contains(&Stage::TrajectoryX) {
            current
        } else {
            align(&current, self.alignment, anchor)
        };
        stages::drop_invalid(&aligned)
    }
}

fn to_alignment(mode: crate::domain::AlignMode, threshold: f64) -> Alignment {
    match mode {
        crate::domain::AlignMode::Full => Alignment::Full,
        crate::domain::AlignMode::LastNDays(n) => Alignment::LastNDays(n),
        crate::domain::AlignMode::FirstAboveThreshold => Alignment::FirstAboveThreshold(threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    use crate::domain::{
        AlignMode, CalendarParams, DoublingParams, RatioWindow, ReproductionParams, SmoothWindow,
        TrajectoryParams, XCoord,
    };

    fn seed(values: &[f64]) -> Vec<Point> {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Point::new(start + Duration::days(i as i64), Some(*v)))
            .collect()
    }

    fn calendar(normalize: bool, cumulative: bool) -> Plot {
        Plot::Calendar(CalendarParams {
            normalize,
            cumulative,
            logplot: false,
            smooth: None,
            align: AlignMode::Full,
        })
    }

    fn ys(points: &[Point]) -> Vec<f64> {
        points.iter().filter_map(|p| p.y).collect()
    }

    #[test]
    fn calendar_daily_curve_is_delta_of_cumulative() {
        let out = Pipeline::for_plot(&calendar(false, false), None).run(&seed(&[10.0, 20.0, 40.0]));
        assert_eq!(ys(&out), vec![10.0, 10.0, 20.0]);
    }

    #[test]
    fn normalize_runs_before_delta() {
        let pipeline = Pipeline::for_plot(&calendar(true, false), Some(200_000));
        let names: Vec<&str> = pipeline.stages().map(Stage::name).collect();
        assert_eq!(names, vec!["normalize", "cumulative_to_delta"]);

        let out = pipeline.run(&seed(&[10.0, 20.0, 40.0]));
        assert_eq!(ys(&out), vec![5.0, 5.0, 10.0]);
    }

    #[test]
    fn missing_population_drops_normalized_curve() {
        let out = Pipeline::for_plot(&calendar(true, true), None).run(&seed(&[10.0, 20.0]));
        assert!(out.is_empty());
    }

    #[test]
    fn threshold_anchor_uses_cumulative_values() {
        // Daily values never reach 100, but the cumulative total does on day 2.
        let plot = Plot::Calendar(CalendarParams {
            normalize: false,
            cumulative: false,
            logplot: false,
            smooth: None,
            align: AlignMode::FirstAboveThreshold,
        });
        let out = Pipeline::for_plot(&plot, None).run(&seed(&[40.0, 80.0, 120.0, 150.0]));
        let xs: Vec<XCoord> = out.iter().filter_map(|p| p.x).collect();
        assert_eq!(xs, vec![XCoord::Days(0), XCoord::Days(1)]);
        assert_eq!(ys(&out), vec![40.0, 30.0]);
    }

    #[test]
    fn trajectory_plots_new_against_total() {
        let plot = Plot::Trajectory(TrajectoryParams {
            normalize: false,
            logplot: true,
            smooth: None,
        });
        let out = Pipeline::for_plot(&plot, None).run(&seed(&[10.0, 30.0, 60.0]));
        let xs: Vec<XCoord> = out.iter().filter_map(|p| p.x).collect();
        assert_eq!(xs, vec![XCoord::Value(10.0), XCoord::Value(30.0), XCoord::Value(60.0)]);
        assert_eq!(ys(&out), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn reproduction_of_steady_growth_is_constant() {
        // Daily new cases double every 4 days: 1,1,1,1,2,2,2,2,4,...
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for i in 0..16 {
            total += f64::from(1u32 << (i / 4));
            cumulative.push(total);
        }
        let plot = Plot::Reproduction(ReproductionParams {
            normalize: false,
            smooth: None,
            window: RatioWindow::Four,
            align: AlignMode::Full,
        });
        let out = Pipeline::for_plot(&plot, None).run(&seed(&cumulative));
        assert_eq!(out.len(), 16);
        for p in &out[4..] {
            assert_eq!(p.y, Some(2.0));
        }
    }

    #[test]
    fn doubling_plot_smooths_then_measures() {
        let plot = Plot::Doubling(DoublingParams { smooth: None });
        let out = Pipeline::for_plot(&plot, None).run(&seed(&[1.0, 2.0, 4.0, 8.0]));
        // The first two points reach their half-value on the first day.
        assert_eq!(ys(&out), vec![2.0, 2.0]);

        let smoothed = Pipeline::for_plot(
            &Plot::Doubling(DoublingParams {
                smooth: Some(SmoothWindow::Three),
            }),
            None,
        );
        let names: Vec<&str> = smoothed.stages().map(Stage::name).collect();
        assert_eq!(names, vec!["smooth", "doubling_time"]);
    }

    fn every_plot() -> Vec<Plot> {
        let smooths = [None, Some(SmoothWindow::Three), Some(SmoothWindow::Seven)];
        let aligns = [
            AlignMode::Full,
            AlignMode::LastNDays(5),
            AlignMode::LastNDays(u32::MAX),
            AlignMode::FirstAboveThreshold,
        ];
        let mut plots = Vec::new();
        for smooth in smooths {
            plots.push(Plot::Doubling(DoublingParams { smooth }));
            for normalize in [false, true] {
                for logplot in [false, true] {
                    plots.push(Plot::Trajectory(TrajectoryParams {
                        normalize,
                        logplot,
                        smooth,
                    }));
                }
                for align in aligns {
                    for cumulative in [false, true] {
                        plots.push(Plot::Calendar(CalendarParams {
                            normalize,
                            cumulative,
                            logplot: cumulative,
                            smooth,
                            align,
                        }));
                    }
                    for window in [RatioWindow::Four, RatioWindow::Seven] {
                        plots.push(Plot::Reproduction(ReproductionParams {
                            normalize,
                            smooth,
                            window,
                            align,
                        }));
                    }
                }
            }
        }
        plots
    }

    #[test]
    fn nonpositive_points_are_dropped_for_every_toggle_combination() {
        // Zeros, a dip in the cumulative total and a reset back to zero.
        let raw = seed(&[0.0, 5.0, 5.0, 3.0, 9.0, 9.0, 20.0, 0.0, 25.0, 25.0, 40.0, 38.0]);
        let plots = every_plot();
        assert_eq!(plots.len(), 3 + 3 * 2 * (2 + 4 * (2 + 2)));
        for plot in plots {
            for population in [Some(1_000), Some(100_000)] {
                let out = Pipeline::for_plot(&plot, population).run(&raw);
                assert!(
                    out.iter().all(|p| p.y.is_some_and(|y| y > 0.0) && p.x.is_some()),
                    "{plot:?} with population {population:?} kept {out:?}"
                );
            }
        }
    }

    #[test]
    fn last_days_longer_than_the_calendar_keep_the_series() {
        let plot = Plot::Calendar(CalendarParams {
            normalize: false,
            cumulative: true,
            logplot: true,
            smooth: None,
            align: AlignMode::LastNDays(100_000_000),
        });
        let out = Pipeline::for_plot(&plot, None).run(&seed(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(ys(&out), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(out.iter().all(|p| matches!(p.x, Some(XCoord::Date(_)))));
    }
}
