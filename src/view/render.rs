//! `render(&ChartConfig, &DatasetStore) -> ViewModel`.
//!
//! Pure with respect to its inputs: the store must already hold the dataset
//! (see `DatasetStore::prepare`). Countries are prepared in parallel.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::data::DatasetStore;
use crate::domain::{AlignMode, ChartConfig, DatasetId, Plot, Point, XCoord, alignment_threshold};
use crate::series::Pipeline;
use crate::view::model::{Axis, Curve, CurvePoint, Diagnostic, DiagnosticKind, ScaleKind, ViewModel};

/// Smallest value shown on a log axis.
pub const LOG_DISPLAY_FLOOR: f64 = 1.0;

const PER_CAPITA_SUFFIX: &str = " (per 100,000 inhabitants)";

pub fn render(config: &ChartConfig, store: &DatasetStore) -> ViewModel {
    let plot = config.active();
    let dataset = config.dataset;
    let (x_axis, y_axis) = axes(&plot, dataset);
    let mut view = ViewModel {
        version: config.version,
        plot,
        dataset,
        x_axis,
        y_axis,
        curves: Vec::new(),
        diagnostics: Vec::new(),
    };

    if !store.is_available(dataset) {
        let reason = store.unavailable_reason(dataset).unwrap_or("not loaded");
        let diag = Diagnostic::new(
            DiagnosticKind::DatasetUnavailable,
            None,
            format!("Dataset '{dataset}' is unavailable: {reason}"),
        );
        warn!("{diag}");
        view.diagnostics.push(diag);
        return view;
    }

    view.diagnostics.extend(source_diagnostics(&plot, dataset, store));

    let results: Vec<(Option<Curve>, Option<Diagnostic>)> = config
        .countries
        .par_iter()
        .enumerate()
        .map(|(index, country)| prepare_curve(&plot, dataset, store, index, country))
        .collect();

    for (curve, diag) in results {
        if let Some(diag) = diag {
            warn!(kind = ?diag.kind, "{diag}");
            view.diagnostics.push(diag);
        }
        view.curves.extend(curve);
    }
    debug!(
        version = view.version,
        curves = view.curves.len(),
        points = view.point_count(),
        "view rendered"
    );
    view
}

/// Dataset-wide problems: a failed population load and duplicate rows.
fn source_diagnostics(plot: &Plot, dataset: DatasetId, store: &DatasetStore) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    if let (true, Some(reason)) = (plot.normalize(), store.countries_error()) {
        out.push(Diagnostic::new(
            DiagnosticKind::PopulationUnavailable,
            None,
            format!("Population data unavailable: {reason}"),
        ));
    }
    let duplicates = store.duplicates().iter().filter(|d| d.source == dataset).count();
    if duplicates > 0 {
        out.push(Diagnostic::new(
            DiagnosticKind::DuplicateObservations,
            None,
            format!("{duplicates} duplicate observations in dataset '{dataset}'; later values kept"),
        ));
    }
    out
}

fn prepare_curve(
    plot: &Plot,
    dataset: DatasetId,
    store: &DatasetStore,
    index: usize,
    country: &str,
) -> (Option<Curve>, Option<Diagnostic>) {
    if !store.has_country(dataset, country) {
        let diag = Diagnostic::new(
            DiagnosticKind::UnknownCountry,
            Some(country),
            format!("Did not find country '{country}' in dataset '{dataset}'"),
        );
        return (None, Some(diag));
    }

    let population = store.population(country);
    if plot.normalize() && population.is_none() {
        let diag = Diagnostic::new(
            DiagnosticKind::MissingPopulation,
            Some(country),
            format!("No population data for '{country}'; cannot normalize"),
        );
        return (None, Some(diag));
    }

    let points = Pipeline::for_plot(plot, population).run(&store.series(dataset, country).points());
    let curve = Curve {
        country: country.to_string(),
        index,
        points: display(plot, &points),
    };
    let diag = curve.points.is_empty().then(|| {
        Diagnostic::new(
            DiagnosticKind::EmptyCurve,
            Some(country),
            format!("No drawable points for '{country}'"),
        )
    });
    (Some(curve), diag)
}

/// Convert pipeline output to display points, clamping log axes to the floor.
pub fn display(plot: &Plot, points: &[Point]) -> Vec<CurvePoint> {
    let log_y = plot.logplot();
    let log_x = matches!(plot, Plot::Trajectory(p) if p.logplot);
    points
        .iter()
        .filter_map(|p| {
            let x = p.x?;
            let y = p.y?;
            let x = match x {
                XCoord::Value(v) if log_x => XCoord::Value(v.max(LOG_DISPLAY_FLOOR)),
                other => other,
            };
            let y = if log_y { y.max(LOG_DISPLAY_FLOOR) } else { y };
            Some(CurvePoint {
                date: p.date,
                value: p.value,
                x,
                y,
            })
        })
        .collect()
}

/// Axis scales and labels for the active plot.
pub fn axes(plot: &Plot, dataset: DatasetId) -> (Axis, Axis) {
    let per_capita = if plot.normalize() { PER_CAPITA_SUFFIX } else { "" };
    let y_scale = if plot.logplot() { ScaleKind::Log } else { ScaleKind::Linear };

    let date_axis = || Axis {
        scale: ScaleKind::Time,
        label: "Date".to_string(),
    };
    let aligned_axis = |align: AlignMode| match align {
        AlignMode::FirstAboveThreshold => Axis {
            scale: ScaleKind::Linear,
            label: format!(
                "Days since reaching {}{}",
                alignment_threshold(plot.normalize()),
                per_capita
            ),
        },
        AlignMode::Full | AlignMode::LastNDays(_) => date_axis(),
    };

    let x_axis = match plot {
        Plot::Calendar(p) => aligned_axis(p.align),
        Plot::Reproduction(p) => aligned_axis(p.align),
        Plot::Doubling(_) => date_axis(),
        Plot::Trajectory(p) => Axis {
            scale: if p.logplot { ScaleKind::Log } else { ScaleKind::Linear },
            label: format!("Total {}{}", dataset.describe(), per_capita),
        },
    };

    (
        x_axis,
        Axis {
            scale: y_scale,
            label: y_label(plot, dataset),
        },
    )
}

/// `"Calendar plot for Confirmed Deaths per day (per 100,000 inhabitants) [dataset jh_Deaths] [log-plot]"`.
pub fn y_label(plot: &Plot, dataset: DatasetId) -> String {
    let kind = plot.kind().as_str();
    let mut label = String::new();
    let mut chars = kind.chars();
    if let Some(first) = chars.next() {
        label.extend(first.to_uppercase());
        label.push_str(chars.as_str());
    }
    label.push_str(" plot for ");
    label.push_str(dataset.describe());
    if matches!(plot, Plot::Calendar(p) if !p.cumulative) {
        label.push_str(" per day");
    }
    if plot.normalize() {
        label.push_str(PER_CAPITA_SUFFIX);
    }
    label.push_str(&format!(" [dataset {dataset}]"));
    if plot.logplot() {
        label.push_str(" [log-plot]");
    }
    let smooth = match plot {
        Plot::Calendar(p) => p.smooth,
        Plot::Trajectory(p) => p.smooth,
        Plot::Doubling(p) => p.smooth,
        Plot::Reproduction(p) => p.smooth,
    };
    if smooth.is_some() {
        label.push_str(" [smooth]");
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    use crate::data::countries::CountryTable;
    use crate::data::loader::RowLoader;
    use crate::domain::{
        CalendarParams, CountryInfo, DoublingParams, Observation, Patch, PlotKind, TrajectoryParams,
    };
    use crate::error::AppError;

    struct Fixture;

    const DEATHS: [f64; 6] = [0.0, 50.0, 120.0, 250.0, 400.0, 800.0];

    impl RowLoader for Fixture {
        fn load_rows(&self, dataset: DatasetId) -> Result<Vec<Observation>, AppError> {
            let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
            let mut rows = Vec::new();
            for (country, scale) in [("Italy", 1.0), ("Atlantis", 2.0)] {
                for (i, v) in DEATHS.iter().enumerate() {
                    rows.push(Observation {
                        country: country.to_string(),
                        date: start + Duration::days(i as i64),
                        value: Some(v * scale),
                        source: dataset,
                    });
                }
            }
            Ok(rows)
        }

        fn load_countries(&self) -> Result<CountryTable, AppError> {
            Ok(CountryTable::from_infos([CountryInfo {
                country: "Italy".into(),
                code: "ITA".into(),
                population: 100_000,
            }]))
        }

        fn describe(&self) -> String {
            "fixture".into()
        }
    }

    fn prepared(config: &ChartConfig) -> DatasetStore {
        let mut store = DatasetStore::new(Box::new(Fixture));
        assert!(store.prepare(config));
        store
    }

    fn config(countries: &[&str]) -> ChartConfig {
        ChartConfig::default()
            .apply(Patch::SetDataset(DatasetId::JhDeaths))
            .apply(Patch::SetCountries(countries.iter().map(|c| c.to_string()).collect()))
    }

    #[test]
    fn unknown_and_unpopulated_countries_become_diagnostics() {
        let config = config(&["Italy", "Narnia", "Atlantis"]);
        let view = render(&config, &prepared(&config));
        assert_eq!(view.version, config.version);
        assert_eq!(view.curves.len(), 1);
        assert_eq!(view.curves[0].country, "Italy");
        assert_eq!(view.curves[0].index, 0);
        let kinds: Vec<DiagnosticKind> = view.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::UnknownCountry, DiagnosticKind::MissingPopulation]);
    }

    struct Broken;

    impl RowLoader for Broken {
        fn load_rows(&self, dataset: DatasetId) -> Result<Vec<Observation>, AppError> {
            let date = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
            let row = |value| Observation {
                country: "Italy".into(),
                date,
                value: Some(value),
                source: dataset,
            };
            Ok(vec![row(5.0), row(7.0), row(9.0)])
        }

        fn load_countries(&self) -> Result<CountryTable, AppError> {
            Err(AppError::data_source("Data file not found: 'population.csv'"))
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn population_failure_and_duplicates_are_reported_once() {
        let config = config(&["Italy"]);
        let mut store = DatasetStore::new(Box::new(Broken));
        assert!(store.prepare(&config));
        let view = render(&config, &store);

        let kinds: Vec<DiagnosticKind> = view.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::PopulationUnavailable,
                DiagnosticKind::DuplicateObservations,
                DiagnosticKind::MissingPopulation,
            ]
        );
        assert!(view.diagnostics[0].message.contains("population.csv"));
        assert!(view.diagnostics[1].message.starts_with("2 duplicate observations"));

        let raw = config.apply(Patch::SetPlot(PlotKind::Doubling));
        let kinds: Vec<DiagnosticKind> = render(&raw, &store).diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::DuplicateObservations, DiagnosticKind::EmptyCurve]);
    }

    #[test]
    fn unnormalized_plots_do_not_need_population() {
        let config = config(&["Atlantis"]).apply(Patch::SetPlot(PlotKind::Doubling));
        let view = render(&config, &prepared(&config));
        assert!(view.diagnostics.is_empty());
        assert_eq!(view.curves[0].index, 0);
    }

    #[test]
    fn unavailable_dataset_renders_empty_view() {
        let config = config(&["Italy"]);
        let store = DatasetStore::new(Box::new(Fixture));
        let view = render(&config, &store);
        assert!(view.curves.is_empty());
        assert_eq!(view.diagnostics[0].kind, DiagnosticKind::DatasetUnavailable);
    }

    #[test]
    fn calendar_points_are_positive_and_dated() {
        let config = config(&["Italy"]);
        let view = render(&config, &prepared(&config));
        let curve = &view.curves[0];
        // The zero on day one is dropped; population 100,000 keeps values unchanged.
        assert_eq!(curve.points.len(), 5);
        assert!(curve.points.iter().all(|p| p.y > 0.0));
        assert!(matches!(curve.points[0].x, XCoord::Date(_)));
        assert_eq!(curve.points[0].y, 50.0);
        assert_eq!(view.y_axis.scale, ScaleKind::Log);
        assert_eq!(view.x_axis.scale, ScaleKind::Time);
    }

    #[test]
    fn display_clamps_log_axes_only() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let pts = [Point::new(date, Some(1.0))
            .with_x(Some(XCoord::Value(0.5)))
            .with_y(Some(0.2))];

        let log = Plot::Trajectory(TrajectoryParams::default());
        let shown = display(&log, &pts);
        assert_eq!(shown[0].y, 1.0);
        assert_eq!(shown[0].x, XCoord::Value(1.0));

        let linear = Plot::Trajectory(TrajectoryParams {
            logplot: false,
            ..TrajectoryParams::default()
        });
        let shown = display(&linear, &pts);
        assert_eq!(shown[0].y, 0.2);
        assert_eq!(shown[0].x, XCoord::Value(0.5));
    }

    #[test]
    fn labels_describe_the_active_plot() {
        let daily = Plot::Calendar(CalendarParams {
            cumulative: false,
            logplot: false,
            ..CalendarParams::default()
        });
        assert_eq!(
            y_label(&daily, DatasetId::JhDeaths),
            "Calendar plot for Confirmed Deaths per day (per 100,000 inhabitants) [dataset jh_Deaths]"
        );
        let doubling = Plot::Doubling(DoublingParams::default());
        assert_eq!(
            y_label(&doubling, DatasetId::OwidTotalCases),
            "Doubling plot for Confirmed Infections [dataset owid_total_cases] [smooth]"
        );

        let aligned = Plot::Calendar(CalendarParams {
            align: AlignMode::FirstAboveThreshold,
            ..CalendarParams::default()
        });
        let (x, _) = axes(&aligned, DatasetId::JhDeaths);
        assert_eq!(x.scale, ScaleKind::Linear);
        assert_eq!(x.label, "Days since reaching 0.1 (per 100,000 inhabitants)");
    }
}
