//! Export rendered curves to CSV and the whole view model to JSON.
//!
//! The CSV is one row per drawn point (`country,index,date,x,y`), meant for
//! spreadsheets and downstream scripts. The JSON carries the config it was
//! rendered from so the file is self-describing.

use std::fs::File;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::ChartConfig;
use crate::error::AppError;
use crate::view::ViewModel;

#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    country: &'a str,
    index: usize,
    date: String,
    x: String,
    y: f64,
}

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct ViewExport<'a> {
    pub tool: &'static str,
    pub config: &'a ChartConfig,
    pub view: &'a ViewModel,
}

/// Write every drawn point to a CSV file.
pub fn write_curves_csv(path: &Path, view: &ViewModel) -> Result<usize, AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut rows = 0;
    for curve in &view.curves {
        for p in &curve.points {
            writer
                .serialize(CurveRow {
                    country: &curve.country,
                    index: curve.index,
                    date: p.date.format("%Y-%m-%d").to_string(),
                    x: p.x.to_string(),
                    y: p.y,
                })
                .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
            rows += 1;
        }
    }
    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to flush export CSV: {e}")))?;

    info!(path = %path.display(), rows, "curves exported");
    Ok(rows)
}

/// Write the view model (and its config) as pretty-printed JSON.
pub fn write_view_json(path: &Path, config: &ChartConfig, view: &ViewModel) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export JSON '{}': {e}", path.display())))?;
    let doc = ViewExport {
        tool: "covplot",
        config,
        view,
    };
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::usage(format!("Failed to write export JSON: {e}")))?;

    info!(path = %path.display(), curves = view.curves.len(), "view exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{DatasetId, XCoord};
    use crate::view::{Axis, Curve, CurvePoint, ScaleKind};

    fn view() -> ViewModel {
        let date = NaiveDate::from_ymd_opt(2020, 3, 5).unwrap();
        ViewModel {
            version: 4,
            plot: ChartConfig::default().active(),
            dataset: DatasetId::JhConfirmed,
            x_axis: Axis {
                scale: ScaleKind::Linear,
                label: "Days since reaching 100".into(),
            },
            y_axis: Axis {
                scale: ScaleKind::Log,
                label: "y".into(),
            },
            curves: vec![
                Curve {
                    country: "Korea, South".into(),
                    index: 0,
                    points: vec![
                        CurvePoint {
                            date,
                            value: Some(120.0),
                            x: XCoord::Days(0),
                            y: 120.0,
                        },
                        CurvePoint {
                            date: date.succ_opt().unwrap(),
                            value: Some(150.5),
                            x: XCoord::Days(1),
                            y: 150.5,
                        },
                    ],
                },
                Curve {
                    country: "Italy".into(),
                    index: 1,
                    points: Vec::new(),
                },
            ],
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn csv_has_one_row_per_point() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curves.csv");
        let rows = write_curves_csv(&path, &view()).unwrap();
        assert_eq!(rows, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "country,index,date,x,y");
        assert_eq!(lines[1], "\"Korea, South\",0,2020-03-05,0,120.0");
        assert_eq!(lines[2], "\"Korea, South\",0,2020-03-06,1,150.5");
    }

    #[test]
    fn json_carries_config_and_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.json");
        let config = ChartConfig::default();
        write_view_json(&path, &config, &view()).unwrap();

        let doc: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(doc["tool"], "covplot");
        assert_eq!(doc["config"]["dataset"], "owid_total_deaths");
        assert_eq!(doc["view"]["version"], 4);
        assert_eq!(doc["view"]["y_axis"]["scale"], "log");
        assert_eq!(doc["view"]["curves"][0]["points"][1]["x"]["kind"], "days");
        assert_eq!(doc["view"]["curves"][0]["points"][1]["x"]["value"], 1);
    }

    #[test]
    fn unwritable_path_is_a_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("curves.csv");
        let err = write_curves_csv(&path, &view()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
    }
}
