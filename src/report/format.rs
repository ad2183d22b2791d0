//! Formatted terminal output.
//!
//! Formatting lives in one place so the pipeline and view code stay free of
//! presentation details, and output changes stay local.

use crate::data::CountryTable;
use crate::domain::{ChartConfig, DatasetId, XCoord};
use crate::report::CurveSummary;
use crate::view::ViewModel;

/// Header block: what was plotted, from where, on which axes.
pub fn format_run_summary(view: &ViewModel, config: &ChartConfig, source: &str) -> String {
    let mut out = String::new();

    out.push_str("=== covplot - COVID-19 curves ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!("Dataset: {} ({})\n", view.dataset, view.dataset.describe()));
    out.push_str(&format!("Plot: {} (config v{})\n", view.kind().as_str(), config.version));
    out.push_str(&format!("Countries: {}\n", config.countries.join(", ")));
    out.push_str(&format!("X: {} [{:?}]\n", view.x_axis.label, view.x_axis.scale));
    out.push_str(&format!("Y: {} [{:?}]\n", view.y_axis.label, view.y_axis.scale));
    out.push_str(&format!(
        "Curves: {} drawn, {} points\n",
        view.drawable().count(),
        view.point_count()
    ));
    out.push('\n');

    out
}

/// Per-curve table.
pub fn format_curve_table(rows: &[CurveSummary]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:>6} {:>10} {:>10} {:>12} {:>12} {:>12}\n",
            "country", "points", "first", "last", "last_x", "last_y", "max_y"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<24} {:-<6} {:-<10} {:-<10} {:-<12} {:-<12} {:-<12}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<24} {:>6} {:>10} {:>10} {:>12} {:>12} {:>12}\n",
                truncate(&r.country, 24),
                r.points,
                r.first_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                r.last_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                r.last_x.map(fmt_x).unwrap_or_else(|| "-".into()),
                fmt_opt(r.last_y),
                fmt_opt(r.max_y),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// One line per diagnostic, or nothing.
pub fn format_diagnostics(view: &ViewModel) -> String {
    if view.diagnostics.is_empty() {
        return String::new();
    }
    let mut out = String::from("\nWarnings:\n");
    for d in &view.diagnostics {
        out.push_str(&format!("- {d}\n"));
    }
    out
}

/// Country listing for the `countries` command.
pub fn format_country_list(dataset: DatasetId, countries: &[String], table: Option<&CountryTable>) -> String {
    let mut out = format!("Countries in {dataset} ({}):\n", countries.len());
    for c in countries {
        let population = table
            .and_then(|t| t.population(c))
            .map(group_thousands)
            .unwrap_or_else(|| "-".into());
        out.push_str(format!("{:<40} {:>15}\n", truncate(c, 40), population).trim_end());
        out.push('\n');
    }
    out
}

/// Dataset listing for the `datasets` command.
pub fn format_dataset_list(current: DatasetId) -> String {
    let mut out = String::new();
    for id in DatasetId::ALL {
        let chosen = if id == current { "*" } else { " " };
        out.push_str(&format!("{chosen} {:<18} {}\n", id.as_str(), id.describe()));
    }
    out
}

fn fmt_x(x: XCoord) -> String {
    match x {
        XCoord::Value(v) => format!("{v:.2}"),
        other => other.to_string(),
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::CountryInfo;
    use crate::report::summarize;
    use crate::view::{Axis, Curve, CurvePoint, Diagnostic, DiagnosticKind, ScaleKind};

    fn point(day: u32, y: f64) -> CurvePoint {
        let date = NaiveDate::from_ymd_opt(2020, 3, day).unwrap();
        CurvePoint {
            date,
            value: Some(y),
            x: XCoord::Date(date),
            y,
        }
    }

    fn view() -> ViewModel {
        let axis = |scale| Axis {
            scale,
            label: "label".into(),
        };
        ViewModel {
            version: 3,
            plot: ChartConfig::default().active(),
            dataset: DatasetId::JhDeaths,
            x_axis: axis(ScaleKind::Time),
            y_axis: axis(ScaleKind::Log),
            curves: vec![
                Curve {
                    country: "Italy".into(),
                    index: 0,
                    points: vec![point(1, 2.0), point(2, 7.5)],
                },
                Curve {
                    country: "Germany".into(),
                    index: 1,
                    points: vec![point(1, 12.0), point(2, 9.0)],
                },
            ],
            diagnostics: vec![Diagnostic::new(
                DiagnosticKind::UnknownCountry,
                Some("Narnia"),
                "Did not find country 'Narnia' in dataset 'jh_Deaths'",
            )],
        }
    }

    #[test]
    fn ranking_orders_by_final_value() {
        let rows = summarize(&view(), true);
        assert_eq!(rows[0].country, "Germany");
        assert_eq!(rows[0].max_y, Some(12.0));
        let rows = summarize(&view(), false);
        assert_eq!(rows[0].country, "Italy");
        assert_eq!(rows[0].last_date, NaiveDate::from_ymd_opt(2020, 3, 2));
    }

    #[test]
    fn curve_table_rows() {
        let txt = format_curve_table(&summarize(&view(), false));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("country"));
        assert!(lines[2].starts_with("Italy"));
        assert!(lines[2].ends_with("2020-03-02         7.50         7.50"));
    }

    #[test]
    fn diagnostics_are_listed() {
        let txt = format_diagnostics(&view());
        assert!(txt.contains("- Did not find country 'Narnia'"));
    }

    #[test]
    fn country_list_shows_population() {
        let table = CountryTable::from_infos([CountryInfo {
            country: "Italy".into(),
            code: "ITA".into(),
            population: 60421760,
        }]);
        let txt = format_country_list(
            DatasetId::JhDeaths,
            &["Italy".to_string(), "World".to_string()],
            Some(&table),
        );
        assert!(txt.starts_with("Countries in jh_Deaths (2):\n"));
        assert!(txt.contains("60,421,760"));
        assert!(txt.lines().any(|l| l.starts_with("World") && l.ends_with('-')));
    }

    #[test]
    fn dataset_list_marks_current() {
        let txt = format_dataset_list(DatasetId::OwidTotalDeaths);
        assert_eq!(txt.lines().count(), DatasetId::ALL.len());
        assert!(txt.contains("* owid_total_deaths  Confirmed Deaths"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1392730000), "1,392,730,000");
    }
}
