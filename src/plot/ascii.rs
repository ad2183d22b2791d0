//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, deterministic output. Each curve is drawn with
//! its own marker (chosen by the curve's index) and listed in a legend below
//! the grid. Log axes are plotted in log10 space.

use chrono::NaiveDate;

use crate::view::{Axis, Curve, ScaleKind, ViewModel};

/// Markers cycled by curve index.
pub const MARKERS: [char; 8] = ['*', 'o', '+', 'x', '#', '@', '%', '&'];

pub fn marker(index: usize) -> char {
    MARKERS[index % MARKERS.len()]
}

/// Render every drawable curve of `view` into a `width` x `height` grid.
pub fn render_ascii_chart(view: &ViewModel, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let curves: Vec<Vec<(f64, f64)>> = view
        .drawable()
        .map(|c| project(c, &view.x_axis, &view.y_axis))
        .collect();

    let Some((x_min, x_max)) = range(curves.iter().flatten().map(|&(x, _)| x)) else {
        return "Plot: no drawable points\n".to_string();
    };
    let (y_min, y_max) = range(curves.iter().flatten().map(|&(_, y)| y)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for (curve, points) in view.drawable().zip(&curves) {
        draw_curve(&mut grid, points, marker(curve.index), (x_min, x_max), (y_min, y_max));
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{}, {}] | y=[{}, {}]{}\n",
        axis_value(&view.x_axis, x_min),
        axis_value(&view.x_axis, x_max),
        axis_value(&view.y_axis, y_min),
        axis_value(&view.y_axis, y_max),
        if view.y_axis.scale == ScaleKind::Log { " log" } else { "" },
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for curve in view.drawable() {
        out.push_str(&format!("  {} {}\n", marker(curve.index), curve.country));
    }
    out
}

fn project(curve: &Curve, x_axis: &Axis, y_axis: &Axis) -> Vec<(f64, f64)> {
    curve
        .points
        .iter()
        .filter_map(|p| {
            let x = to_plot_space(x_axis.scale, p.x.position())?;
            let y = to_plot_space(y_axis.scale, p.y)?;
            Some((x, y))
        })
        .collect()
}

fn to_plot_space(scale: ScaleKind, v: f64) -> Option<f64> {
    match scale {
        ScaleKind::Log if v > 0.0 => Some(v.log10()),
        ScaleKind::Log => None,
        ScaleKind::Time | ScaleKind::Linear => v.is_finite().then_some(v),
    }
}

/// Axis bound in data units, for the header line.
fn axis_value(axis: &Axis, v: f64) -> String {
    match axis.scale {
        ScaleKind::Time => NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("{v:.0}")),
        ScaleKind::Log => format!("{:.2}", 10f64.powf(v)),
        ScaleKind::Linear => format!("{v:.2}"),
    }
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !(min.is_finite() && max.is_finite()) {
        None
    } else if max > min {
        Some((min, max))
    } else {
        // Single value: widen so it maps to the middle of the grid.
        Some((min - 0.5, max + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top (maximum).
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], points: &[(f64, f64)], ch: char, xr: (f64, f64), yr: (f64, f64)) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in points {
        let col = map_x(x, xr.0, xr.1, width);
        let row = map_y(y, yr.0, yr.1, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None if grid[row][col] == ' ' => grid[row][col] = ch,
            None => {}
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham). Only blank cells are written, so
/// earlier curves stay on top.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
