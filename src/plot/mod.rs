//! Terminal chart rendering.

pub mod ascii;

pub use ascii::{MARKERS, marker, render_ascii_chart};
