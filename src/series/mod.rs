//! Time-series core: joining observations and transforming per-country curves.
//!
//! - `join`: flat observations -> nested lookup table
//! - `stages`: pure `&[Point] -> Vec<Point>` transforms
//! - `align`: threshold and window alignment of the x-axis
//! - `pipeline`: the ordered stage list for each plot kind

pub mod align;
pub mod join;
pub mod pipeline;
pub mod stages;

pub use align::{Alignment, ResolvedAlignment, first_date_above_threshold};
pub use join::{DuplicateObservation, JoinOutput, JoinedTable, join};
pub use pipeline::{Pipeline, Stage};
