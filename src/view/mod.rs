//! View layer: config + data -> renderer-ready view model.
//!
//! - `model`: serializable view-model types
//! - `render`: runs the pipeline per country and applies display rules
//! - `gate`: discards renders superseded by a newer state

pub mod gate;
pub mod model;
pub mod render;

pub use gate::{RenderGate, RenderTicket};
pub use model::*;
pub use render::{LOG_DISPLAY_FLOOR, axes, display, render, y_label};
