//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loaded records (`Observation`, `CountryInfo`) and dataset identifiers
//! - ordered series and pipeline points (`Series`, `Point`, `XCoord`)
//! - chart configuration (`ChartConfig`, `Plot`, `Patch`)

pub mod chart;
pub mod types;

pub use chart::*;
pub use types::*;
