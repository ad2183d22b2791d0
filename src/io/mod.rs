//! Input/output helpers.
//!
//! - CSV ingest helpers shared by the source readers (`ingest`)
//! - curve and view-model exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
