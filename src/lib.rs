//! `covid-curves` library crate.
//!
//! The binary (`covplot`) is a thin wrapper around this library so that:
//!
//! - the transform pipeline is testable without spawning processes
//! - loaders, the view model, and exports are reusable by other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod series;
pub mod view;
