//! Logging setup.
//!
//! Events go to stderr so stdout stays clean for tables and charts.
//! `RUST_LOG` wins over the level picked from the command line.

use std::io;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LEVEL: &str = "warn";
pub const VERBOSE_LEVEL: &str = "debug";

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let default_level = if verbose { VERBOSE_LEVEL } else { DEFAULT_LEVEL };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}
