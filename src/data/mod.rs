//! Data sources.
//!
//! - upstream CSV formats (`jh`, `owid`) and population (`countries`)
//! - the `RowLoader` seam and its file-backed implementation (`loader`)
//! - a seeded synthetic loader for offline use (`sample`)
//! - the session cache in front of a loader (`store`)

pub mod countries;
pub mod jh;
pub mod loader;
pub mod owid;
pub mod sample;
pub mod store;

pub use countries::{CountryTable, WORLD, canonical_country_name};
pub use loader::{FileLoader, RowLoader};
pub use sample::SampleLoader;
pub use store::DatasetStore;
