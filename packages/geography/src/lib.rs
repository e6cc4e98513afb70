#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic lookups for the spread pipeline.
//!
//! Provides haversine distance ([`distance`]), the grid catalog with
//! radius filtering ([`grid`]), and the static fuel/terrain feature table
//! keyed by grid ID ([`features`]). Both tables are loaded from CSV.

pub mod distance;
pub mod features;
pub mod grid;

pub use distance::haversine_km;
pub use features::FeatureTable;
pub use grid::{GridCatalog, GridCell};

use thiserror::Error;

/// Errors that can occur while loading geographic tables.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// Opening or reading a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
