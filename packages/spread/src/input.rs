//! Offline batches of assembled cells.
//!
//! The CSV has one row per cell with the twenty input columns of a
//! [`PredictionRecord`](firespread_spread_models::PredictionRecord)
//! (everything except `farsite_prob`). Empty fields are absent values.

use std::io::Read;
use std::path::Path;

use firespread_spread_models::{Cell, CellRow};

use crate::SpreadError;

/// Reads a cell batch from a CSV file.
///
/// # Errors
///
/// Returns [`SpreadError`] if the file cannot be opened or a row is
/// malformed.
pub fn read_cells_path(path: &Path) -> Result<Vec<Cell>, SpreadError> {
    let file = std::fs::File::open(path)?;
    let cells = read_cells(file)?;
    log::info!("Loaded {} cells from {}", cells.len(), path.display());
    Ok(cells)
}

/// Reads a cell batch from any CSV source.
///
/// # Errors
///
/// Returns [`SpreadError::Csv`] if a row is malformed.
pub fn read_cells<R: Read>(reader: R) -> Result<Vec<Cell>, SpreadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    reader
        .deserialize::<CellRow>()
        .map(|row| Ok(Cell::from(row?)))
        .collect()
}
