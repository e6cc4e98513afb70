#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Directional wildfire spread probabilities for grid cells.
//!
//! The pipeline has three synchronous stages:
//!
//! 1. [`model::compute_spread`] turns wind direction and fuel load into
//!    eight normalized directional probabilities per cell.
//! 2. [`correction::BiasCorrector`] derives per-direction weights from a
//!    historical reference dataset and renormalizes each cell.
//! 3. [`assemble::to_records`] collapses the eight directions into a
//!    single `farsite_prob` and flattens each cell into a
//!    [`PredictionRecord`](firespread_spread_models::PredictionRecord).
//!
//! None of the computations fail. Only reading the reference dataset or
//! an offline cell batch ([`input`]) can return a [`SpreadError`].

pub mod assemble;
pub mod correction;
pub mod input;
pub mod model;
pub mod sanitize;

pub use assemble::{records_to_json, to_records};
pub use correction::{BiasCorrector, ReferenceDataset, apply_correction, derive_weights};
pub use input::{read_cells, read_cells_path};
pub use model::{SpreadOutcome, SpreadParams, compute_spread};

use firespread_spread_models::{Cell, CorrectionWeights, PredictionRecord};

/// Errors from loading spread inputs.
#[derive(Debug, thiserror::Error)]
pub enum SpreadError {
    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An input CSV is malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spread parameters would allow negative probabilities.
    #[error("Invalid spread parameters: {message}")]
    InvalidParams {
        /// Which constraint was violated.
        message: String,
    },
}

/// Records produced from one batch, with how many cells made it through.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutput {
    /// One record per retained cell, in input order.
    pub records: Vec<PredictionRecord>,
    /// Cells that received probabilities.
    pub retained: usize,
    /// Cells dropped for missing wind direction or fuel load.
    pub excluded: usize,
}

/// Runs spread, correction, and assembly over one batch of cells.
#[must_use]
pub fn process_batch(
    cells: Vec<Cell>,
    params: &SpreadParams,
    weights: &CorrectionWeights,
) -> BatchOutput {
    let outcome = compute_spread(cells, params);
    let retained = outcome.retained();
    let excluded = outcome.excluded;

    let corrected = apply_correction(outcome.cells, weights);
    let records = to_records(&corrected);

    log::info!("Spread batch: {retained} cells retained, {excluded} excluded");

    BatchOutput {
        records,
        retained,
        excluded,
    }
}

/// Sum `values` in place to one. Zero or NaN sums zero every present value.
///
/// Absent entries stay absent. Shared by both normalization steps.
pub(crate) fn normalize(values: &mut [Option<f64>]) {
    let total: f64 = values.iter().flatten().sum();

    if total == 0.0 || total.is_nan() {
        for v in values.iter_mut() {
            *v = Some(0.0);
        }
        return;
    }

    for v in values.iter_mut().flatten() {
        *v /= total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::tests::cell;

    #[test]
    fn batch_keeps_only_complete_cells() {
        let cells = vec![
            cell(1, Some(0.0), Some(1000.0)),
            cell(2, None, Some(1000.0)),
            cell(3, Some(180.0), None),
            cell(4, Some(90.0), Some(0.0)),
        ];
        let output = process_batch(cells, &SpreadParams::default(), &CorrectionWeights::identity());

        assert_eq!(output.retained, 2);
        assert_eq!(output.excluded, 2);
        let ids: Vec<i64> = output.records.iter().map(|r| r.grid_id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!((output.records[0].farsite_prob.unwrap() - 0.125).abs() < 1e-12);
        assert_eq!(output.records[1].farsite_prob, Some(0.0));
    }

    #[test]
    fn normalize_divides_by_sum() {
        let mut values = [Some(1.0), Some(3.0), None];
        normalize(&mut values);
        assert_eq!(values, [Some(0.25), Some(0.75), None]);
    }

    #[test]
    fn normalize_zeroes_degenerate_sum() {
        let mut values = [Some(0.0), Some(0.0), None];
        normalize(&mut values);
        assert_eq!(values, [Some(0.0), Some(0.0), Some(0.0)]);

        let mut values = [Some(f64::NAN), Some(1.0)];
        normalize(&mut values);
        assert_eq!(values, [Some(0.0), Some(0.0)]);
    }
}
