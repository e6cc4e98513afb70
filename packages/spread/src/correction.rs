//! Historical directional bias correction.
//!
//! The raw model systematically favours some directions. Averaging the
//! probabilities of a historical reference run per direction and
//! inverting those means gives weights that boost under-represented
//! directions. Weights are scaled so the largest is exactly 1.0.

use std::io::Read;
use std::path::{Path, PathBuf};

use firespread_spread_models::{Cell, CorrectionWeights, Direction, DirectionalProbabilities};
use serde::Deserialize;

use crate::SpreadError;

/// One row of the reference CSV. Other columns are ignored.
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "P_NW", default, deserialize_with = "csv::invalid_option")]
    nw: Option<f64>,
    #[serde(rename = "P_N", default, deserialize_with = "csv::invalid_option")]
    n: Option<f64>,
    #[serde(rename = "P_NE", default, deserialize_with = "csv::invalid_option")]
    ne: Option<f64>,
    #[serde(rename = "P_W", default, deserialize_with = "csv::invalid_option")]
    w: Option<f64>,
    #[serde(rename = "P_E", default, deserialize_with = "csv::invalid_option")]
    e: Option<f64>,
    #[serde(rename = "P_SW", default, deserialize_with = "csv::invalid_option")]
    sw: Option<f64>,
    #[serde(rename = "P_S", default, deserialize_with = "csv::invalid_option")]
    s: Option<f64>,
    #[serde(rename = "P_SE", default, deserialize_with = "csv::invalid_option")]
    se: Option<f64>,
}

impl From<ReferenceRow> for DirectionalProbabilities {
    fn from(row: ReferenceRow) -> Self {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Self::from_options([
            finite(row.nw),
            finite(row.n),
            finite(row.ne),
            finite(row.w),
            finite(row.e),
            finite(row.sw),
            finite(row.s),
            finite(row.se),
        ])
    }
}

/// Previously computed directional probabilities used to derive weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceDataset {
    rows: Vec<DirectionalProbabilities>,
}

impl ReferenceDataset {
    /// Wraps already-parsed rows.
    #[must_use]
    pub const fn new(rows: Vec<DirectionalProbabilities>) -> Self {
        Self { rows }
    }

    /// Reads a reference CSV from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SpreadError`] if the file cannot be opened or is not
    /// valid CSV.
    pub fn from_path(path: &Path) -> Result<Self, SpreadError> {
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        log::debug!(
            "Loaded {} reference rows from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Reads a reference CSV with a header row. Empty, unparseable, and
    /// non-finite values become absent.
    ///
    /// # Errors
    ///
    /// Returns [`SpreadError::Csv`] if a record cannot be read.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SpreadError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in reader.deserialize::<ReferenceRow>() {
            rows.push(result?.into());
        }

        Ok(Self { rows })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Mean of each direction column over present values. A column with no
    /// present values yields `None`.
    #[must_use]
    pub fn column_means(&self) -> [Option<f64>; Direction::COUNT] {
        Direction::all().map(|direction| {
            let (sum, count) = self
                .rows
                .iter()
                .filter_map(|row| row.get(direction))
                .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
            #[allow(clippy::cast_precision_loss)]
            (count > 0).then(|| sum / count as f64)
        })
    }
}

/// Derives correction weights from a reference dataset.
///
/// Each weight is the inverse of the direction's historical mean, scaled
/// by the largest inverse so the weights lie in `[0, 1]`. A zero or
/// missing mean gives a zero weight. If every weight is zero, all stay
/// zero.
#[must_use]
pub fn derive_weights(reference: &ReferenceDataset) -> CorrectionWeights {
    let inverse = reference
        .column_means()
        .map(|mean| match mean {
            Some(m) if m != 0.0 => 1.0 / m,
            _ => 0.0,
        })
        .map(|w| if w.is_finite() { w } else { 0.0 });

    let max = inverse.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        log::warn!("Reference dataset has no usable direction means; all weights are zero");
        return CorrectionWeights::new([0.0; Direction::COUNT]);
    }

    CorrectionWeights::new(inverse.map(|w| w / max))
}

/// Reweights and renormalizes one set of probabilities.
#[must_use]
pub fn correct_probabilities(
    probs: &DirectionalProbabilities,
    weights: &CorrectionWeights,
) -> DirectionalProbabilities {
    let mut values = *probs.values();
    for (direction, value) in Direction::all().iter().zip(values.iter_mut()) {
        if let Some(v) = value {
            *v *= weights.get(*direction);
        }
    }
    crate::normalize(&mut values);
    DirectionalProbabilities::from_options(values)
}

/// Applies `weights` to every cell independently.
///
/// Cells without probabilities pass through unchanged.
#[must_use]
pub fn apply_correction(cells: Vec<Cell>, weights: &CorrectionWeights) -> Vec<Cell> {
    cells
        .into_iter()
        .map(|mut cell| {
            cell.probabilities = cell
                .probabilities
                .map(|probs| correct_probabilities(&probs, weights));
            cell
        })
        .collect()
}

/// Corrects batches against a reference file on disk.
///
/// The file is re-read on every call so edits to it take effect without a
/// restart.
#[derive(Debug, Clone)]
pub struct BiasCorrector {
    reference_path: PathBuf,
}

impl BiasCorrector {
    /// Creates a corrector backed by the CSV at `reference_path`.
    #[must_use]
    pub fn from_reference_path(reference_path: impl Into<PathBuf>) -> Self {
        Self {
            reference_path: reference_path.into(),
        }
    }

    /// Loads the reference file and derives fresh weights.
    ///
    /// # Errors
    ///
    /// Returns [`SpreadError`] if the reference file cannot be read.
    pub fn weights(&self) -> Result<CorrectionWeights, SpreadError> {
        let reference = ReferenceDataset::from_path(&self.reference_path)?;
        Ok(derive_weights(&reference))
    }

    /// Derives weights and applies them to `cells`.
    ///
    /// # Errors
    ///
    /// Returns [`SpreadError`] if the reference file cannot be read.
    pub fn correct(&self, cells: Vec<Cell>) -> Result<Vec<Cell>, SpreadError> {
        let weights = self.weights()?;
        log::debug!("Applying correction weights {weights:?}");
        Ok(apply_correction(cells, &weights))
    }
}
