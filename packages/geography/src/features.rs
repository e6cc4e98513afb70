//! Static (non-weather) grid features keyed by grid ID.
//!
//! The feature CSV carries `grid_id` plus fuel, fire-weather index,
//! vegetation, soil moisture, slope, and drought columns. Extra columns
//! are ignored; empty, unparseable, NaN and `-9999` values become `None`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use firespread_spread_models::{Cell, StaticFeatures, WeatherObservation, measurement};
use serde::Deserialize;

use crate::GeographyError;
use crate::grid::GridCell;

#[derive(Debug, Deserialize)]
struct FeatureRow {
    grid_id: i64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    avg_fuelload_pertree_kg: Option<f64>,
    #[serde(rename = "FFMC", default, deserialize_with = "csv::invalid_option")]
    ffmc: Option<f64>,
    #[serde(rename = "DMC", default, deserialize_with = "csv::invalid_option")]
    dmc: Option<f64>,
    #[serde(rename = "DC", default, deserialize_with = "csv::invalid_option")]
    dc: Option<f64>,
    #[serde(rename = "NDVI", default, deserialize_with = "csv::invalid_option")]
    ndvi: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    smap_20250630_filled: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    mean_slope: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    spei_recent_avg: Option<f64>,
}

impl From<FeatureRow> for StaticFeatures {
    fn from(row: FeatureRow) -> Self {
        Self {
            fuel_load_kg: measurement(row.avg_fuelload_pertree_kg),
            ffmc: measurement(row.ffmc),
            dmc: measurement(row.dmc),
            dc: measurement(row.dc),
            ndvi: measurement(row.ndvi),
            soil_moisture: measurement(row.smap_20250630_filled),
            mean_slope: measurement(row.mean_slope),
            spei_recent_avg: measurement(row.spei_recent_avg),
        }
    }
}

/// Static features for every grid cell that has them.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    by_grid: BTreeMap<i64, StaticFeatures>,
}

impl FeatureTable {
    /// Loads the feature CSV from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the file cannot be read or a row is
    /// malformed.
    pub fn from_path(path: &Path) -> Result<Self, GeographyError> {
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        log::info!(
            "Loaded static features for {} grid cells from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Loads feature rows from any CSV reader with a header row. Later rows
    /// for the same grid ID replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::Csv`] if a row is malformed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeographyError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut by_grid = BTreeMap::new();
        for result in reader.deserialize::<FeatureRow>() {
            let row = result?;
            by_grid.insert(row.grid_id, row.into());
        }

        Ok(Self { by_grid })
    }

    /// Number of grid cells with features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_grid.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_grid.is_empty()
    }

    /// Features for one grid cell.
    #[must_use]
    pub fn get(&self, grid_id: i64) -> Option<&StaticFeatures> {
        self.by_grid.get(&grid_id)
    }

    /// Builds cells for every grid that has a feature row, in grid order.
    /// Grids without features are dropped. Weather starts empty.
    #[must_use]
    pub fn attach(&self, grids: &[GridCell]) -> Vec<Cell> {
        let cells: Vec<Cell> = grids
            .iter()
            .filter_map(|grid| {
                let Some(features) = self.get(grid.grid_id) else {
                    log::debug!("No static features for grid {}, skipping", grid.grid_id);
                    return None;
                };
                Some(Cell {
                    grid_id: grid.grid_id,
                    bbox: grid.bbox(),
                    center_lat: grid.center_lat,
                    center_lon: grid.center_lon,
                    features: *features,
                    weather: WeatherObservation::default(),
                    probabilities: None,
                })
            })
            .collect();

        if cells.len() < grids.len() {
            log::info!(
                "{} of {} grid cells have no static features",
                grids.len() - cells.len(),
                grids.len()
            );
        }

        cells
    }
}
