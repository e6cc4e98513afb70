//! Grid catalog and radius lookup.
//!
//! The catalog CSV has one row per grid cell with columns `grid_id`,
//! `lat_min`, `lat_max`, `lon_min`, `lon_max`, `center_lat`, `center_lon`.

use std::io::Read;
use std::path::Path;

use firespread_spread_models::BoundingBox;
use serde::Deserialize;

use crate::GeographyError;
use crate::distance::haversine_km;

/// A grid cell's identity and geometry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GridCell {
    pub grid_id: i64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl GridCell {
    /// The cell's extent.
    #[must_use]
    pub const fn bbox(&self) -> BoundingBox {
        BoundingBox {
            lat_min: self.lat_min,
            lat_max: self.lat_max,
            lon_min: self.lon_min,
            lon_max: self.lon_max,
        }
    }
}

/// All known grid cells.
#[derive(Debug, Clone, Default)]
pub struct GridCatalog {
    cells: Vec<GridCell>,
}

impl GridCatalog {
    /// Wraps already-loaded cells.
    #[must_use]
    pub const fn new(cells: Vec<GridCell>) -> Self {
        Self { cells }
    }

    /// Loads the catalog CSV from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the file cannot be read or a row is
    /// malformed.
    pub fn from_path(path: &Path) -> Result<Self, GeographyError> {
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(file)?;
        log::info!(
            "Loaded {} grid cells from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Loads catalog rows from any CSV reader with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError::Csv`] if a row is malformed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeographyError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let cells = reader
            .deserialize::<GridCell>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { cells })
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells whose center lies within `radius_km` of the given point,
    /// inclusive, in catalog order.
    #[must_use]
    pub fn within_radius(&self, lat: f64, lon: f64, radius_km: f64) -> Vec<GridCell> {
        let found: Vec<GridCell> = self
            .cells
            .iter()
            .filter(|c| haversine_km(lat, lon, c.center_lat, c.center_lon) <= radius_km)
            .copied()
            .collect();

        log::debug!(
            "{} of {} grid cells within {radius_km} km of ({lat}, {lon})",
            found.len(),
            self.cells.len()
        );

        found
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const GRID_CSV: &str = "\
grid_id,lat_min,lat_max,lon_min,lon_max,center_lat,center_lon
1,37.000,37.010,127.000,127.010,37.005,127.005
2,37.010,37.020,127.000,127.010,37.015,127.005
3,37.500,37.510,127.500,127.510,37.505,127.505
4,35.100,35.110,129.000,129.010,35.105,129.005
";

    #[test]
    fn loads_catalog_csv() {
        let catalog = GridCatalog::from_reader(GRID_CSV.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn filters_by_radius() {
        let catalog = GridCatalog::from_reader(GRID_CSV.as_bytes()).unwrap();
        let ids: Vec<i64> = catalog
            .within_radius(37.0, 127.0, 15.0)
            .iter()
            .map(|c| c.grid_id)
            .collect();
        assert_eq!(ids, vec![1, 2]);

        let wide: Vec<i64> = catalog
            .within_radius(37.0, 127.0, 100.0)
            .iter()
            .map(|c| c.grid_id)
            .collect();
        assert_eq!(wide, vec![1, 2, 3]);
    }

    #[test]
    fn radius_is_inclusive() {
        let catalog = GridCatalog::from_reader(GRID_CSV.as_bytes()).unwrap();
        let exact = haversine_km(37.0, 127.0, 37.005, 127.005);
        assert_eq!(catalog.within_radius(37.0, 127.0, exact).len(), 1);
    }

    #[test]
    fn nothing_in_range_is_empty() {
        let catalog = GridCatalog::from_reader(GRID_CSV.as_bytes()).unwrap();
        assert!(catalog.within_radius(0.0, 0.0, 15.0).is_empty());
    }

    #[test]
    fn malformed_row_is_an_error() {
        let csv = "grid_id,lat_min,lat_max,lon_min,lon_max,center_lat,center_lon\nx,1,2,3,4,5,6\n";
        assert!(matches!(
            GridCatalog::from_reader(csv.as_bytes()),
            Err(GeographyError::Csv(_))
        ));
    }
}
