#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grid cell, direction, and prediction record types.
//!
//! This crate defines the data model shared by the spread model, the
//! geography loaders, and the server. Missing or invalid numeric values
//! are always `None`; no sentinel floats travel through these types.

use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Sentinel used by upstream datasets to mark an invalid measurement.
pub const INVALID_SENTINEL: f64 = -9999.0;

/// Drops values that are not real measurements: NaN, infinities and
/// [`INVALID_SENTINEL`].
#[must_use]
pub fn measurement(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != INVALID_SENTINEL)
}

/// One of the eight compass directions fire can spread toward from a cell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Direction {
    /// North-west, offset `(-1, 1)`
    Nw,
    /// North, offset `(0, 1)`
    N,
    /// North-east, offset `(1, 1)`
    Ne,
    /// West, offset `(-1, 0)`
    W,
    /// East, offset `(1, 0)`
    E,
    /// South-west, offset `(-1, -1)`
    Sw,
    /// South, offset `(0, -1)`
    S,
    /// South-east, offset `(1, -1)`
    Se,
}

impl Direction {
    /// Number of directions.
    pub const COUNT: usize = 8;

    /// Returns all directions in canonical column order.
    #[must_use]
    pub const fn all() -> &'static [Self; Self::COUNT] {
        &[
            Self::Nw,
            Self::N,
            Self::Ne,
            Self::W,
            Self::E,
            Self::Sw,
            Self::S,
            Self::Se,
        ]
    }

    /// Position of this direction in [`Direction::all`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Unit grid offset `(dx, dy)` toward the neighbouring cell.
    #[must_use]
    pub const fn offset(self) -> (i8, i8) {
        match self {
            Self::Nw => (-1, 1),
            Self::N => (0, 1),
            Self::Ne => (1, 1),
            Self::W => (-1, 0),
            Self::E => (1, 0),
            Self::Sw => (-1, -1),
            Self::S => (0, -1),
            Self::Se => (1, -1),
        }
    }

    /// Euclidean length of the offset vector (1 or √2).
    #[must_use]
    pub fn distance(self) -> f64 {
        let (dx, dy) = self.offset();
        f64::from(dx).hypot(f64::from(dy))
    }

    /// Bearing of the offset vector in degrees, normalized to `[0, 360)`.
    ///
    /// Measured counter-clockwise from east, so `N` is 90° and `S` is 270°.
    #[must_use]
    pub fn bearing_deg(self) -> f64 {
        let (dx, dy) = self.offset();
        let theta = f64::from(dy).atan2(f64::from(dx)).to_degrees();
        if theta < 0.0 { theta + 360.0 } else { theta }
    }

    /// Column name used by the historical reference dataset (e.g. `P_NW`).
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Nw => "P_NW",
            Self::N => "P_N",
            Self::Ne => "P_NE",
            Self::W => "P_W",
            Self::E => "P_E",
            Self::Sw => "P_SW",
            Self::S => "P_S",
            Self::Se => "P_SE",
        }
    }
}

/// Eight directional spread probabilities, indexed by [`Direction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalProbabilities([Option<f64>; Direction::COUNT]);

impl DirectionalProbabilities {
    /// Creates a set with every direction present.
    #[must_use]
    pub const fn from_values(values: [f64; Direction::COUNT]) -> Self {
        let mut out = [None; Direction::COUNT];
        let mut i = 0;
        while i < Direction::COUNT {
            out[i] = Some(values[i]);
            i += 1;
        }
        Self(out)
    }

    /// Creates a set where any direction may be absent.
    #[must_use]
    pub const fn from_options(values: [Option<f64>; Direction::COUNT]) -> Self {
        Self(values)
    }

    /// All eight directions present and exactly zero.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([Some(0.0); Direction::COUNT])
    }

    /// Probability toward `direction`, if present.
    #[must_use]
    pub const fn get(&self, direction: Direction) -> Option<f64> {
        self.0[direction.index()]
    }

    /// Sets the probability toward `direction`.
    pub const fn set(&mut self, direction: Direction, value: Option<f64>) {
        self.0[direction.index()] = value;
    }

    /// Iterates `(direction, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, Option<f64>)> + '_ {
        Direction::all().iter().map(|d| (*d, self.get(*d)))
    }

    /// Raw values in canonical order.
    #[must_use]
    pub const fn values(&self) -> &[Option<f64>; Direction::COUNT] {
        &self.0
    }

    /// Sum of the present values.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.0.iter().flatten().sum()
    }

    /// Mean of the present values, or `None` when every direction is absent.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        let present: Vec<f64> = self.0.iter().flatten().copied().collect();
        if present.is_empty() {
            None
        } else {
            #[allow(clippy::cast_precision_loss)]
            Some(present.iter().sum::<f64>() / present.len() as f64)
        }
    }

    /// Whether every present value is exactly zero.
    #[must_use]
    pub fn is_all_zero(&self) -> bool {
        self.0.iter().flatten().all(|v| *v == 0.0)
    }
}

/// Per-direction multipliers that counteract historical directional bias.
///
/// Every weight is finite and lies in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionWeights([f64; Direction::COUNT]);

impl CorrectionWeights {
    /// Wraps raw weights in canonical direction order.
    #[must_use]
    pub const fn new(weights: [f64; Direction::COUNT]) -> Self {
        Self(weights)
    }

    /// Weights that leave probabilities unchanged.
    #[must_use]
    pub const fn identity() -> Self {
        Self([1.0; Direction::COUNT])
    }

    /// Weight for `direction`.
    #[must_use]
    pub const fn get(&self, direction: Direction) -> f64 {
        self.0[direction.index()]
    }

    /// Largest weight across all directions.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// Iterates `(direction, weight)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, f64)> + '_ {
        Direction::all().iter().map(|d| (*d, self.get(*d)))
    }
}

impl Serialize for CorrectionWeights {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Direction::COUNT))?;
        for (direction, weight) in self.iter() {
            map.serialize_entry(direction.column(), &weight)?;
        }
        map.end()
    }
}

/// Latitude/longitude extent of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub lat_min: f64,
    /// Northern latitude boundary.
    pub lat_max: f64,
    /// Western longitude boundary.
    pub lon_min: f64,
    /// Eastern longitude boundary.
    pub lon_max: f64,
}

/// Static fuel, terrain, and vegetation indices for a grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticFeatures {
    /// Average fuel load per tree in kilograms.
    pub fuel_load_kg: Option<f64>,
    /// Fine Fuel Moisture Code.
    pub ffmc: Option<f64>,
    /// Duff Moisture Code.
    pub dmc: Option<f64>,
    /// Drought Code.
    pub dc: Option<f64>,
    /// Normalized Difference Vegetation Index.
    pub ndvi: Option<f64>,
    /// Gap-filled SMAP soil moisture.
    pub soil_moisture: Option<f64>,
    /// Mean terrain slope.
    pub mean_slope: Option<f64>,
    /// Recent average Standardized Precipitation-Evapotranspiration Index.
    pub spei_recent_avg: Option<f64>,
}

/// Current weather at a cell center. Any field may be unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Air temperature in °C.
    pub temperature_c: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Wind speed in km/h.
    pub wind_speed: Option<f64>,
    /// Direction the wind blows from, in degrees.
    pub wind_deg: Option<f64>,
    /// Precipitation in millimetres.
    pub precip_mm: Option<f64>,
}

/// One spatial grid unit, the unit of prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Grid identifier.
    pub grid_id: i64,
    /// Cell extent.
    pub bbox: BoundingBox,
    /// Center latitude.
    pub center_lat: f64,
    /// Center longitude.
    pub center_lon: f64,
    /// Static fuel/terrain/vegetation indices.
    pub features: StaticFeatures,
    /// Weather at the cell center.
    pub weather: WeatherObservation,
    /// Directional spread probabilities, once computed.
    pub probabilities: Option<DirectionalProbabilities>,
}

/// A fully assembled cell as a single flat row (20 columns).
///
/// Converting to a [`Cell`] turns NaN and [`INVALID_SENTINEL`] readings
/// into absent values.
///
/// Used for offline CSV batches; column names match [`PredictionRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRow {
    pub grid_id: i64,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    pub avg_fuelload_pertree_kg: Option<f64>,
    #[serde(rename = "FFMC")]
    pub ffmc: Option<f64>,
    #[serde(rename = "DMC")]
    pub dmc: Option<f64>,
    #[serde(rename = "DC")]
    pub dc: Option<f64>,
    #[serde(rename = "NDVI")]
    pub ndvi: Option<f64>,
    pub smap_20250630_filled: Option<f64>,
    #[serde(rename = "temp_C")]
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub precip_mm: Option<f64>,
    pub mean_slope: Option<f64>,
    pub spei_recent_avg: Option<f64>,
}

impl From<CellRow> for Cell {
    fn from(row: CellRow) -> Self {
        Self {
            grid_id: row.grid_id,
            bbox: BoundingBox {
                lat_min: row.lat_min,
                lat_max: row.lat_max,
                lon_min: row.lon_min,
                lon_max: row.lon_max,
            },
            center_lat: row.center_lat,
            center_lon: row.center_lon,
            features: StaticFeatures {
                fuel_load_kg: measurement(row.avg_fuelload_pertree_kg),
                ffmc: measurement(row.ffmc),
                dmc: measurement(row.dmc),
                dc: measurement(row.dc),
                ndvi: measurement(row.ndvi),
                soil_moisture: measurement(row.smap_20250630_filled),
                mean_slope: measurement(row.mean_slope),
                spei_recent_avg: measurement(row.spei_recent_avg),
            },
            weather: WeatherObservation {
                temperature_c: measurement(row.temp_c),
                humidity: measurement(row.humidity),
                wind_speed: measurement(row.wind_speed),
                wind_deg: measurement(row.wind_deg),
                precip_mm: measurement(row.precip_mm),
            },
            probabilities: None,
        }
    }
}

/// The flattened, transmission-ready form of a cell.
///
/// Field names and order form the contract with the prediction-ingestion
/// service. The eight directional probabilities are collapsed into
/// `farsite_prob`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub grid_id: i64,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub avg_fuelload_pertree_kg: Option<f64>,
    #[serde(rename = "FFMC")]
    pub ffmc: Option<f64>,
    #[serde(rename = "DMC")]
    pub dmc: Option<f64>,
    #[serde(rename = "DC")]
    pub dc: Option<f64>,
    #[serde(rename = "NDVI")]
    pub ndvi: Option<f64>,
    pub smap_20250630_filled: Option<f64>,
    #[serde(rename = "temp_C")]
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub precip_mm: Option<f64>,
    pub mean_slope: Option<f64>,
    pub spei_recent_avg: Option<f64>,
    /// Mean of the eight corrected directional probabilities.
    pub farsite_prob: Option<f64>,
}
