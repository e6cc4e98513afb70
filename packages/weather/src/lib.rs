#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Current weather for grid cell centers.
//!
//! [`open_meteo::OpenMeteoClient`] fetches temperature, wind, humidity and
//! precipitation for one coordinate. [`attach_weather`] fans that out over
//! a batch of cells with bounded concurrency. A failed lookup yields an
//! empty [`WeatherObservation`] for that cell; it never fails the batch.

pub mod open_meteo;

use async_trait::async_trait;
use firespread_spread_models::{Cell, WeatherObservation};
use futures::stream::{self, StreamExt as _};
use serde::Deserialize;

/// Errors from a single weather lookup.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// The HTTP request failed.
    #[error(transparent)]
    Http(#[from] firespread_http::HttpError),

    /// The response did not have the expected shape.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Weather service settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Forecast endpoint.
    pub base_url: String,
    /// IANA timezone the hourly series is requested in.
    pub timezone: String,
    /// Maximum number of lookups in flight at once.
    pub max_concurrent_requests: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            timezone: "Asia/Seoul".to_string(),
            max_concurrent_requests: 16,
        }
    }
}

/// Something that can report the current weather at a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current weather at `(lat, lon)`. Unavailable fields are `None`.
    async fn observe(&self, lat: f64, lon: f64) -> WeatherObservation;
}

/// Fills in weather for every cell, one lookup per cell center.
///
/// Lookups run concurrently, at most `max_concurrent` at a time. Output
/// order matches input order.
pub async fn attach_weather<S: WeatherSource + ?Sized>(
    source: &S,
    cells: Vec<Cell>,
    max_concurrent: usize,
) -> Vec<Cell> {
    let total = cells.len();
    log::info!("Fetching weather for {total} cells (concurrency={max_concurrent})...");

    let cells: Vec<Cell> = stream::iter(cells.into_iter().map(|mut cell| async move {
        cell.weather = source.observe(cell.center_lat, cell.center_lon).await;
        cell
    }))
    .buffered(max_concurrent.max(1))
    .collect()
    .await;

    let missing_wind = cells
        .iter()
        .filter(|c| c.weather.wind_deg.is_none())
        .count();
    if missing_wind > 0 {
        log::warn!("{missing_wind} of {total} cells have no wind direction");
    }

    cells
}
