#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end wildfire spread prediction.
//!
//! Given a point, [`pipeline::Predictor`] finds the grid cells within a
//! radius, joins their static features, fetches current weather, runs
//! the spread model and bias correction, and sends the resulting records
//! to the prediction-ingestion service.

pub mod config;
pub mod pipeline;
pub mod transmit;

pub use config::{ConfigError, FirespreadConfig};
pub use pipeline::{PredictionOutcome, PredictionSummary, Predictor};
pub use transmit::{HttpPredictionSink, PredictionSink};

use firespread_geography::GeographyError;
use firespread_http::HttpError;
use firespread_spread::SpreadError;
use firespread_weather::WeatherError;
use thiserror::Error;

/// Errors from running a prediction.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Grid or feature data could not be loaded.
    #[error(transparent)]
    Geography(#[from] GeographyError),

    /// The reference dataset could not be loaded.
    #[error(transparent)]
    Spread(#[from] SpreadError),

    /// The weather client could not be constructed.
    #[error(transparent)]
    Weather(#[from] WeatherError),

    /// The prediction-service client could not be constructed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Records could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking loader task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The requested coordinate or radius is not usable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
