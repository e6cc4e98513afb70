#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the firespread server.
//!
//! These are kept separate from the pipeline types so the JSON contract
//! can evolve independently.

use firespread_spread_models::PredictionRecord;
use serde::{Deserialize, Serialize};

/// Body of `POST /input`.
///
/// Coordinates are optional at the type level so a missing field is
/// reported as a 400 with a message rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Search radius override in kilometres.
    pub radius_km: Option<f64>,
}

/// Successful prediction response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPrediction {
    pub latitude: f64,
    pub longitude: f64,
    /// Grid cells found within the search radius.
    pub grid_count: usize,
    /// Cells that received spread probabilities.
    pub retained: usize,
    /// Cells dropped for missing inputs.
    pub excluded: usize,
    /// HTTP status from the prediction service; `null` if not delivered.
    pub transmitted: Option<u16>,
    /// Always `"success"`.
    pub status: String,
    /// The first records of the transmitted batch.
    pub sample: Vec<PredictionRecord>,
}

/// Informational response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_camel_case_radius() {
        let req: PredictRequest =
            serde_json::from_str(r#"{"lat": 37.5, "lon": 127.0, "radiusKm": 5}"#).unwrap();
        assert_eq!(req.lat, Some(37.5));
        assert_eq!(req.radius_km, Some(5.0));

        let req: PredictRequest = serde_json::from_str(r#"{"lat": 37.5}"#).unwrap();
        assert_eq!(req.lon, None);
    }

    #[test]
    fn prediction_serializes_camel_case() {
        let body = serde_json::to_value(ApiPrediction {
            latitude: 37.5,
            longitude: 127.0,
            grid_count: 3,
            retained: 2,
            excluded: 1,
            transmitted: None,
            status: "success".to_string(),
            sample: Vec::new(),
        })
        .unwrap();

        assert_eq!(body["gridCount"], 3);
        assert!(body["transmitted"].is_null());
        assert_eq!(body["status"], "success");
    }
}
