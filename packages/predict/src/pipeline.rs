//! The request-level prediction pipeline.
//!
//! grid lookup -> feature join -> weather -> spread -> correction ->
//! records -> transmission

use std::path::PathBuf;
use std::sync::Arc;

use firespread_geography::{FeatureTable, GridCatalog, GridCell};
use firespread_spread::{BiasCorrector, process_batch, records_to_json};
use firespread_spread_models::{Cell, CorrectionWeights, PredictionRecord};
use firespread_weather::open_meteo::OpenMeteoClient;
use firespread_weather::{WeatherSource, attach_weather};
use serde::Serialize;

use crate::config::FirespreadConfig;
use crate::transmit::{HttpPredictionSink, PredictionSink};
use crate::PredictError;

/// Number of records echoed back in a [`PredictionSummary`].
pub const SAMPLE_SIZE: usize = 2;

/// Result of one prediction request.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// No grid cell center lies within the search radius.
    NoGrids { radius_km: f64 },
    /// The pipeline ran to completion.
    Completed(PredictionSummary),
}

/// Result of a completed prediction run, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSummary {
    /// Requested latitude.
    pub latitude: f64,
    /// Requested longitude.
    pub longitude: f64,
    /// Search radius actually used.
    pub radius_km: f64,
    /// Grid cells within the radius, before the feature join.
    pub grid_count: usize,
    /// Cells that received spread probabilities.
    pub retained: usize,
    /// Cells dropped for missing wind direction or fuel load.
    pub excluded: usize,
    /// Status returned by the prediction service, if delivery succeeded.
    pub transmitted: Option<u16>,
    /// The first few records of the batch.
    pub sample: Vec<PredictionRecord>,
}

/// Runs predictions against configured data files and services.
pub struct Predictor {
    config: FirespreadConfig,
    weather: Arc<dyn WeatherSource>,
    sink: Option<Arc<dyn PredictionSink>>,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("config", &self.config)
            .field("transmits", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Predictor {
    /// Creates a predictor from explicit weather and delivery backends.
    /// A `None` sink disables transmission.
    #[must_use]
    pub fn new(
        config: FirespreadConfig,
        weather: Arc<dyn WeatherSource>,
        sink: Option<Arc<dyn PredictionSink>>,
    ) -> Self {
        Self {
            config,
            weather,
            sink,
        }
    }

    /// Builds a predictor using Open-Meteo for weather and, when
    /// `prediction.enabled` is set, the configured ingestion endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError`] if an HTTP client cannot be built.
    pub fn from_config(config: FirespreadConfig) -> Result<Self, PredictError> {
        let weather = OpenMeteoClient::new(&config.weather, config.http)?;

        let sink: Option<Arc<dyn PredictionSink>> = if config.prediction.enabled {
            let sink = HttpPredictionSink::new(config.prediction.endpoint.clone(), config.http)?;
            Some(Arc::new(sink))
        } else {
            log::info!("Prediction transmission disabled");
            None
        };

        Ok(Self::new(config, Arc::new(weather), sink))
    }

    /// Stops sending records to the prediction service.
    #[must_use]
    pub fn without_transmission(mut self) -> Self {
        self.sink = None;
        self
    }

    /// The configuration this predictor runs with.
    #[must_use]
    pub const fn config(&self) -> &FirespreadConfig {
        &self.config
    }

    /// Runs the full pipeline for the point `(lat, lon)`.
    ///
    /// `radius_km` defaults to `search.radius_km`. Transmission failures
    /// are logged and reported as `transmitted: None`; they do not fail
    /// the prediction.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError`] if the input is not finite, a data file
    /// cannot be loaded, or records cannot be serialized.
    pub async fn predict(
        &self,
        lat: f64,
        lon: f64,
        radius_km: Option<f64>,
    ) -> Result<PredictionOutcome, PredictError> {
        let radius_km = radius_km.unwrap_or(self.config.search.radius_km);
        validate(lat, lon, radius_km)?;

        log::info!("Predicting spread around ({lat}, {lon}) within {radius_km} km");

        let (grids, cells) = self.load_cells(lat, lon, radius_km).await?;
        if grids.is_empty() {
            log::info!("No grid cells within {radius_km} km of ({lat}, {lon})");
            return Ok(PredictionOutcome::NoGrids { radius_km });
        }
        log::info!("{} grid cells in range, {} with features", grids.len(), cells.len());

        let cells = attach_weather(
            self.weather.as_ref(),
            cells,
            self.config.weather.max_concurrent_requests,
        )
        .await;

        let weights = self.load_weights().await?;
        let batch = process_batch(cells, &self.config.spread, &weights);
        let payload = records_to_json(&batch.records)?;

        let transmitted = match &self.sink {
            Some(sink) => sink.transmit(&payload).await,
            None => None,
        };

        let mut sample = batch.records;
        sample.truncate(SAMPLE_SIZE);

        Ok(PredictionOutcome::Completed(PredictionSummary {
            latitude: lat,
            longitude: lon,
            radius_km,
            grid_count: grids.len(),
            retained: batch.retained,
            excluded: batch.excluded,
            transmitted,
            sample,
        }))
    }

    /// Reads the grid catalog and feature table, returning the grids in
    /// range and the cells built from them.
    async fn load_cells(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
    ) -> Result<(Vec<GridCell>, Vec<Cell>), PredictError> {
        let grid_csv: PathBuf = self.config.data.grid_csv.clone();
        let features_csv: PathBuf = self.config.data.features_csv.clone();

        tokio::task::spawn_blocking(move || -> Result<_, PredictError> {
            let catalog = GridCatalog::from_path(&grid_csv)?;
            let grids = catalog.within_radius(lat, lon, radius_km);
            if grids.is_empty() {
                return Ok((grids, Vec::new()));
            }

            let features = FeatureTable::from_path(&features_csv)?;
            let cells = features.attach(&grids);
            Ok((grids, cells))
        })
        .await?
    }

    async fn load_weights(&self) -> Result<CorrectionWeights, PredictError> {
        let corrector = BiasCorrector::from_reference_path(self.config.data.reference_csv.clone());
        let weights = tokio::task::spawn_blocking(move || corrector.weights()).await??;
        log::debug!("Correction weights: {weights:?}");
        Ok(weights)
    }
}

fn validate(lat: f64, lon: f64, radius_km: f64) -> Result<(), PredictError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(PredictError::InvalidInput(format!("latitude {lat} out of range")));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(PredictError::InvalidInput(format!("longitude {lon} out of range")));
    }
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(PredictError::InvalidInput(format!(
            "radius {radius_km} km must be positive"
        )));
    }
    Ok(())
}
