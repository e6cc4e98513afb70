//! HTTP handler functions for the firespread API.

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, web};
use firespread_predict::{PredictError, PredictionOutcome, PredictionSummary};
use firespread_server_models::{ApiError, ApiHealth, ApiMessage, ApiPrediction, PredictRequest};
use firespread_spread::sanitize::to_sanitized_value;
use serde::Serialize;

use crate::AppState;

/// `GET /`
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(ApiMessage::new("Wildfire backend is running"))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /input`
///
/// Runs the prediction pipeline around the posted coordinate.
pub async fn input(state: web::Data<AppState>, body: web::Json<PredictRequest>) -> HttpResponse {
    let PredictRequest {
        lat,
        lon,
        radius_km,
    } = body.into_inner();

    let (Some(lat), Some(lon)) = (lat, lon) else {
        return HttpResponse::BadRequest().json(ApiError::new("Both lat and lon are required"));
    };

    match state.predictor.predict(lat, lon, radius_km).await {
        Ok(PredictionOutcome::NoGrids { radius_km }) => HttpResponse::Ok().json(ApiMessage::new(
            format!("no grid cells within {radius_km} km"),
        )),
        Ok(PredictionOutcome::Completed(summary)) => {
            sanitized_json(HttpResponse::Ok(), &to_api_prediction(summary))
        }
        Err(PredictError::InvalidInput(message)) => {
            HttpResponse::BadRequest().json(ApiError::new(message))
        }
        Err(e) => {
            log::error!("Prediction failed for ({lat}, {lon}): {e}");
            HttpResponse::InternalServerError().json(ApiError::new(format!("Prediction failed: {e}")))
        }
    }
}

/// Turns malformed JSON bodies into a 400 with an [`ApiError`] body.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiError::new(format!("Invalid request body: {err}")));
    InternalError::from_response(err, response).into()
}

fn to_api_prediction(summary: PredictionSummary) -> ApiPrediction {
    ApiPrediction {
        latitude: summary.latitude,
        longitude: summary.longitude,
        grid_count: summary.grid_count,
        retained: summary.retained,
        excluded: summary.excluded,
        transmitted: summary.transmitted,
        status: "success".to_string(),
        sample: summary.sample,
    }
}

/// Serializes `body` with non-finite numbers replaced by `null`.
fn sanitized_json<T: Serialize>(mut builder: HttpResponseBuilder, body: &T) -> HttpResponse {
    match to_sanitized_value(body) {
        Ok(value) => builder.json(value),
        Err(e) => {
            log::error!("Failed to serialize response: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to serialize response"))
        }
    }
}
