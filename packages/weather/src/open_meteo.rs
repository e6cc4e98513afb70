//! Open-Meteo forecast client.
//!
//! `GET {base_url}?latitude=..&longitude=..&current_weather=true
//! &hourly=relative_humidity_2m,precipitation&timezone=..`
//!
//! Temperature, wind speed and wind direction come from
//! `current_weather`. Humidity and precipitation come from the `hourly`
//! series at the entry for the current hour in the response's timezone.
//!
//! See <https://open-meteo.com/en/docs>

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset as _, Utc};
use firespread_http::{HttpPolicy, retry};
use firespread_spread_models::WeatherObservation;
use serde_json::Value;

use crate::{WeatherConfig, WeatherError, WeatherSource};

/// Client for the Open-Meteo forecast API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
    timezone: String,
    policy: HttpPolicy,
}

impl OpenMeteoClient {
    /// Creates a client from weather and HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &WeatherConfig, policy: HttpPolicy) -> Result<Self, WeatherError> {
        Ok(Self {
            client: policy.client()?,
            base_url: config.base_url.clone(),
            timezone: config.timezone.clone(),
            policy,
        })
    }

    /// Request URL for a coordinate.
    #[must_use]
    pub fn url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{base}?latitude={lat}&longitude={lon}\
             &current_weather=true\
             &hourly=relative_humidity_2m,precipitation\
             &timezone={tz}",
            base = self.base_url,
            tz = self.timezone.replace('/', "%2F"),
        )
    }

    /// Fetches and parses the current weather at a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] if the request fails or the response has
    /// no `current_weather` object.
    pub async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherObservation, WeatherError> {
        let url = self.url(lat, lon);
        let body = retry::send_json(|| self.client.get(&url), &self.policy).await?;
        parse_observation(&body, Utc::now())
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn observe(&self, lat: f64, lon: f64) -> WeatherObservation {
        match self.fetch(lat, lon).await {
            Ok(observation) => observation,
            Err(e) => {
                log::warn!("Weather lookup failed for ({lat}, {lon}): {e}");
                WeatherObservation::default()
            }
        }
    }
}

/// The `YYYY-MM-DDTHH:00` key for the hour containing `now`, in the
/// timezone described by the response's `utc_offset_seconds`.
fn current_hour_key(body: &Value, now: DateTime<Utc>) -> String {
    let offset = body["utc_offset_seconds"]
        .as_i64()
        .and_then(|s| i32::try_from(s).ok())
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    now.with_timezone(&offset).format("%Y-%m-%dT%H:00").to_string()
}

/// Value of `hourly[series]` at the index whose `hourly.time` is `key`.
fn hourly_value(body: &Value, series: &str, key: &str) -> Option<f64> {
    let hourly = body.get("hourly")?;
    let index = hourly["time"]
        .as_array()?
        .iter()
        .position(|t| t.as_str() == Some(key))?;
    hourly[series].get(index)?.as_f64()
}

/// Parses an Open-Meteo response relative to the instant `now`.
///
/// # Errors
///
/// Returns [`WeatherError::Parse`] if `current_weather` is missing.
pub fn parse_observation(body: &Value, now: DateTime<Utc>) -> Result<WeatherObservation, WeatherError> {
    let current = body
        .get("current_weather")
        .filter(|v| v.is_object())
        .ok_or_else(|| WeatherError::Parse {
            message: "Missing current_weather object".to_string(),
        })?;

    let key = current_hour_key(body, now);

    Ok(WeatherObservation {
        temperature_c: current["temperature"].as_f64(),
        humidity: hourly_value(body, "relative_humidity_2m", &key),
        wind_speed: current["windspeed"].as_f64(),
        wind_deg: current["winddirection"].as_f64(),
        precip_mm: hourly_value(body, "precipitation", &key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "latitude": 37.5,
            "longitude": 127.0,
            "utc_offset_seconds": 32400,
            "timezone": "Asia/Seoul",
            "current_weather": {
                "time": "2025-07-01T14:00",
                "temperature": 27.3,
                "windspeed": 7.2,
                "winddirection": 250,
                "weathercode": 1
            },
            "hourly": {
                "time": ["2025-07-01T13:00", "2025-07-01T14:00", "2025-07-01T15:00"],
                "relative_humidity_2m": [60, 55, 50],
                "precipitation": [0.0, 0.4, null]
            }
        })
    }

    #[test]
    fn picks_current_hour_in_response_timezone() {
        // 05:20 UTC is 14:20 in UTC+9
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 5, 20, 0).unwrap();
        let obs = parse_observation(&sample(), now).unwrap();

        assert_eq!(obs.temperature_c, Some(27.3));
        assert_eq!(obs.wind_speed, Some(7.2));
        assert_eq!(obs.wind_deg, Some(250.0));
        assert_eq!(obs.humidity, Some(55.0));
        assert_eq!(obs.precip_mm, Some(0.4));
    }

    #[test]
    fn null_hourly_value_is_absent() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 6, 0, 0).unwrap();
        let obs = parse_observation(&sample(), now).unwrap();
        assert_eq!(obs.humidity, Some(50.0));
        assert_eq!(obs.precip_mm, None);
    }

    #[test]
    fn hour_outside_series_leaves_hourly_fields_absent() {
        let now = Utc.with_ymd_and_hms(2025, 7, 2, 0, 0, 0).unwrap();
        let obs = parse_observation(&sample(), now).unwrap();
        assert_eq!(obs.humidity, None);
        assert_eq!(obs.precip_mm, None);
        assert_eq!(obs.wind_deg, Some(250.0));
    }

    #[test]
    fn missing_current_weather_is_an_error() {
        let body = json!({"hourly": {}});
        assert!(matches!(
            parse_observation(&body, Utc::now()),
            Err(WeatherError::Parse { .. })
        ));
    }

    #[test]
    fn missing_offset_defaults_to_utc() {
        let mut body = sample();
        body.as_object_mut().unwrap().remove("utc_offset_seconds");
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 13, 59, 0).unwrap();
        let obs = parse_observation(&body, now).unwrap();
        assert_eq!(obs.humidity, Some(60.0));
    }

    #[test]
    fn builds_request_url() {
        let client = OpenMeteoClient::new(&WeatherConfig::default(), HttpPolicy::default()).unwrap();
        let url = client.url(37.5, 127.25);
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=37.5&longitude=127.25"));
        assert!(url.contains("current_weather=true"));
        assert!(url.contains("hourly=relative_humidity_2m,precipitation"));
        assert!(url.ends_with("timezone=Asia%2FSeoul"));
    }

    #[tokio::test]
    async fn unreachable_service_yields_empty_observation() {
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:1/v1/forecast".to_string(),
            ..WeatherConfig::default()
        };
        let policy = HttpPolicy {
            timeout_secs: 2,
            max_retries: 0,
            backoff_ms: 1,
        };
        let client = OpenMeteoClient::new(&config, policy).unwrap();
        assert_eq!(client.observe(37.5, 127.0).await, WeatherObservation::default());
    }
}
