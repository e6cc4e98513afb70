//! Flattening of corrected cells into prediction records.

use firespread_spread_models::{Cell, INVALID_SENTINEL, PredictionRecord};
use serde_json::Value;

use crate::sanitize::to_sanitized_value;

/// Maps NaN and the upstream invalid sentinel to `None`.
fn clean(value: f64) -> Option<f64> {
    if value.is_nan() || value == INVALID_SENTINEL {
        None
    } else {
        Some(value)
    }
}

fn clean_opt(value: Option<f64>) -> Option<f64> {
    value.and_then(clean)
}

/// Mean of the present directional probabilities; `0.0` when there are none.
#[must_use]
pub fn farsite_prob(cell: &Cell) -> f64 {
    cell.probabilities
        .and_then(|probs| probs.mean())
        .unwrap_or(0.0)
}

/// Converts one cell to its transmission-ready form.
#[must_use]
pub fn to_record(cell: &Cell) -> PredictionRecord {
    let features = &cell.features;
    let weather = &cell.weather;

    PredictionRecord {
        grid_id: cell.grid_id,
        lat_min: clean(cell.bbox.lat_min),
        lat_max: clean(cell.bbox.lat_max),
        lon_min: clean(cell.bbox.lon_min),
        lon_max: clean(cell.bbox.lon_max),
        center_lat: clean(cell.center_lat),
        center_lon: clean(cell.center_lon),
        avg_fuelload_pertree_kg: clean_opt(features.fuel_load_kg),
        ffmc: clean_opt(features.ffmc),
        dmc: clean_opt(features.dmc),
        dc: clean_opt(features.dc),
        ndvi: clean_opt(features.ndvi),
        smap_20250630_filled: clean_opt(features.soil_moisture),
        temp_c: clean_opt(weather.temperature_c),
        humidity: clean_opt(weather.humidity),
        wind_speed: clean_opt(weather.wind_speed),
        wind_deg: clean_opt(weather.wind_deg),
        precip_mm: clean_opt(weather.precip_mm),
        mean_slope: clean_opt(features.mean_slope),
        spei_recent_avg: clean_opt(features.spei_recent_avg),
        farsite_prob: clean(farsite_prob(cell)),
    }
}

/// Converts a batch of cells, preserving order.
#[must_use]
pub fn to_records(cells: &[Cell]) -> Vec<PredictionRecord> {
    cells.iter().map(to_record).collect()
}

/// Serializes records to a JSON array with every non-finite number
/// replaced by `null`.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if serialization fails.
pub fn records_to_json(records: &[PredictionRecord]) -> Result<Value, serde_json::Error> {
    to_sanitized_value(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::cell;
    use firespread_spread_models::{Direction, DirectionalProbabilities};

    fn contains_non_finite(value: &Value) -> bool {
        match value {
            Value::Number(n) => n.as_f64().is_some_and(|f| !f.is_finite()),
            Value::Array(items) => items.iter().any(contains_non_finite),
            Value::Object(map) => map.values().any(contains_non_finite),
            _ => false,
        }
    }

    #[test]
    fn farsite_prob_is_mean_of_present_directions() {
        let mut c = cell(1, Some(0.0), Some(100.0));
        let mut probs = DirectionalProbabilities::from_values([0.1; 8]);
        probs.set(Direction::N, Some(0.3));
        probs.set(Direction::S, None);
        c.probabilities = Some(probs);

        let expected = (0.1 * 6.0 + 0.3) / 7.0;
        assert!((farsite_prob(&c) - expected).abs() < 1e-12);
    }

    #[test]
    fn farsite_prob_defaults_to_zero() {
        let mut c = cell(1, Some(0.0), Some(100.0));
        c.probabilities = Some(DirectionalProbabilities::default());
        assert_eq!(farsite_prob(&c), 0.0);

        c.probabilities = None;
        assert_eq!(to_record(&c).farsite_prob, Some(0.0));
    }

    #[test]
    fn normalized_cell_averages_to_one_eighth() {
        let mut c = cell(1, Some(0.0), Some(100.0));
        c.probabilities = Some(DirectionalProbabilities::from_values([
            0.05, 0.3, 0.1, 0.15, 0.2, 0.05, 0.1, 0.05,
        ]));
        assert!((to_record(&c).farsite_prob.unwrap() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn sentinel_and_nan_become_absent() {
        let mut c = cell(42, Some(f64::NAN), Some(INVALID_SENTINEL));
        c.features.ndvi = Some(0.61);
        c.weather.humidity = Some(-9999.0);
        c.center_lat = f64::NAN;

        let record = to_record(&c);
        assert_eq!(record.grid_id, 42);
        assert_eq!(record.avg_fuelload_pertree_kg, None);
        assert_eq!(record.wind_deg, None);
        assert_eq!(record.humidity, None);
        assert_eq!(record.center_lat, None);
        assert_eq!(record.ndvi, Some(0.61));
    }

    #[test]
    fn json_output_never_contains_non_finite_numbers() {
        let mut a = cell(1, Some(45.0), Some(300.0));
        a.weather.temperature_c = Some(f64::INFINITY);
        a.probabilities = Some(DirectionalProbabilities::from_values([0.125; 8]));
        let mut b = cell(2, Some(f64::NEG_INFINITY), Some(f64::NAN));
        b.features.dc = Some(f64::NAN);

        let json = records_to_json(&to_records(&[a, b])).unwrap();
        let items = json.as_array().unwrap();

        assert_eq!(items.len(), 2);
        assert!(!contains_non_finite(&json));
        assert!(items[0]["temp_C"].is_null());
        assert!(items[1]["wind_deg"].is_null());
        assert!(items[1]["DC"].is_null());
        assert!(items[0].get("P_N").is_none());
        assert_eq!(items[0]["farsite_prob"], 0.125);
    }
}
