//! Eight-direction spread probabilities from wind, fuel load, and slope.
//!
//! For each direction with unit offset `(dx, dy)`:
//!
//! ```text
//! d        = sqrt(dx² + dy²)
//! bearing  = atan2(dy, dx)                       (degrees, [0, 360))
//! G        = α·cos(bearing − wind) + β·cos(bearing − slope)
//! raw      = exp(−d² / σ²) · (1 + G) · ros,      ros = k · fuel_load
//! ```
//!
//! The eight raw values are then normalized to sum to one.

use firespread_spread_models::{Cell, Direction, DirectionalProbabilities, measurement};
use serde::{Deserialize, Serialize};

use crate::SpreadError;

/// Model constants.
///
/// Probabilities stay non-negative only while `|alpha| + |beta| <= 1`,
/// since `1 + G` must not drop below zero. [`SpreadParams::validate`]
/// enforces that along with a positive `sigma`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadParams {
    /// Wind alignment weight (α).
    pub alpha: f64,
    /// Slope alignment weight (β).
    pub beta: f64,
    /// Distance decay scale (σ).
    pub sigma: f64,
    /// Terrain slope aspect in degrees. A single global value until
    /// per-cell aspect data is available.
    pub slope_dir_deg: f64,
    /// Rate-of-spread per kilogram of fuel load (k).
    pub ros_per_fuel_kg: f64,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            beta: 0.5,
            sigma: 1.0,
            slope_dir_deg: 135.0,
            ros_per_fuel_kg: 0.001,
        }
    }
}

impl SpreadParams {
    /// Checks that the parameters keep every raw value non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`SpreadError::InvalidParams`] if any value is non-finite,
    /// `|alpha| + |beta|` exceeds 1, `sigma` is not positive, or
    /// `ros_per_fuel_kg` is negative.
    pub fn validate(&self) -> Result<(), SpreadError> {
        let invalid = |message: String| Err(SpreadError::InvalidParams { message });

        let values = [
            self.alpha,
            self.beta,
            self.sigma,
            self.slope_dir_deg,
            self.ros_per_fuel_kg,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return invalid("spread parameters must be finite".to_string());
        }
        if self.alpha.abs() + self.beta.abs() > 1.0 {
            return invalid(format!(
                "|alpha| + |beta| must be at most 1 (alpha={}, beta={})",
                self.alpha, self.beta
            ));
        }
        if self.sigma <= 0.0 {
            return invalid(format!("sigma must be positive (sigma={})", self.sigma));
        }
        if self.ros_per_fuel_kg < 0.0 {
            return invalid(format!(
                "ros_per_fuel_kg must not be negative ({})",
                self.ros_per_fuel_kg
            ));
        }
        Ok(())
    }
}

/// Result of running the model over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadOutcome {
    /// Cells with probabilities, in input order.
    pub cells: Vec<Cell>,
    /// Number of input cells dropped for missing wind direction or fuel load.
    pub excluded: usize,
}

impl SpreadOutcome {
    /// Number of cells that received probabilities.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.cells.len()
    }
}

/// Unnormalized directional values for one cell, in canonical order.
#[must_use]
pub fn raw_probabilities(
    wind_deg: f64,
    fuel_load_kg: f64,
    params: &SpreadParams,
) -> [f64; Direction::COUNT] {
    let ros = params.ros_per_fuel_kg * fuel_load_kg;
    let sigma_sq = params.sigma * params.sigma;

    Direction::all().map(|direction| {
        let d = direction.distance();
        let bearing = direction.bearing_deg();
        let g = params.alpha * (bearing - wind_deg).to_radians().cos()
            + params.beta * (bearing - params.slope_dir_deg).to_radians().cos();
        (-(d * d) / sigma_sq).exp() * (1.0 + g) * ros
    })
}

/// Normalized probabilities for one cell, or `None` when wind direction or
/// fuel load is missing, non-finite, or the invalid sentinel.
#[must_use]
pub fn cell_probabilities(cell: &Cell, params: &SpreadParams) -> Option<DirectionalProbabilities> {
    let wind_deg = measurement(cell.weather.wind_deg)?;
    let fuel_load = measurement(cell.features.fuel_load_kg)?;

    let raw = raw_probabilities(wind_deg, fuel_load, params);
    let mut values = raw.map(Some);
    crate::normalize(&mut values);

    Some(DirectionalProbabilities::from_options(values))
}

/// Computes directional probabilities for every cell that has the inputs.
///
/// Cells lacking a wind direction or fuel load are left out of the
/// returned batch and counted in [`SpreadOutcome::excluded`].
#[must_use]
pub fn compute_spread(cells: Vec<Cell>, params: &SpreadParams) -> SpreadOutcome {
    let total = cells.len();

    let cells: Vec<Cell> = cells
        .into_iter()
        .filter_map(|mut cell| {
            let Some(probs) = cell_probabilities(&cell, params) else {
                log::debug!(
                    "Excluding grid {} from spread model: wind_deg={:?} fuel_load={:?}",
                    cell.grid_id,
                    cell.weather.wind_deg,
                    cell.features.fuel_load_kg,
                );
                return None;
            };
            cell.probabilities = Some(probs);
            Some(cell)
        })
        .collect();

    let excluded = total - cells.len();
    log::debug!(
        "Spread model: {} of {total} cells retained, {excluded} excluded",
        cells.len()
    );

    SpreadOutcome { cells, excluded }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use firespread_spread_models::{
        BoundingBox, INVALID_SENTINEL, StaticFeatures, WeatherObservation,
    };

    pub(crate) fn cell(grid_id: i64, wind_deg: Option<f64>, fuel: Option<f64>) -> Cell {
        Cell {
            grid_id,
            bbox: BoundingBox {
                lat_min: 37.0,
                lat_max: 37.01,
                lon_min: 127.0,
                lon_max: 127.01,
            },
            center_lat: 37.005,
            center_lon: 127.005,
            features: StaticFeatures {
                fuel_load_kg: fuel,
                ..StaticFeatures::default()
            },
            weather: WeatherObservation {
                wind_deg,
                ..WeatherObservation::default()
            },
            probabilities: None,
        }
    }

    fn assert_normalized(probs: &DirectionalProbabilities) {
        let values = probs.values();
        assert!(values.iter().all(Option::is_some));
        assert!(values.iter().flatten().all(|v| *v >= 0.0));
        let sum = probs.sum();
        assert!(
            (sum - 1.0).abs() < 1e-9 || probs.is_all_zero(),
            "probabilities sum to {sum}"
        );
    }

    #[test]
    fn raw_values_match_formula_for_north_wind() {
        // wind 0°, slope 135°, α = β = 0.5, ros = 1.0
        let raw = raw_probabilities(0.0, 1000.0, &SpreadParams::default());
        let e1 = (-1.0_f64).exp();
        let e2 = (-2.0_f64).exp();
        let half_root2 = std::f64::consts::FRAC_1_SQRT_2 / 2.0;

        // N: cos(90°) = 0, cos(-45°) = √2/2
        assert!((raw[Direction::N.index()] - e1 * (1.0 + half_root2)).abs() < 1e-12);
        // S: cos(270°) = 0, cos(135°) = -√2/2
        assert!((raw[Direction::S.index()] - e1 * (1.0 - half_root2)).abs() < 1e-12);
        // E: cos(0°) = 1, cos(-135°) = -√2/2
        assert!((raw[Direction::E.index()] - e1 * (1.5 - half_root2)).abs() < 1e-12);
        // NW: cos(135°) = -√2/2, cos(0°) = 1
        assert!((raw[Direction::Nw.index()] - e2 * (1.5 - half_root2)).abs() < 1e-12);

        assert!((raw[Direction::N.index()] - 0.497_944_464_927_164_65).abs() < 1e-12);
        assert!((raw[Direction::S.index()] - 0.237_814_417_415_720_07).abs() < 1e-12);
        assert!(raw[Direction::N.index()] > raw[Direction::S.index()]);
    }

    #[test]
    fn normalized_values_match_reference_numbers() {
        let probs = cell_probabilities(&cell(1, Some(0.0), Some(1000.0)), &SpreadParams::default())
            .unwrap();
        let expected = [
            0.077_081_745_164_664_11,
            0.247_381_704_456_735_74,
            0.091_006_643_191_582_78,
            0.155_999_382_127_985_06,
            0.209_529_907_187_017_47,
            0.043_464_067_493_414_735,
            0.118_147_584_858_266_82,
            0.057_388_965_520_333_395,
        ];
        for (direction, value) in probs.iter() {
            let value = value.unwrap();
            assert!(
                (value - expected[direction.index()]).abs() < 1e-12,
                "{direction}: {value}"
            );
        }
        assert_normalized(&probs);
    }

    #[test]
    fn normalization_is_independent_of_fuel_scale() {
        let params = SpreadParams::default();
        let a = cell_probabilities(&cell(1, Some(200.0), Some(10.0)), &params).unwrap();
        let b = cell_probabilities(&cell(1, Some(200.0), Some(5000.0)), &params).unwrap();
        for ((_, x), (_, y)) in a.iter().zip(b.iter()) {
            assert!((x.unwrap() - y.unwrap()).abs() < 1e-12);
        }
    }

    #[test]
    fn every_wind_direction_yields_a_distribution() {
        let params = SpreadParams::default();
        for wind in (0..360).step_by(15) {
            let probs =
                cell_probabilities(&cell(1, Some(f64::from(wind)), Some(350.0)), &params).unwrap();
            assert_normalized(&probs);
        }
    }

    #[test]
    fn zero_fuel_load_zeroes_all_directions() {
        let probs =
            cell_probabilities(&cell(1, Some(90.0), Some(0.0)), &SpreadParams::default()).unwrap();
        assert_eq!(probs, DirectionalProbabilities::zeroed());
    }

    #[test]
    fn missing_wind_excludes_exactly_one_cell() {
        let cells = vec![
            cell(1, Some(10.0), Some(100.0)),
            cell(2, None, Some(100.0)),
            cell(3, Some(270.0), Some(100.0)),
        ];
        let outcome = compute_spread(cells, &SpreadParams::default());
        assert_eq!(outcome.retained(), 2);
        assert_eq!(outcome.excluded, 1);
        let ids: Vec<i64> = outcome.cells.iter().map(|c| c.grid_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn missing_or_nan_fuel_load_excludes_cell() {
        let cells = vec![cell(1, Some(10.0), None), cell(2, Some(10.0), Some(f64::NAN))];
        let outcome = compute_spread(cells, &SpreadParams::default());
        assert!(outcome.cells.is_empty());
        assert_eq!(outcome.excluded, 2);
    }

    #[test]
    fn sentinel_inputs_exclude_cell() {
        let cells = vec![
            cell(1, Some(0.0), Some(INVALID_SENTINEL)),
            cell(2, Some(INVALID_SENTINEL), Some(500.0)),
            cell(3, Some(0.0), Some(500.0)),
        ];
        let outcome = compute_spread(cells, &SpreadParams::default());
        assert_eq!(outcome.excluded, 2);
        let ids: Vec<i64> = outcome.cells.iter().map(|c| c.grid_id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn default_params_are_valid() {
        assert!(SpreadParams::default().validate().is_ok());
        let edge = SpreadParams {
            alpha: 0.7,
            beta: -0.3,
            ..SpreadParams::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn rejects_params_that_allow_negative_values() {
        let cases = [
            SpreadParams {
                alpha: 0.8,
                beta: 0.5,
                ..SpreadParams::default()
            },
            SpreadParams {
                sigma: 0.0,
                ..SpreadParams::default()
            },
            SpreadParams {
                ros_per_fuel_kg: -0.001,
                ..SpreadParams::default()
            },
            SpreadParams {
                slope_dir_deg: f64::NAN,
                ..SpreadParams::default()
            },
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(SpreadError::InvalidParams { .. })),
                "{params:?}"
            );
        }
    }

    #[test]
    fn slope_direction_is_a_parameter() {
        let default = cell_probabilities(&cell(1, Some(0.0), Some(1.0)), &SpreadParams::default())
            .unwrap();
        let params = SpreadParams {
            slope_dir_deg: 315.0,
            ..SpreadParams::default()
        };
        let shifted = cell_probabilities(&cell(1, Some(0.0), Some(1.0)), &params).unwrap();
        assert!(shifted.get(Direction::Se).unwrap() > default.get(Direction::Se).unwrap());
        assert_normalized(&shifted);
    }
}
