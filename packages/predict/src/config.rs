//! Runtime configuration.
//!
//! Defaults are compiled in from `config/default.toml`. Setting
//! `FIRESPREAD_CONFIG` to a TOML file overrides any subset of them;
//! missing sections and keys keep their defaults.

use std::path::{Path, PathBuf};

use firespread_http::HttpPolicy;
use firespread_spread::SpreadParams;
use firespread_weather::WeatherConfig;
use serde::Deserialize;

/// Environment variable naming an override config file.
pub const CONFIG_ENV: &str = "FIRESPREAD_CONFIG";

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this layout.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The `[spread]` section is out of range.
    #[error(transparent)]
    Spread(#[from] firespread_spread::SpreadError),
}

/// Input data locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Grid catalog CSV (ids, extents, centers).
    pub grid_csv: PathBuf,
    /// Static feature CSV keyed by `grid_id`.
    pub features_csv: PathBuf,
    /// Historical directional probabilities used for bias correction.
    pub reference_csv: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            grid_csv: PathBuf::from("data/korea_grids_0.01deg.csv"),
            features_csv: PathBuf::from("data/input_data_set_no_weather.csv"),
            reference_csv: PathBuf::from("data/input_data_farsite_Nan.csv"),
        }
    }
}

/// Grid search settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default search radius around the requested point.
    pub radius_km: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { radius_km: 15.0 }
    }
}

/// Downstream prediction-ingestion service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Endpoint that accepts the record batch as a JSON array.
    pub endpoint: String,
    /// Whether records are sent at all.
    pub enabled: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://firespread-api.onrender.com/input".to_string(),
            enabled: true,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FirespreadConfig {
    pub data: DataConfig,
    pub search: SearchConfig,
    pub spread: SpreadParams,
    pub weather: WeatherConfig,
    pub http: HttpPolicy,
    pub prediction: PredictionConfig,
}

impl FirespreadConfig {
    /// Parses a TOML document; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed, or
    /// [`ConfigError::Spread`] if the spread parameters are out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.spread.validate()?;
        Ok(config)
    }

    /// Reads a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// The compiled-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the embedded file is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(DEFAULT_TOML)
    }

    /// Loads the file named by `FIRESPREAD_CONFIG`, or the embedded
    /// defaults when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the override file cannot be read or
    /// parsed.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                log::info!("Loading config from {}", path.display());
                Self::from_path(&path)
            }
            None => Self::embedded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_match_code_defaults() {
        let embedded = FirespreadConfig::embedded().unwrap();
        assert_eq!(embedded, FirespreadConfig::default());
    }

    #[test]
    fn embedded_defaults_have_expected_values() {
        let config = FirespreadConfig::embedded().unwrap();
        assert!((config.search.radius_km - 15.0).abs() < f64::EPSILON);
        assert!((config.spread.slope_dir_deg - 135.0).abs() < f64::EPSILON);
        assert!((config.spread.ros_per_fuel_kg - 0.001).abs() < f64::EPSILON);
        assert_eq!(config.weather.timezone, "Asia/Seoul");
        assert!(config.prediction.enabled);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = FirespreadConfig::from_toml(
            r#"
            [spread]
            slope_dir_deg = 200.0

            [prediction]
            enabled = false
            "#,
        )
        .unwrap();

        assert!((config.spread.slope_dir_deg - 200.0).abs() < f64::EPSILON);
        assert!((config.spread.alpha - 0.5).abs() < f64::EPSILON);
        assert!(!config.prediction.enabled);
        assert_eq!(config.prediction.endpoint, PredictionConfig::default().endpoint);
        assert_eq!(config.data, DataConfig::default());
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(matches!(
            FirespreadConfig::from_toml("[search]\nradius_km = \"far\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn rejects_spread_weights_above_one() {
        let result = FirespreadConfig::from_toml("[spread]\nalpha = 0.8\nbeta = 0.5");
        assert!(matches!(result, Err(ConfigError::Spread(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FirespreadConfig::from_path(Path::new("/nonexistent/firespread.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/firespread.toml"));
    }
}
