//! Application configuration
//!
//! Loaded from a JSON file: an explicit `--config` path, else
//! `config.json` in the platform config directory, else built-in defaults.
//! Every section is optional and falls back to its default.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::data::open_meteo::{OPEN_METEO_FORECAST_URL, OPEN_METEO_MARINE_URL};
use crate::matcher::{MatchFinder, DEFAULT_MAX_RESULTS, DEFAULT_MIN_SCORE};
use crate::similarity::{ScoringConfig, ScoringConfigError};

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Scoring parameters are unusable
    #[error("Invalid scoring parameters: {0}")]
    Scoring(#[from] ScoringConfigError),

    /// A setting is outside its allowed range
    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Match search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Minimum similarity for a dive to be reported
    pub min_score: f64,
    /// Maximum number of dives reported
    pub max_results: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Forecast provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// How long a cached forecast stays fresh
    pub cache_ttl_hours: u32,
    /// Disable the on-disk forecast cache
    pub disable_cache: bool,
    /// Weather forecast endpoint
    pub weather_url: String,
    /// Marine forecast endpoint
    pub marine_url: String,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            cache_ttl_hours: 3,
            disable_cache: false,
            weather_url: OPEN_METEO_FORECAST_URL.to_string(),
            marine_url: OPEN_METEO_MARINE_URL.to_string(),
        }
    }
}

/// Tide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TideSettings {
    /// Mean spring tide range of the area in meters; a day with this range
    /// has a coefficient of 100
    pub mean_spring_range_m: f64,
}

impl Default for TideSettings {
    fn default() -> Self {
        Self {
            mean_spring_range_m: 4.0,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    pub matching: MatchSettings,
    pub forecast: ForecastSettings,
    pub tides: TideSettings,
}

impl AppConfig {
    /// Loads configuration from `path`, or from the default location when
    /// `path` is `None`. A missing default file yields the defaults; a
    /// missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !required && !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges the types cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;

        if !(0.0..=1.0).contains(&self.matching.min_score) {
            return Err(ConfigError::Invalid {
                name: "matching.min_score",
                reason: format!("must be between 0 and 1, got {}", self.matching.min_score),
            });
        }
        if self.matching.max_results == 0 {
            return Err(ConfigError::Invalid {
                name: "matching.max_results",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.tides.mean_spring_range_m.is_finite() && self.tides.mean_spring_range_m > 0.0) {
            return Err(ConfigError::Invalid {
                name: "tides.mean_spring_range_m",
                reason: format!("must be positive, got {}", self.tides.mean_spring_range_m),
            });
        }
        Ok(())
    }

    /// Match finder built from the scoring and matching sections.
    pub fn match_finder(&self) -> MatchFinder {
        MatchFinder::new(
            self.scoring.clone(),
            self.matching.min_score,
            self.matching.max_results,
        )
    }
}

/// `config.json` in the platform config directory
/// (`~/.config/spearlog/config.json` on Linux).
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "spearlog").map(|dirs| dirs.config_dir().join("config.json"))
}
