//! Core data models for spearlog
//!
//! This module contains the value types shared by the matching engine and
//! the data sources that feed it: environmental conditions, logged dives,
//! catches and tide events.

pub mod history;
pub mod open_meteo;
pub mod tides;

pub use history::{load_history, HistoryError};
pub use open_meteo::{ForecastClient, ForecastError};
pub use tides::{TidesError, TideState};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Environmental conditions at a place and time
///
/// Every field is optional: `None` means "unknown" and is never treated as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditions {
    /// Air temperature in Celsius
    pub temperature: Option<f64>,
    /// Wind speed in km/h
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees (0-359)
    pub wind_direction: Option<f64>,
    /// Significant wave height in meters
    pub wave_height: Option<f64>,
    /// Wave period in seconds
    pub wave_period: Option<f64>,
    /// Tide coefficient (dimensionless, roughly 20-120)
    pub tide_coefficient: Option<f64>,
    /// Moon phase fraction (0/1 = new moon, 0.5 = full moon)
    pub moon_phase: Option<f64>,
}

impl Conditions {
    /// Returns true when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.wind_speed.is_none()
            && self.wind_direction.is_none()
            && self.wave_height.is_none()
            && self.wave_period.is_none()
            && self.tide_coefficient.is_none()
            && self.moon_phase.is_none()
    }
}

/// A fish recorded on a dive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catch {
    /// Species name as logged
    pub species: String,
    /// Weight in kilograms, if weighed
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

/// A past outing from a fisher's log
///
/// `conditions` is `None` when the record was logged without (or with
/// unreadable) conditions; such dives cannot be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDive {
    /// Day of the outing
    pub date: NaiveDate,
    /// Identifier of the spot or zone
    pub location_id: String,
    /// Conditions recorded at logging time
    #[serde(default)]
    pub conditions: Option<Conditions>,
    /// Time in the water, in minutes
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Deepest point reached, in meters
    #[serde(default)]
    pub max_depth_m: Option<f64>,
    /// Fish taken on the dive
    #[serde(default)]
    pub catches: Vec<Catch>,
}

impl HistoricalDive {
    /// Sum of all weighed catches, in kilograms
    pub fn total_weight_kg(&self) -> f64 {
        self.catches.iter().filter_map(|c| c.weight_kg).sum()
    }
}

/// Whether a tide event is a high or a low water
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TideKind {
    High,
    Low,
}

/// A high or low water event in local time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    /// Local time of the event
    pub time: NaiveDateTime,
    /// Water height in meters
    pub height: f64,
    /// High or low water
    pub kind: TideKind,
}
