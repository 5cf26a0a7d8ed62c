//! Condition similarity scorer
//!
//! Compares two [`Conditions`] snapshots field by field and folds the
//! per-field closeness values into a weighted score in [0, 1]. Weights,
//! closeness curves and "significant" thresholds all live in
//! [`ScoringConfig`] so they can be tuned (or learned) without touching the
//! algorithm.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::Conditions;

/// Errors from validating a scoring configuration
#[derive(Debug, Error, PartialEq)]
pub enum ScoringConfigError {
    /// A field weight is negative or not finite
    #[error("Invalid weight for {field}: {value}")]
    InvalidWeight { field: &'static str, value: f64 },

    /// A closeness curve has a non-positive span or period
    #[error("Invalid closeness curve for {field}: {reason}")]
    InvalidCurve { field: &'static str, reason: String },

    /// A significance threshold lies outside [0, 1]
    #[error("Invalid significance threshold for {field}: {value}")]
    InvalidThreshold { field: &'static str, value: f64 },
}

/// Condition fields the scorer compares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    WindSpeed,
    WindDirection,
    WaveHeight,
    TideCoefficient,
    MoonPhase,
    Temperature,
}

impl Field {
    /// Returns all comparable fields.
    pub fn all() -> &'static [Field] {
        &[
            Field::WindSpeed,
            Field::WindDirection,
            Field::WaveHeight,
            Field::TideCoefficient,
            Field::MoonPhase,
            Field::Temperature,
        ]
    }

    /// Short name used in config errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Field::WindSpeed => "wind_speed",
            Field::WindDirection => "wind_direction",
            Field::WaveHeight => "wave_height",
            Field::TideCoefficient => "tide_coefficient",
            Field::MoonPhase => "moon_phase",
            Field::Temperature => "temperature",
        }
    }

    /// Human-readable reason shown when this field drives a match.
    pub fn reason(&self) -> &'static str {
        match self {
            Field::WindSpeed => "similar wind strength",
            Field::WindDirection => "similar wind direction",
            Field::WaveHeight => "similar swell",
            Field::TideCoefficient => "similar tide coefficient",
            Field::MoonPhase => "same lunar phase",
            Field::Temperature => "similar temperature",
        }
    }

    fn value(&self, conditions: &Conditions) -> Option<f64> {
        match self {
            Field::WindSpeed => conditions.wind_speed,
            Field::WindDirection => conditions.wind_direction,
            Field::WaveHeight => conditions.wave_height,
            Field::TideCoefficient => conditions.tide_coefficient,
            Field::MoonPhase => conditions.moon_phase,
            Field::Temperature => conditions.temperature,
        }
    }
}

/// Maps the distance between two readings to a closeness in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Closeness {
    /// Linear decay from 1 at no difference to 0 at `max_difference`
    Linear { max_difference: f64 },
    /// Same decay over the modular distance on a circle of `period`
    Circular { period: f64, max_difference: f64 },
}

impl Closeness {
    /// Closeness of two readings.
    pub fn closeness(&self, a: f64, b: f64) -> f64 {
        let (distance, max_difference) = match *self {
            Closeness::Linear { max_difference } => ((a - b).abs(), max_difference),
            Closeness::Circular {
                period,
                max_difference,
            } => (circular_distance(a, b, period), max_difference),
        };
        (1.0 - distance / max_difference).clamp(0.0, 1.0)
    }

    fn validate(&self, field: Field) -> Result<(), ScoringConfigError> {
        let (period, max_difference) = match *self {
            Closeness::Linear { max_difference } => (None, max_difference),
            Closeness::Circular {
                period,
                max_difference,
            } => (Some(period), max_difference),
        };
        if !(max_difference.is_finite() && max_difference > 0.0) {
            return Err(ScoringConfigError::InvalidCurve {
                field: field.name(),
                reason: format!("max_difference must be positive, got {}", max_difference),
            });
        }
        if let Some(period) = period {
            if !(period.is_finite() && period > 0.0) {
                return Err(ScoringConfigError::InvalidCurve {
                    field: field.name(),
                    reason: format!("period must be positive, got {}", period),
                });
            }
        }
        Ok(())
    }
}

/// Shortest distance between two positions on a circle of `period`
pub fn circular_distance(a: f64, b: f64, period: f64) -> f64 {
    let d = (a - b).abs().rem_euclid(period);
    d.min(period - d)
}

/// How one field is weighted and judged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Relative importance; 0 disables the field
    pub weight: f64,
    /// Distance-to-closeness curve
    pub closeness: Closeness,
    /// Closeness at or above which the field is reported as a reason
    pub significant: f64,
}

impl FieldRule {
    const fn linear(weight: f64, max_difference: f64, significant: f64) -> Self {
        Self {
            weight,
            closeness: Closeness::Linear { max_difference },
            significant,
        }
    }

    const fn circular(weight: f64, period: f64, max_difference: f64, significant: f64) -> Self {
        Self {
            weight,
            closeness: Closeness::Circular {
                period,
                max_difference,
            },
            significant,
        }
    }
}

/// Tunable parameters of the similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub wind_speed: FieldRule,
    pub wind_direction: FieldRule,
    pub wave_height: FieldRule,
    pub tide_coefficient: FieldRule,
    pub moon_phase: FieldRule,
    pub temperature: FieldRule,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            wind_speed: FieldRule::linear(0.25, 30.0, 0.8),
            wind_direction: FieldRule::circular(0.20, 360.0, 90.0, 0.75),
            wave_height: FieldRule::linear(0.25, 1.5, 0.8),
            tide_coefficient: FieldRule::linear(0.10, 40.0, 0.8),
            moon_phase: FieldRule::circular(0.10, 1.0, 0.25, 0.8),
            temperature: FieldRule::linear(0.10, 8.0, 0.8),
        }
    }
}

impl ScoringConfig {
    /// The rule applied to `field`.
    pub fn rule(&self, field: Field) -> &FieldRule {
        match field {
            Field::WindSpeed => &self.wind_speed,
            Field::WindDirection => &self.wind_direction,
            Field::WaveHeight => &self.wave_height,
            Field::TideCoefficient => &self.tide_coefficient,
            Field::MoonPhase => &self.moon_phase,
            Field::Temperature => &self.temperature,
        }
    }

    /// Checks every rule for usable weights, curves and thresholds.
    pub fn validate(&self) -> Result<(), ScoringConfigError> {
        for &field in Field::all() {
            let rule = self.rule(field);
            if !(rule.weight.is_finite() && rule.weight >= 0.0) {
                return Err(ScoringConfigError::InvalidWeight {
                    field: field.name(),
                    value: rule.weight,
                });
            }
            rule.closeness.validate(field)?;
            if !(0.0..=1.0).contains(&rule.significant) {
                return Err(ScoringConfigError::InvalidThreshold {
                    field: field.name(),
                    value: rule.significant,
                });
            }
        }
        Ok(())
    }
}

/// A field that matched closely enough to explain a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchFactor {
    pub field: Field,
    /// Closeness of the two readings (0-1)
    pub closeness: f64,
}

impl MatchFactor {
    pub fn reason(&self) -> &'static str {
        self.field.reason()
    }
}

/// Result of comparing two condition snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    /// Weighted score in [0, 1]
    pub score: f64,
    /// Significant fields, strongest contribution first
    pub factors: Vec<MatchFactor>,
    /// Number of weighted fields present in both snapshots
    pub fields_compared: usize,
}

impl Similarity {
    /// True when at least one weighted field could be compared
    pub fn is_scoreable(&self) -> bool {
        self.fields_compared > 0
    }
}

/// Scores how closely `historical` resembles `current`.
///
/// Only fields present in both snapshots with a positive weight take part;
/// their weights are re-normalized so missing data narrows the comparison
/// instead of lowering the score. With no comparable field the score is 0
/// and `fields_compared` is 0.
pub fn similarity(
    current: &Conditions,
    historical: &Conditions,
    config: &ScoringConfig,
) -> Similarity {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut fields_compared = 0;
    let mut factors: Vec<(MatchFactor, f64)> = Vec::new();

    for &field in Field::all() {
        let rule = config.rule(field);
        if rule.weight <= 0.0 {
            continue;
        }
        let (Some(a), Some(b)) = (field.value(current), field.value(historical)) else {
            continue;
        };

        let closeness = rule.closeness.closeness(a, b);
        weighted_sum += closeness * rule.weight;
        total_weight += rule.weight;
        fields_compared += 1;

        if closeness >= rule.significant {
            factors.push((MatchFactor { field, closeness }, closeness * rule.weight));
        }
    }

    if fields_compared == 0 {
        return Similarity {
            score: 0.0,
            factors: Vec::new(),
            fields_compared: 0,
        };
    }

    factors.sort_by(|a, b| b.1.total_cmp(&a.1));

    Similarity {
        score: (weighted_sum / total_weight).clamp(0.0, 1.0),
        factors: factors.into_iter().map(|(factor, _)| factor).collect(),
        fields_compared,
    }
}
