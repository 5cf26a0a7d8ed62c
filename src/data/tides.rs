//! Tide helpers
//!
//! Works on the high/low water events supplied by a tide provider: tide
//! state and height at an instant, the next high and low, and the daily tide
//! coefficient used by the matching engine. When no events cover a day the
//! coefficient falls back to a spring/neap estimate from the moon phase.

use std::fs;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{TideEvent, TideKind};
use crate::solunar;

/// Lowest coefficient on the conventional scale
pub const MIN_TIDE_COEFFICIENT: f64 = 20.0;

/// Highest coefficient on the conventional scale
pub const MAX_TIDE_COEFFICIENT: f64 = 120.0;

/// Time either side of an extreme that still counts as high or low water
const SLACK_WINDOW_MINUTES: i64 = 30;

/// Errors that can occur when loading tide events
#[derive(Debug, Error)]
pub enum TidesError {
    /// Tide file could not be read
    #[error("Failed to read tide file: {0}")]
    Io(#[from] std::io::Error),

    /// Tide file is not a JSON list of events
    #[error("Failed to parse tide file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Current state of the tide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideState {
    Rising,
    Falling,
    High,
    Low,
}

impl TideState {
    pub fn label(&self) -> &'static str {
        match self {
            TideState::Rising => "rising",
            TideState::Falling => "falling",
            TideState::High => "high water",
            TideState::Low => "low water",
        }
    }
}

/// Interpolated tide at an instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TideReading {
    pub state: TideState,
    /// Height in meters
    pub height: f64,
}

/// Loads tide events from a JSON file, sorted by time.
pub fn load_tide_events(path: &Path) -> Result<Vec<TideEvent>, TidesError> {
    let content = fs::read_to_string(path)?;
    let mut events: Vec<TideEvent> = serde_json::from_str(&content)?;
    events.sort_by_key(|e| e.time);
    debug!(count = events.len(), path = %path.display(), "Loaded tide events");
    Ok(events)
}

/// Last event at or before `at` and first event after it.
///
/// `events` must be sorted by time.
fn surrounding_events(
    events: &[TideEvent],
    at: NaiveDateTime,
) -> (Option<&TideEvent>, Option<&TideEvent>) {
    let split = events.partition_point(|e| e.time <= at);
    let prev = split.checked_sub(1).and_then(|i| events.get(i));
    (prev, events.get(split))
}

/// Tide state and height at `at`, interpolated between the surrounding
/// extremes with a cosine curve. `None` unless events bracket `at`.
pub fn tide_at(events: &[TideEvent], at: NaiveDateTime) -> Option<TideReading> {
    let (Some(prev), Some(next)) = surrounding_events(events, at) else {
        return None;
    };

    let total = (next.time - prev.time).num_seconds() as f64;
    let elapsed = (at - prev.time).num_seconds() as f64;
    let progress = if total > 0.0 {
        (elapsed / total).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let eased = (1.0 - (progress * std::f64::consts::PI).cos()) / 2.0;
    let height = prev.height + (next.height - prev.height) * eased;

    let slack = Duration::minutes(SLACK_WINDOW_MINUTES);
    let state = if at - prev.time <= slack {
        extreme_state(prev.kind)
    } else if next.time - at <= slack {
        extreme_state(next.kind)
    } else if next.height >= prev.height {
        TideState::Rising
    } else {
        TideState::Falling
    };

    Some(TideReading { state, height })
}

fn extreme_state(kind: TideKind) -> TideState {
    match kind {
        TideKind::High => TideState::High,
        TideKind::Low => TideState::Low,
    }
}

/// First high and first low water strictly after `at`.
pub fn next_high_low(
    events: &[TideEvent],
    at: NaiveDateTime,
) -> (Option<&TideEvent>, Option<&TideEvent>) {
    let upcoming = || events.iter().filter(move |e| e.time > at);
    let next_high = upcoming().find(|e| e.kind == TideKind::High);
    let next_low = upcoming().find(|e| e.kind == TideKind::Low);
    (next_high, next_low)
}

/// Tide coefficient for `date` from its event list.
///
/// The day's largest range between consecutive high and low waters, as a
/// percentage of `mean_spring_range`, clamped to the 20-120 scale. `None`
/// when the day has no consecutive high/low pair.
pub fn tide_coefficient(
    events: &[TideEvent],
    date: NaiveDate,
    mean_spring_range: f64,
) -> Option<f64> {
    if mean_spring_range <= 0.0 {
        return None;
    }

    let day: Vec<&TideEvent> = events.iter().filter(|e| e.time.date() == date).collect();
    let range = day
        .windows(2)
        .filter(|pair| pair[0].kind != pair[1].kind)
        .map(|pair| (pair[0].height - pair[1].height).abs())
        .fold(None, |max: Option<f64>, r| Some(max.map_or(r, |m| m.max(r))))?;

    Some((range / mean_spring_range * 100.0).clamp(MIN_TIDE_COEFFICIENT, MAX_TIDE_COEFFICIENT))
}

/// Spring/neap estimate of the tide coefficient from the moon phase.
///
/// Peaks at 115 around new and full moon and bottoms out at 25 at the
/// quarters.
pub fn estimate_tide_coefficient(moon_phase: f64) -> f64 {
    70.0 + 45.0 * (4.0 * std::f64::consts::PI * moon_phase).cos()
}

/// Coefficient for a day: from the events when they cover it, otherwise
/// estimated from that day's moon phase.
pub fn day_tide_coefficient(events: &[TideEvent], date: NaiveDate, mean_spring_range: f64) -> f64 {
    tide_coefficient(events, date, mean_spring_range)
        .unwrap_or_else(|| estimate_tide_coefficient(solunar::day_moon_phase(date)))
}
