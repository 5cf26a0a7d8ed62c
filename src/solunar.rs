//! Solunar calculator
//!
//! Computes the moon phase and the four daily solunar windows (two major,
//! two minor) for a date and latitude. The moonrise/moonset model is a
//! deliberate approximation for "best time to fish" heuristics, not an
//! ephemeris: expect windows to drift by tens of minutes against real
//! moon times.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Mean length of the synodic month in days
pub const SYNODIC_MONTH_DAYS: f64 = 29.53;

/// Baseline hour the moonrise model is anchored on
const MOONRISE_BASELINE_HOURS: f64 = 6.0;

/// Largest latitude correction applied to moonrise, reached at the poles
const MAX_LATITUDE_CORRECTION_HOURS: f64 = 1.5;

/// Half of a lunar day: moonset follows moonrise by this much
const HALF_LUNAR_DAY_HOURS: f64 = 12.4;

const MAJOR_PERIOD_MINUTES: i64 = 120;
const MINOR_PERIOD_MINUTES: i64 = 60;

/// Reference new moon: 2000-01-06 18:14 UTC
fn reference_new_moon() -> NaiveDateTime {
    Utc.with_ymd_and_hms(2000, 1, 6, 18, 14, 0)
        .single()
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

/// Named moon phases, one per eighth of the synodic month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    /// Returns all phases in cycle order, starting at new moon.
    pub fn all() -> &'static [MoonPhase] {
        &[
            MoonPhase::New,
            MoonPhase::WaxingCrescent,
            MoonPhase::FirstQuarter,
            MoonPhase::WaxingGibbous,
            MoonPhase::Full,
            MoonPhase::WaningGibbous,
            MoonPhase::LastQuarter,
            MoonPhase::WaningCrescent,
        ]
    }

    /// Maps a phase fraction to its bucket: floor(phase * 8), clamped to 7.
    pub fn from_fraction(phase: f64) -> MoonPhase {
        let index = (phase * 8.0).floor().clamp(0.0, 7.0) as usize;
        Self::all()[index]
    }

    /// Returns a human-readable display label.
    pub fn label(&self) -> &'static str {
        match self {
            MoonPhase::New => "New moon",
            MoonPhase::WaxingCrescent => "Waxing crescent",
            MoonPhase::FirstQuarter => "First quarter",
            MoonPhase::WaxingGibbous => "Waxing gibbous",
            MoonPhase::Full => "Full moon",
            MoonPhase::WaningGibbous => "Waning gibbous",
            MoonPhase::LastQuarter => "Last quarter",
            MoonPhase::WaningCrescent => "Waning crescent",
        }
    }
}

/// Major periods bracket lunar transit; minor periods bracket rise and set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Major,
    Minor,
}

/// A window of expected fish activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolunarPeriod {
    /// Major (2h) or minor (1h)
    pub kind: PeriodKind,
    /// Lunar event the window is centered on
    pub label: String,
    /// Local start of the window
    pub start: NaiveDateTime,
    /// Local end of the window, possibly on the following day
    pub end: NaiveDateTime,
}

impl SolunarPeriod {
    /// Length of the window
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Everything the calculator knows about one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolunarDay {
    pub date: NaiveDate,
    pub moon_phase: f64,
    pub phase: MoonPhase,
    pub moonrise: NaiveTime,
    pub moonset: NaiveTime,
    pub periods: [SolunarPeriod; 4],
}

/// Moon phase at an instant as a fraction in [0, 1).
pub fn moon_phase(at: NaiveDateTime) -> f64 {
    let elapsed = at - reference_new_moon();
    let days = elapsed.num_seconds() as f64 / 86_400.0;
    let phase = days.rem_euclid(SYNODIC_MONTH_DAYS) / SYNODIC_MONTH_DAYS;
    // rem_euclid can round up to the divisor for tiny negative inputs
    if phase >= 1.0 {
        0.0
    } else {
        phase
    }
}

/// Named phase at an instant.
pub fn moon_phase_label(at: NaiveDateTime) -> MoonPhase {
    MoonPhase::from_fraction(moon_phase(at))
}

/// Moon phase used for a whole calendar day (evaluated at local noon).
pub fn day_moon_phase(date: NaiveDate) -> f64 {
    moon_phase(date.and_time(noon()))
}

/// The four solunar windows for a date, sorted by start.
pub fn solunar_periods(date: NaiveDate, latitude: f64) -> [SolunarPeriod; 4] {
    let (moonrise, moonset) = moon_times(day_moon_phase(date), latitude);
    build_periods(date, moonrise, moonset)
}

/// Moon phase, moon times and solunar windows for a date.
pub fn solunar_day(date: NaiveDate, latitude: f64) -> SolunarDay {
    let phase = day_moon_phase(date);
    let (moonrise, moonset) = moon_times(phase, latitude);

    SolunarDay {
        date,
        moon_phase: phase,
        phase: MoonPhase::from_fraction(phase),
        moonrise: hours_to_time(moonrise),
        moonset: hours_to_time(moonset),
        periods: build_periods(date, moonrise, moonset),
    }
}

/// Approximate moonrise and moonset as fractional hours in [0, 24).
fn moon_times(phase: f64, latitude: f64) -> (f64, f64) {
    let lunar_offset = phase * 24.0;
    let latitude_correction = MAX_LATITUDE_CORRECTION_HOURS * (latitude.clamp(-90.0, 90.0) / 90.0);
    let moonrise = (MOONRISE_BASELINE_HOURS + lunar_offset + latitude_correction).rem_euclid(24.0);
    let moonset = (moonrise + HALF_LUNAR_DAY_HOURS).rem_euclid(24.0);
    (moonrise, moonset)
}

fn build_periods(date: NaiveDate, moonrise: f64, moonset: f64) -> [SolunarPeriod; 4] {
    // Transit sits halfway along the arc from rise to set, not at the
    // arithmetic mean of the two clock times.
    let transit = moonrise + HALF_LUNAR_DAY_HOURS / 2.0;
    let nadir = transit + 12.0;

    let mut periods = [
        centered_period(date, PeriodKind::Major, "Moon overhead", transit, MAJOR_PERIOD_MINUTES),
        centered_period(date, PeriodKind::Major, "Moon underfoot", nadir, MAJOR_PERIOD_MINUTES),
        centered_period(date, PeriodKind::Minor, "Moonrise", moonrise, MINOR_PERIOD_MINUTES),
        centered_period(date, PeriodKind::Minor, "Moonset", moonset, MINOR_PERIOD_MINUTES),
    ];
    periods.sort_by_key(|p| p.start);
    periods
}

/// Builds a window centered on `center_hours`, with its start wrapped into
/// the requested day.
fn centered_period(
    date: NaiveDate,
    kind: PeriodKind,
    label: &str,
    center_hours: f64,
    length_minutes: i64,
) -> SolunarPeriod {
    let start_minutes = (center_hours * 60.0 - length_minutes as f64 / 2.0)
        .round()
        .rem_euclid(24.0 * 60.0) as i64;
    let start = date.and_time(NaiveTime::MIN) + Duration::minutes(start_minutes);

    SolunarPeriod {
        kind,
        label: label.to_string(),
        start,
        end: start + Duration::minutes(length_minutes),
    }
}

fn hours_to_time(hours: f64) -> NaiveTime {
    let minutes = (hours * 60.0).round().rem_euclid(24.0 * 60.0) as u32;
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}
