//! Match finder and day outlook
//!
//! Ranks a fisher's past dives by how closely their logged conditions
//! resemble the current ones, and rolls that up into a per-day outlook over
//! the forecast horizon.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::data::{tides, Catch, Conditions, HistoricalDive, TideEvent};
use crate::forecast::{snapshot_at, Forecast};
use crate::similarity::{similarity, MatchFactor, ScoringConfig};
use crate::solunar::{self, SolunarPeriod};

/// Default minimum score for a dive to count as a match
pub const DEFAULT_MIN_SCORE: f64 = 0.6;

/// Default number of matches returned
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// A past dive that resembles the current conditions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchMatch<'a> {
    /// The matched dive, including its catches
    pub dive: &'a HistoricalDive,
    /// Similarity score in [0, 1]
    pub score: f64,
    /// Fields that explain the match, strongest first
    pub factors: Vec<MatchFactor>,
}

impl CatchMatch<'_> {
    /// Human-readable reasons for the match
    pub fn reasons(&self) -> Vec<&'static str> {
        self.factors.iter().map(MatchFactor::reason).collect()
    }
}

/// Scores and ranks dive histories against current conditions
#[derive(Debug, Clone)]
pub struct MatchFinder {
    pub config: ScoringConfig,
    pub min_score: f64,
    pub max_results: usize,
}

impl Default for MatchFinder {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
            min_score: DEFAULT_MIN_SCORE,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl MatchFinder {
    /// `config` must pass [`ScoringConfig::validate`]: a zero max difference
    /// or period makes every closeness NaN and no dive would match.
    pub fn new(config: ScoringConfig, min_score: f64, max_results: usize) -> Self {
        debug_assert!(config.validate().is_ok(), "unvalidated scoring config");
        Self {
            config,
            min_score,
            max_results,
        }
    }

    /// Ranks the dives in `history` that resemble `current`.
    ///
    /// When `location` is given only dives logged at that location are
    /// scored. Dives without conditions, or sharing no scored field with
    /// `current`, are skipped. Results are sorted by score, most recent
    /// first on ties, and truncated to `max_results`.
    #[instrument(level = "debug", skip_all, fields(history = history.len(), location = ?location))]
    pub fn find_matches<'a>(
        &self,
        current: &Conditions,
        location: Option<&str>,
        history: &'a [HistoricalDive],
    ) -> Vec<CatchMatch<'a>> {
        let location = location.map(|l| l.trim().to_lowercase());

        let mut matches: Vec<CatchMatch<'a>> = history
            .iter()
            .filter(|dive| match &location {
                Some(wanted) => dive.location_id.trim().to_lowercase() == *wanted,
                None => true,
            })
            .filter_map(|dive| {
                let Some(logged) = dive.conditions.as_ref() else {
                    debug!(date = %dive.date, "Skipping dive without conditions");
                    return None;
                };
                let result = similarity(current, logged, &self.config);
                if !result.is_scoreable() {
                    debug!(date = %dive.date, "Skipping dive with no comparable conditions");
                    return None;
                }
                Some(CatchMatch {
                    dive,
                    score: result.score,
                    factors: result.factors,
                })
            })
            .filter(|m| m.score >= self.min_score)
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.dive.date.cmp(&a.dive.date))
        });
        matches.truncate(self.max_results);

        debug!(matches = matches.len(), "Match search complete");
        matches
    }
}

/// Ranks `history` against `current` with the default scoring parameters
/// and no location filter.
pub fn find_matches<'a>(
    current: &Conditions,
    history: &'a [HistoricalDive],
    min_score: f64,
    max_results: usize,
) -> Vec<CatchMatch<'a>> {
    MatchFinder::new(ScoringConfig::default(), min_score, max_results)
        .find_matches(current, None, history)
}

/// Parameters for a multi-day outlook
#[derive(Debug, Clone)]
pub struct OutlookRequest<'a> {
    /// Hour of day to evaluate on every forecast day
    pub hour: usize,
    /// Latitude of the spot, for the solunar windows
    pub latitude: f64,
    /// Restrict matches to this location
    pub location: Option<&'a str>,
    /// Tide events covering the forecast, if known
    pub tide_events: &'a [TideEvent],
    /// Mean spring tide range used to scale tide coefficients
    pub mean_spring_range: f64,
}

/// How one forecast day compares with the fisher's history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOutlook {
    pub date: NaiveDate,
    pub day_offset: usize,
    pub hour: usize,
    /// Conditions at the chosen hour; `None` beyond the forecast horizon
    pub conditions: Option<Conditions>,
    pub match_count: usize,
    pub best_score: Option<f64>,
    /// Date of the best-matching past dive
    pub best_dive_date: Option<NaiveDate>,
    /// What was caught on the best-matching past dive
    pub best_catches: Vec<Catch>,
    pub solunar: [SolunarPeriod; 4],
}

/// Conditions at (`day_offset`, `hour`) of the forecast, completed with the
/// moon phase at that instant and the day's tide coefficient.
pub fn conditions_at(
    forecast: &Forecast,
    day_offset: usize,
    hour: usize,
    tide_events: &[TideEvent],
    mean_spring_range: f64,
) -> Option<Conditions> {
    let snapshot = snapshot_at(forecast, day_offset, hour)?;
    let time = snapshot.weather.time?;
    let moon_phase = solunar::moon_phase(time);
    let tide_coefficient = tides::day_tide_coefficient(tide_events, time.date(), mean_spring_range);
    Some(snapshot.to_conditions(Some(moon_phase), Some(tide_coefficient)))
}

/// Evaluates every forecast day at `request.hour` against the history.
pub fn outlook(
    forecast: &Forecast,
    history: &[HistoricalDive],
    request: &OutlookRequest<'_>,
    finder: &MatchFinder,
) -> Vec<DayOutlook> {
    let Some(start) = forecast.start_date() else {
        return Vec::new();
    };

    (0..forecast.days())
        .map(|day_offset| {
            let date = start + Duration::days(day_offset as i64);
            let conditions = conditions_at(
                forecast,
                day_offset,
                request.hour,
                request.tide_events,
                request.mean_spring_range,
            );
            let matches = conditions
                .as_ref()
                .map(|c| finder.find_matches(c, request.location, history))
                .unwrap_or_default();
            let best = matches.first();

            DayOutlook {
                date,
                day_offset,
                hour: request.hour,
                conditions,
                match_count: matches.len(),
                best_score: best.map(|m| m.score),
                best_dive_date: best.map(|m| m.dive.date),
                best_catches: best.map(|m| m.dive.catches.clone()).unwrap_or_default(),
                solunar: solunar::solunar_periods(date, request.latitude),
            }
        })
        .collect()
}
