//! Plain-text rendering of engine results
//!
//! Turns solunar days, match results and outlooks into the text printed by
//! the command-line front end. JSON output serializes the same report
//! structs directly.

use std::fmt::Write;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::data::tides::TideReading;
use crate::data::{Catch, Conditions};
use crate::matcher::{CatchMatch, DayOutlook};
use crate::solunar::{MoonPhase, PeriodKind, SolunarDay, SolunarPeriod};

/// Everything shown for one `match` query
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport<'a> {
    /// Forecast slot the conditions come from
    pub at: NaiveDateTime,
    pub location: Option<&'a str>,
    /// `None` when the forecast has no data for the slot
    pub conditions: Option<Conditions>,
    pub tide: Option<TideReading>,
    pub solunar: SolunarDay,
    pub matches: Vec<CatchMatch<'a>>,
}

/// Renders a solunar day.
pub fn render_solunar(day: &SolunarDay) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Solunar for {}", day.date.format("%A %d %B %Y"));
    let _ = writeln!(
        out,
        "Moon: {} ({:.0}% through cycle)",
        day.phase.label(),
        day.moon_phase * 100.0
    );
    let _ = writeln!(
        out,
        "Moonrise ~{}  Moonset ~{}",
        day.moonrise.format("%H:%M"),
        day.moonset.format("%H:%M")
    );
    out.push_str(&render_periods(&day.periods));
    out
}

fn render_periods(periods: &[SolunarPeriod]) -> String {
    let mut out = String::new();
    for period in periods {
        let kind = match period.kind {
            PeriodKind::Major => "Major",
            PeriodKind::Minor => "Minor",
        };
        let next_day = if period.end.date() > period.start.date() {
            " (+1)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {:<5} {}-{}{}  {}",
            kind,
            period.start.format("%H:%M"),
            period.end.format("%H:%M"),
            next_day,
            period.label
        );
    }
    out
}

/// Renders the conditions that were compared, skipping unknown fields.
pub fn render_conditions(conditions: &Conditions) -> String {
    let mut parts = Vec::new();
    if let Some(t) = conditions.temperature {
        parts.push(format!("{:.1}°C", t));
    }
    match (conditions.wind_speed, conditions.wind_direction) {
        (Some(speed), Some(dir)) => {
            parts.push(format!("wind {:.0} km/h from {}", speed, compass_point(dir)))
        }
        (Some(speed), None) => parts.push(format!("wind {:.0} km/h", speed)),
        (None, Some(dir)) => parts.push(format!("wind from {}", compass_point(dir))),
        (None, None) => {}
    }
    match (conditions.wave_height, conditions.wave_period) {
        (Some(h), Some(p)) => parts.push(format!("waves {:.1} m @ {:.0}s", h, p)),
        (Some(h), None) => parts.push(format!("waves {:.1} m", h)),
        _ => {}
    }
    if let Some(c) = conditions.tide_coefficient {
        parts.push(format!("tide coef {:.0}", c));
    }
    if let Some(phase) = conditions.moon_phase {
        parts.push(MoonPhase::from_fraction(phase).label().to_lowercase());
    }

    if parts.is_empty() {
        "no data".to_string()
    } else {
        parts.join(", ")
    }
}

/// 16-point compass name for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
        "NNW",
    ];
    let index = ((degrees.rem_euclid(360.0) / 22.5).round() as usize) % POINTS.len();
    POINTS[index]
}

fn render_catches(catches: &[Catch]) -> String {
    if catches.is_empty() {
        return "no catch logged".to_string();
    }
    catches
        .iter()
        .map(|c| match c.weight_kg {
            Some(w) => format!("{} ({:.1} kg)", c.species, w),
            None => c.species.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the result of a `match` query.
pub fn render_matches(report: &MatchReport<'_>) -> String {
    let mut out = String::new();
    let _ = write!(out, "Conditions for {}", report.at.format("%a %d %b %H:%M"));
    if let Some(location) = report.location {
        let _ = write!(out, " at {}", location);
    }
    out.push('\n');

    let Some(conditions) = &report.conditions else {
        out.push_str("  No forecast data for this hour.\n");
        return out;
    };
    let _ = writeln!(out, "  {}", render_conditions(conditions));
    if let Some(tide) = &report.tide {
        let _ = writeln!(out, "  Tide {} ({:.1} m)", tide.state.label(), tide.height);
    }
    out.push_str(&render_periods(&report.solunar.periods));
    out.push('\n');

    if report.matches.is_empty() {
        out.push_str("No past dive matches these conditions.\n");
        return out;
    }

    let _ = writeln!(out, "Last time conditions were like this:");
    for m in &report.matches {
        let _ = write!(
            out,
            "  {:>3.0}%  {}  {}  {}",
            m.score * 100.0,
            m.dive.date,
            m.dive.location_id,
            render_catches(&m.dive.catches)
        );
        let total = m.dive.total_weight_kg();
        if m.dive.catches.len() > 1 && total > 0.0 {
            let _ = write!(out, "  [{:.1} kg total]", total);
        }
        out.push('\n');
        if !m.factors.is_empty() {
            let _ = writeln!(out, "        {}", m.reasons().join(", "));
        }
    }
    out
}

/// Renders a multi-day outlook, one line per day.
pub fn render_outlook(days: &[DayOutlook]) -> String {
    if days.is_empty() {
        return "No forecast days available.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Outlook at {:02}:00", days[0].hour);
    for day in days {
        let majors: Vec<String> = day
            .solunar
            .iter()
            .filter(|p| p.kind == PeriodKind::Major)
            .map(|p| p.start.format("%H:%M").to_string())
            .collect();

        let verdict = match (day.best_score, day.best_dive_date) {
            (Some(score), Some(date)) => format!(
                "{:>3.0}% like {} ({}), {} match{}",
                score * 100.0,
                date,
                render_catches(&day.best_catches),
                day.match_count,
                if day.match_count == 1 { "" } else { "es" }
            ),
            _ if day.conditions.is_none() => "no forecast".to_string(),
            _ => "no similar dive".to_string(),
        };

        let _ = writeln!(
            out,
            "  {}  majors {}  {}",
            day.date.format("%a %d %b"),
            majors.join("/"),
            verdict
        );
    }
    out
}
