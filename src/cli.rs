//! Command-line interface parsing for spearlog
//!
//! Defines the `solunar`, `match` and `outlook` subcommands with clap and
//! validates argument values (dates, coordinates, hours, scores) as they are
//! parsed.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use thiserror::Error;
use tracing::Level;

use crate::forecast::HOURS_PER_DAY;

/// Furthest day offset the forecast provider covers
pub const MAX_DAY_OFFSET: usize = 6;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// Date is not in YYYY-MM-DD form
    #[error("Invalid date: '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Latitude is not a number in [-90, 90]
    #[error("Invalid latitude: '{0}'. Expected a number between -90 and 90")]
    InvalidLatitude(String),

    /// Longitude is not a number in [-180, 180]
    #[error("Invalid longitude: '{0}'. Expected a number between -180 and 180")]
    InvalidLongitude(String),

    /// Hour is not in 0-23
    #[error("Invalid hour: '{0}'. Expected 0-23")]
    InvalidHour(String),

    /// Day offset is past the forecast horizon
    #[error("Invalid day: '{0}'. Expected 0-6 (days from today)")]
    InvalidDay(String),

    /// Score is not in [0, 1]
    #[error("Invalid score: '{0}'. Expected a number between 0 and 1")]
    InvalidScore(String),

    /// Result limit is not a positive whole number
    #[error("Invalid max results: '{0}'. Expected a whole number of at least 1")]
    InvalidMaxResults(String),
}

/// Spearlog - catch predictions from your dive log, the forecast and the moon
#[derive(Parser, Debug)]
#[command(name = "spearlog")]
#[command(about = "Match today's conditions against your spearfishing log")]
#[command(version)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read configuration from this JSON file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Log level selected by the -v flags
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show moon phase and solunar periods for a day
    Solunar(SolunarArgs),
    /// Find past dives whose conditions resemble a forecast hour
    Match(MatchArgs),
    /// Rate each forecast day against your log
    Outlook(OutlookArgs),
}

#[derive(Args, Debug)]
pub struct SolunarArgs {
    /// Day to compute (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Latitude of the spot
    #[arg(long, allow_negative_numbers = true, value_parser = parse_latitude_arg)]
    pub lat: f64,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Where and with what data to evaluate conditions
#[derive(Args, Debug)]
pub struct SpotArgs {
    /// Dive history JSON file
    #[arg(long, value_name = "FILE")]
    pub history: PathBuf,

    /// Latitude of the spot
    #[arg(long, allow_negative_numbers = true, value_parser = parse_latitude_arg)]
    pub lat: f64,

    /// Longitude of the spot
    #[arg(long, allow_negative_numbers = true, value_parser = parse_longitude_arg)]
    pub lon: f64,

    /// Only compare with dives logged at this location
    #[arg(long, value_name = "ID")]
    pub location: Option<String>,

    /// Read the forecast from this JSON file instead of Open-Meteo
    #[arg(long, value_name = "FILE")]
    pub forecast: Option<PathBuf>,

    /// Tide high/low events JSON file
    #[arg(long, value_name = "FILE")]
    pub tides: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    #[command(flatten)]
    pub spot: SpotArgs,

    /// Days from the start of the forecast (0-6)
    #[arg(long, default_value_t = 0, value_parser = parse_day_arg)]
    pub day: usize,

    /// Hour of day (defaults to the current hour)
    #[arg(long, value_parser = parse_hour_arg)]
    pub hour: Option<usize>,

    /// Minimum similarity to report (overrides config)
    #[arg(long, value_parser = parse_score_arg)]
    pub min_score: Option<f64>,

    /// Maximum number of dives to report (overrides config)
    #[arg(long, value_parser = parse_max_results_arg)]
    pub max_results: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct OutlookArgs {
    #[command(flatten)]
    pub spot: SpotArgs,

    /// Hour of day to evaluate on each day
    #[arg(long, default_value_t = 7, value_parser = parse_hour_arg)]
    pub hour: usize,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Parses a YYYY-MM-DD date argument.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Parses a latitude in decimal degrees.
pub fn parse_latitude_arg(s: &str) -> Result<f64, CliError> {
    parse_in_range(s, -90.0, 90.0).ok_or_else(|| CliError::InvalidLatitude(s.to_string()))
}

/// Parses a longitude in decimal degrees.
pub fn parse_longitude_arg(s: &str) -> Result<f64, CliError> {
    parse_in_range(s, -180.0, 180.0).ok_or_else(|| CliError::InvalidLongitude(s.to_string()))
}

/// Parses an hour of the day.
pub fn parse_hour_arg(s: &str) -> Result<usize, CliError> {
    s.trim()
        .parse::<usize>()
        .ok()
        .filter(|h| *h < HOURS_PER_DAY)
        .ok_or_else(|| CliError::InvalidHour(s.to_string()))
}

/// Parses a forecast day offset.
pub fn parse_day_arg(s: &str) -> Result<usize, CliError> {
    s.trim()
        .parse::<usize>()
        .ok()
        .filter(|d| *d <= MAX_DAY_OFFSET)
        .ok_or_else(|| CliError::InvalidDay(s.to_string()))
}

/// Parses a similarity score threshold.
pub fn parse_score_arg(s: &str) -> Result<f64, CliError> {
    parse_in_range(s, 0.0, 1.0).ok_or_else(|| CliError::InvalidScore(s.to_string()))
}

/// Parses a result limit, which must be at least 1.
pub fn parse_max_results_arg(s: &str) -> Result<usize, CliError> {
    s.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| CliError::InvalidMaxResults(s.to_string()))
}

fn parse_in_range(s: &str, min: f64, max: f64) -> Option<f64> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && (min..=max).contains(v))
}
