//! Application glue
//!
//! Resolves each subcommand's inputs (config, dive history, forecast, tide
//! events), runs the engine and renders the report.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveTime, Timelike};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::CacheManager;
use crate::cli::{Command, MatchArgs, OutlookArgs, SolunarArgs, SpotArgs};
use crate::config::{AppConfig, ConfigError};
use crate::data::tides::{self, load_tide_events};
use crate::data::{
    load_history, ForecastClient, ForecastError, HistoricalDive, HistoryError, TideEvent,
    TidesError,
};
use crate::forecast::Forecast;
use crate::matcher::{self, MatchFinder, OutlookRequest};
use crate::report::{self, MatchReport};
use crate::solunar;

/// Errors surfaced to the user by a subcommand
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Tides(#[from] TidesError),

    /// Offline forecast file could not be read
    #[error("Failed to read forecast file {path}: {source}")]
    ForecastFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Offline forecast file is not a serialized forecast
    #[error("Failed to parse forecast file {path}: {source}")]
    ForecastFileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Report could not be serialized
    #[error("Failed to write JSON output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Runs subcommands against one configuration
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    forecast_client: ForecastClient,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let cache = if config.forecast.disable_cache {
            None
        } else {
            CacheManager::new()
        };
        match &cache {
            Some(cache) => debug!(dir = %cache.dir().display(), "Forecast cache enabled"),
            None => debug!("Forecast cache disabled"),
        }
        let ttl = Duration::hours(i64::from(config.forecast.cache_ttl_hours));
        Self {
            forecast_client: ForecastClient::new(cache, ttl)
                .with_base_urls(&config.forecast.weather_url, &config.forecast.marine_url),
            config,
        }
    }

    /// Runs `command` and returns the text to print.
    pub async fn run(&self, command: &Command) -> Result<String, AppError> {
        match command {
            Command::Solunar(args) => self.run_solunar(args),
            Command::Match(args) => self.run_match(args).await,
            Command::Outlook(args) => self.run_outlook(args).await,
        }
    }

    fn run_solunar(&self, args: &SolunarArgs) -> Result<String, AppError> {
        let date = args.date.unwrap_or_else(|| Local::now().date_naive());
        let day = solunar::solunar_day(date, args.lat);

        if args.json {
            return Ok(serde_json::to_string_pretty(&day)?);
        }
        Ok(report::render_solunar(&day))
    }

    async fn run_match(&self, args: &MatchArgs) -> Result<String, AppError> {
        let spot = &args.spot;
        let history = load_history(&spot.history)?;
        debug!(dives = history.len(), scoreable = scoreable_dives(&history), "Loaded dive history");
        let tide_events = load_tides(spot)?;
        let forecast = self.load_forecast(spot).await?;

        let start = forecast.start_date().unwrap_or_else(|| Local::now().date_naive());
        let date = start + Duration::days(args.day as i64);
        let hour = args.hour.unwrap_or_else(|| Local::now().hour() as usize);
        let at = date.and_time(NaiveTime::MIN) + Duration::hours(hour as i64);

        let mut finder = self.config.match_finder();
        if let Some(min_score) = args.min_score {
            finder.min_score = min_score;
        }
        if let Some(max_results) = args.max_results {
            finder.max_results = max_results;
        }

        let conditions = matcher::conditions_at(
            &forecast,
            args.day,
            hour,
            &tide_events,
            self.config.tides.mean_spring_range_m,
        );
        let matches = match &conditions {
            Some(current) => finder.find_matches(current, spot.location.as_deref(), &history),
            None => {
                info!(day = args.day, hour, "No forecast data for the requested slot");
                Vec::new()
            }
        };

        let report = MatchReport {
            at,
            location: spot.location.as_deref(),
            conditions,
            tide: tides::tide_at(&tide_events, at),
            solunar: solunar::solunar_day(date, spot.lat),
            matches,
        };

        if args.json {
            return Ok(serde_json::to_string_pretty(&report)?);
        }
        Ok(report::render_matches(&report))
    }

    async fn run_outlook(&self, args: &OutlookArgs) -> Result<String, AppError> {
        let spot = &args.spot;
        let history = load_history(&spot.history)?;
        let tide_events = load_tides(spot)?;
        let forecast = self.load_forecast(spot).await?;

        let request = OutlookRequest {
            hour: args.hour,
            latitude: spot.lat,
            location: spot.location.as_deref(),
            tide_events: &tide_events,
            mean_spring_range: self.config.tides.mean_spring_range_m,
        };
        let finder: MatchFinder = self.config.match_finder();
        let days = matcher::outlook(&forecast, &history, &request, &finder);

        if args.json {
            return Ok(serde_json::to_string_pretty(&days)?);
        }
        Ok(report::render_outlook(&days))
    }

    async fn load_forecast(&self, spot: &SpotArgs) -> Result<Forecast, AppError> {
        match &spot.forecast {
            Some(path) => read_forecast_file(path),
            None => Ok(self.forecast_client.fetch_forecast(spot.lat, spot.lon).await?),
        }
    }
}

fn load_tides(spot: &SpotArgs) -> Result<Vec<TideEvent>, AppError> {
    match &spot.tides {
        Some(path) => Ok(load_tide_events(path)?),
        None => Ok(Vec::new()),
    }
}

/// Reads a forecast previously serialized as JSON.
pub fn read_forecast_file(path: &Path) -> Result<Forecast, AppError> {
    let content = fs::read_to_string(path).map_err(|source| AppError::ForecastFile {
        path: path.to_path_buf(),
        source,
    })?;
    let forecast: Forecast =
        serde_json::from_str(&content).map_err(|source| AppError::ForecastFileParse {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(hours = forecast.weather.time.len(), path = %path.display(), "Loaded forecast file");
    Ok(forecast)
}

/// Number of dives in `history` that carry conditions.
pub fn scoreable_dives(history: &[HistoricalDive]) -> usize {
    history.iter().filter(|d| d.conditions.is_some()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::forecast::tests::sample_forecast;
    use clap::Parser;
    use tempfile::TempDir;

    const HISTORY: &str = r#"[
        {
            "date": "2026-06-14",
            "location_id": "calanques",
            "conditions": {"wind_speed": 7.0, "wind_direction": 105.0, "wave_height": 0.07, "temperature": 10.7},
            "catches": [{"species": "Sea bream", "weight_kg": 1.4}]
        },
        {
            "date": "2026-07-02",
            "location_id": "calanques",
            "catches": [{"species": "Octopus"}]
        }
    ]"#;

    struct Fixture {
        _dir: TempDir,
        history: PathBuf,
        forecast: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let history = dir.path().join("dives.json");
        let forecast = dir.path().join("forecast.json");
        fs::write(&history, HISTORY).unwrap();
        fs::write(&forecast, serde_json::to_string(&sample_forecast(168, 168)).unwrap()).unwrap();
        Fixture {
            _dir: dir,
            history,
            forecast,
        }
    }

    fn app() -> App {
        let mut config = AppConfig::default();
        config.forecast.disable_cache = true;
        App::new(config)
    }

    fn parse(args: &[&str]) -> Command {
        Cli::parse_from(args).command
    }

    #[tokio::test]
    async fn test_match_against_offline_forecast() {
        let f = fixture();
        let command = parse(&[
            "spearlog",
            "match",
            "--history",
            f.history.to_str().unwrap(),
            "--forecast",
            f.forecast.to_str().unwrap(),
            "--lat",
            "43.2",
            "--lon",
            "5.4",
            "--hour",
            "7",
            "--min-score",
            "0.5",
        ]);

        let text = app().run(&command).await.expect("Match should run");
        assert!(text.contains("Conditions for Fri 16 Oct 07:00"), "{}", text);
        assert!(text.contains("Sea bream"), "{}", text);
    }

    #[tokio::test]
    async fn test_match_json_output() {
        let f = fixture();
        let command = parse(&[
            "spearlog",
            "match",
            "--history",
            f.history.to_str().unwrap(),
            "--forecast",
            f.forecast.to_str().unwrap(),
            "--lat",
            "43.2",
            "--lon",
            "5.4",
            "--hour",
            "7",
            "--min-score",
            "0",
            "--json",
        ]);

        let text = app().run(&command).await.expect("Match should run");
        let value: serde_json::Value = serde_json::from_str(&text).expect("Output should be JSON");
        assert_eq!(value["matches"].as_array().map(|m| m.len()), Some(1));
        assert_eq!(value["solunar"]["periods"].as_array().map(|p| p.len()), Some(4));
    }

    #[tokio::test]
    async fn test_outlook_against_offline_forecast() {
        let f = fixture();
        let command = parse(&[
            "spearlog",
            "outlook",
            "--history",
            f.history.to_str().unwrap(),
            "--forecast",
            f.forecast.to_str().unwrap(),
            "--lat",
            "43.2",
            "--lon",
            "5.4",
        ]);

        let text = app().run(&command).await.expect("Outlook should run");
        assert!(text.starts_with("Outlook at 07:00"));
        assert_eq!(text.lines().count(), 8);
    }

    #[tokio::test]
    async fn test_solunar_json_output() {
        let command = parse(&[
            "spearlog",
            "solunar",
            "--date",
            "2026-10-16",
            "--lat",
            "43.2",
            "--json",
        ]);
        let text = app().run(&command).await.expect("Solunar should run");
        let value: serde_json::Value = serde_json::from_str(&text).expect("Output should be JSON");
        assert_eq!(value["date"], "2026-10-16");
    }

    #[tokio::test]
    async fn test_missing_history_is_reported() {
        let f = fixture();
        let command = parse(&[
            "spearlog",
            "match",
            "--history",
            "/nonexistent/dives.json",
            "--forecast",
            f.forecast.to_str().unwrap(),
            "--lat",
            "43.2",
            "--lon",
            "5.4",
        ]);

        let err = app().run(&command).await.unwrap_err();
        assert!(matches!(err, AppError::History(HistoryError::Io(_))));
    }

    #[tokio::test]
    async fn test_configured_endpoint_failure_is_reported() {
        let f = fixture();
        let mut config = AppConfig::default();
        config.forecast.disable_cache = true;
        config.forecast.weather_url = "http://127.0.0.1:9/v1/forecast".to_string();
        config.forecast.marine_url = "http://127.0.0.1:9/v1/marine".to_string();
        let command = parse(&[
            "spearlog",
            "outlook",
            "--history",
            f.history.to_str().unwrap(),
            "--lat",
            "43.2",
            "--lon",
            "5.4",
        ]);

        let err = App::new(config).run(&command).await.unwrap_err();
        assert!(matches!(err, AppError::Forecast(_)), "{}", err);
    }

    #[test]
    fn test_read_forecast_file_errors() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("forecast.json");
        assert!(matches!(read_forecast_file(&path), Err(AppError::ForecastFile { .. })));

        fs::write(&path, "[]").unwrap();
        assert!(matches!(read_forecast_file(&path), Err(AppError::ForecastFileParse { .. })));
    }

    #[test]
    fn test_scoreable_dives() {
        let history = crate::data::history::parse_history(HISTORY).unwrap();
        assert_eq!(scoreable_dives(&history), 1);
    }
}
