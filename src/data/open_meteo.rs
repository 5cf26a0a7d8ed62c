//! Open-Meteo forecast client
//!
//! Fetches seven days of hourly weather and marine data for a point and
//! shapes them into a [`Forecast`]. The two APIs are queried concurrently.
//! Marine data is best-effort: inland points have none, so a marine failure
//! leaves the marine series empty instead of failing the forecast.

use chrono::{Duration, Local, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{location_day_key, CacheManager};
use crate::forecast::{Forecast, HourlyMarine, HourlyWeather};

/// Base URL for the Open-Meteo weather API
pub const OPEN_METEO_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Base URL for the Open-Meteo marine API
pub const OPEN_METEO_MARINE_URL: &str = "https://marine-api.open-meteo.com/v1/marine";

/// Days of forecast requested from both APIs
const FORECAST_DAYS: u32 = 7;

/// Cache key prefix for forecast entries
const FORECAST_CACHE_PREFIX: &str = "forecast";

/// Errors that can occur when fetching forecast data
#[derive(Debug, Error)]
pub enum ForecastError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Provider answered with an error payload
    #[error("Forecast provider error: {0}")]
    Provider(String),

    /// Hourly arrays do not line up with the time axis
    #[error("Inconsistent hourly series: {0}")]
    InconsistentSeries(String),

    /// Invalid time format in response
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
}

/// Client for the Open-Meteo weather and marine APIs
#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    forecast_url: String,
    marine_url: String,
    cache: Option<CacheManager>,
    cache_ttl: Duration,
}

impl ForecastClient {
    /// Creates a client that memoizes forecasts in `cache` for `cache_ttl`.
    pub fn new(cache: Option<CacheManager>, cache_ttl: Duration) -> Self {
        Self {
            client: Client::new(),
            forecast_url: OPEN_METEO_FORECAST_URL.to_string(),
            marine_url: OPEN_METEO_MARINE_URL.to_string(),
            cache,
            cache_ttl,
        }
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Points the client at other weather and marine endpoints
    pub fn with_base_urls(mut self, forecast_url: &str, marine_url: &str) -> Self {
        self.forecast_url = forecast_url.to_string();
        self.marine_url = marine_url.to_string();
        self
    }

    /// Fetches the 7-day hourly forecast for a point.
    ///
    /// A fresh cached forecast for the same location and local day is
    /// returned without network access. If the provider cannot be reached,
    /// an expired cached forecast is returned instead of the error.
    pub async fn fetch_forecast(&self, lat: f64, lon: f64) -> Result<Forecast, ForecastError> {
        let key = location_day_key(FORECAST_CACHE_PREFIX, lat, lon, Local::now().date_naive());

        if let Some(ref cache) = self.cache {
            if let Some(forecast) = cache.read_fresh::<Forecast>(&key) {
                debug!(key, "Serving forecast from cache");
                return Ok(forecast);
            }
        }

        match self.fetch_remote(lat, lon).await {
            Ok(forecast) => {
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.write(&key, &forecast, self.cache_ttl) {
                        warn!(error = %e, "Failed to cache forecast");
                    }
                }
                Ok(forecast)
            }
            Err(e) => {
                if let Some(ref cache) = self.cache {
                    if let Some(stale) = cache.read::<Forecast>(&key) {
                        warn!(
                            error = %e,
                            cached_at = %stale.cached_at,
                            "Forecast fetch failed, using stale cache"
                        );
                        return Ok(stale.data);
                    }
                }
                Err(e)
            }
        }
    }

    async fn fetch_remote(&self, lat: f64, lon: f64) -> Result<Forecast, ForecastError> {
        let weather_url = format!(
            "{}?latitude={}&longitude={}&hourly=temperature_2m,relative_humidity_2m,precipitation,weather_code,wind_speed_10m,wind_direction_10m&forecast_days={}&timezone=auto",
            self.forecast_url, lat, lon, FORECAST_DAYS
        );
        let marine_url = format!(
            "{}?latitude={}&longitude={}&hourly=wave_height,wave_direction,wave_period&forecast_days={}&timezone=auto",
            self.marine_url, lat, lon, FORECAST_DAYS
        );

        info!(lat, lon, "Fetching forecast from Open-Meteo");
        let (weather, marine) =
            futures::join!(self.get_text(&weather_url), self.get_text(&marine_url));

        let weather = parse_weather(&weather?)?;
        let marine = match marine.and_then(|body| parse_marine(&body)) {
            Ok(marine) => marine,
            Err(e) => {
                warn!(error = %e, "No marine data for this point");
                HourlyMarine::default()
            }
        };

        Ok(Forecast { weather, marine })
    }

    async fn get_text(&self, url: &str) -> Result<String, ForecastError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let reason = serde_json::from_str::<ProviderError>(&text)
                .map(|e| e.reason)
                .unwrap_or_else(|_| status.to_string());
            return Err(ForecastError::Provider(reason));
        }
        Ok(text)
    }
}

/// Parses an Open-Meteo weather response into the hourly weather series
pub fn parse_weather(body: &str) -> Result<HourlyWeather, ForecastError> {
    let response: WeatherResponse = serde_json::from_str(body)?;
    let hourly = response.hourly;
    let len = hourly.time.len();

    check_len("temperature_2m", hourly.temperature_2m.len(), len)?;
    check_len("relative_humidity_2m", hourly.relative_humidity_2m.len(), len)?;
    check_len("precipitation", hourly.precipitation.len(), len)?;
    check_len("weather_code", hourly.weather_code.len(), len)?;
    check_len("wind_speed_10m", hourly.wind_speed_10m.len(), len)?;
    check_len("wind_direction_10m", hourly.wind_direction_10m.len(), len)?;

    Ok(HourlyWeather {
        time: parse_times(&hourly.time)?,
        temperature: hourly.temperature_2m,
        humidity: hourly.relative_humidity_2m,
        precipitation: hourly.precipitation,
        weather_code: hourly.weather_code,
        wind_speed: hourly.wind_speed_10m,
        wind_direction: hourly.wind_direction_10m,
    })
}

/// Parses an Open-Meteo marine response into the hourly marine series
pub fn parse_marine(body: &str) -> Result<HourlyMarine, ForecastError> {
    let response: MarineResponse = serde_json::from_str(body)?;
    let hourly = response.hourly;
    let len = hourly.time.len();

    check_len("wave_height", hourly.wave_height.len(), len)?;
    check_len("wave_direction", hourly.wave_direction.len(), len)?;
    check_len("wave_period", hourly.wave_period.len(), len)?;

    Ok(HourlyMarine {
        time: parse_times(&hourly.time)?,
        wave_height: hourly.wave_height,
        wave_direction: hourly.wave_direction,
        wave_period: hourly.wave_period,
    })
}

fn check_len(name: &str, actual: usize, expected: usize) -> Result<(), ForecastError> {
    if actual != expected {
        return Err(ForecastError::InconsistentSeries(format!(
            "{} has {} values for {} timestamps",
            name, actual, expected
        )));
    }
    Ok(())
}

fn parse_times(times: &[String]) -> Result<Vec<NaiveDateTime>, ForecastError> {
    times.iter().map(|t| parse_datetime(t)).collect()
}

/// Parse a datetime string in ISO 8601 format (e.g., "2026-10-16T05:00") to NaiveDateTime
fn parse_datetime(datetime_str: &str) -> Result<NaiveDateTime, ForecastError> {
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M")
        .map_err(|_| ForecastError::InvalidTimeFormat(datetime_str.to_string()))
}

/// Error payload returned by Open-Meteo
#[derive(Debug, Deserialize)]
struct ProviderError {
    reason: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    hourly: WeatherHourlyRaw,
}

#[derive(Debug, Deserialize)]
struct WeatherHourlyRaw {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    weather_code: Vec<Option<u8>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct MarineResponse {
    hourly: MarineHourlyRaw,
}

#[derive(Debug, Deserialize)]
struct MarineHourlyRaw {
    time: Vec<String>,
    wave_height: Vec<Option<f64>>,
    wave_direction: Vec<Option<f64>>,
    wave_period: Vec<Option<f64>>,
}
