//! Forecast indexer
//!
//! Holds the hourly weather and marine series as delivered by the forecast
//! provider and extracts the values for one (day, hour) slot. Lookups are
//! plain array indexing: no interpolation, no resampling.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::data::Conditions;

/// Hours per forecast day
pub const HOURS_PER_DAY: usize = 24;

/// Hourly weather series, parallel arrays starting at local midnight of day 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyWeather {
    pub time: Vec<NaiveDateTime>,
    /// Celsius
    pub temperature: Vec<Option<f64>>,
    /// Relative humidity, percent
    pub humidity: Vec<Option<f64>>,
    /// Millimeters over the hour
    pub precipitation: Vec<Option<f64>>,
    /// WMO weather code
    pub weather_code: Vec<Option<u8>>,
    /// km/h
    pub wind_speed: Vec<Option<f64>>,
    /// Degrees
    pub wind_direction: Vec<Option<f64>>,
}

/// Hourly marine series; may be shorter than the weather series or empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyMarine {
    pub time: Vec<NaiveDateTime>,
    /// Meters
    pub wave_height: Vec<Option<f64>>,
    /// Degrees
    pub wave_direction: Vec<Option<f64>>,
    /// Seconds
    pub wave_period: Vec<Option<f64>>,
}

/// A multi-day hourly forecast for one location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub weather: HourlyWeather,
    #[serde(default)]
    pub marine: HourlyMarine,
}

/// Weather values for a single hour
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPartial {
    pub time: Option<NaiveDateTime>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<u8>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
}

/// Marine values for a single hour; all `None` when the marine series
/// does not reach the slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarinePartial {
    pub wave_height: Option<f64>,
    pub wave_direction: Option<f64>,
    pub wave_period: Option<f64>,
}

/// Weather and marine values at one forecast slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub weather: WeatherPartial,
    pub marine: MarinePartial,
}

impl Snapshot {
    /// Combines the snapshot with the lunar and tidal inputs into the
    /// conditions the scorer compares.
    pub fn to_conditions(
        &self,
        moon_phase: Option<f64>,
        tide_coefficient: Option<f64>,
    ) -> Conditions {
        Conditions {
            temperature: self.weather.temperature,
            wind_speed: self.weather.wind_speed,
            wind_direction: self.weather.wind_direction,
            wave_height: self.marine.wave_height,
            wave_period: self.marine.wave_period,
            tide_coefficient,
            moon_phase,
        }
    }
}

impl Forecast {
    /// Local date of the first weather slot
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.weather.time.first().map(|t| t.date())
    }

    /// Number of whole or partial days the weather series covers
    pub fn days(&self) -> usize {
        self.weather.time.len().div_ceil(HOURS_PER_DAY)
    }
}

/// Extracts the weather and marine values at `day_offset` days and `hour`
/// hours after the start of the forecast.
///
/// Returns `None` when the slot lies outside the weather series or `hour`
/// is not a valid hour of the day. When the marine series is shorter than
/// the weather series, the weather part is still returned with an empty
/// marine part.
pub fn snapshot_at(forecast: &Forecast, day_offset: usize, hour: usize) -> Option<Snapshot> {
    if hour >= HOURS_PER_DAY {
        return None;
    }
    let index = day_offset.checked_mul(HOURS_PER_DAY)?.checked_add(hour)?;

    let weather = &forecast.weather;
    let time = *weather.time.get(index)?;

    let weather_part = WeatherPartial {
        time: Some(time),
        temperature: value_at(&weather.temperature, index),
        humidity: value_at(&weather.humidity, index),
        precipitation: value_at(&weather.precipitation, index),
        weather_code: value_at(&weather.weather_code, index),
        wind_speed: value_at(&weather.wind_speed, index),
        wind_direction: value_at(&weather.wind_direction, index),
    };

    let marine = &forecast.marine;
    let marine_part = if index < marine.time.len() {
        MarinePartial {
            wave_height: value_at(&marine.wave_height, index),
            wave_direction: value_at(&marine.wave_direction, index),
            wave_period: value_at(&marine.wave_period, index),
        }
    } else {
        MarinePartial::default()
    };

    Some(Snapshot {
        weather: weather_part,
        marine: marine_part,
    })
}

fn value_at<T: Copy>(series: &[Option<T>], index: usize) -> Option<T> {
    series.get(index).copied().flatten()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    /// Builds a forecast with `weather_hours` weather slots and
    /// `marine_hours` marine slots starting 2026-10-16 00:00. Each value
    /// encodes its index so lookups can be checked exactly.
    pub(crate) fn sample_forecast(weather_hours: usize, marine_hours: usize) -> Forecast {
        let start = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let times = |n: usize| {
            (0..n)
                .map(|i| start + Duration::hours(i as i64))
                .collect::<Vec<_>>()
        };

        Forecast {
            weather: HourlyWeather {
                time: times(weather_hours),
                temperature: (0..weather_hours).map(|i| Some(10.0 + i as f64 / 10.0)).collect(),
                humidity: (0..weather_hours).map(|_| Some(70.0)).collect(),
                precipitation: (0..weather_hours).map(|_| Some(0.0)).collect(),
                weather_code: (0..weather_hours).map(|_| Some(1)).collect(),
                wind_speed: (0..weather_hours).map(|i| Some(i as f64)).collect(),
                wind_direction: (0..weather_hours).map(|i| Some((i * 15 % 360) as f64)).collect(),
            },
            marine: HourlyMarine {
                time: times(marine_hours),
                wave_height: (0..marine_hours).map(|i| Some(i as f64 / 100.0)).collect(),
                wave_direction: (0..marine_hours).map(|_| Some(250.0)).collect(),
                wave_period: (0..marine_hours).map(|_| Some(7.0)).collect(),
            },
        }
    }

    #[test]
    fn test_first_slot_is_first_hourly_entry() {
        let forecast = sample_forecast(168, 168);
        let snapshot = snapshot_at(&forecast, 0, 0).expect("Slot should exist");

        assert_eq!(snapshot.weather.time, forecast.weather.time.first().copied());
        assert_eq!(snapshot.weather.wind_speed, Some(0.0));
        assert_eq!(snapshot.marine.wave_height, Some(0.0));
    }

    #[test]
    fn test_last_slot_is_last_hourly_entry() {
        let forecast = sample_forecast(168, 168);
        let snapshot = snapshot_at(&forecast, 6, 23).expect("Slot should exist");

        assert_eq!(snapshot.weather.time, forecast.weather.time.last().copied());
        assert_eq!(snapshot.weather.wind_speed, Some(167.0));
        assert_eq!(snapshot.marine.wave_height, Some(1.67));
    }

    #[test]
    fn test_slot_past_horizon_is_none() {
        let forecast = sample_forecast(168, 168);
        assert!(snapshot_at(&forecast, 7, 0).is_none());
        assert!(snapshot_at(&forecast, usize::MAX, 0).is_none());
    }

    #[test]
    fn test_invalid_hour_is_none() {
        let forecast = sample_forecast(168, 168);
        assert!(snapshot_at(&forecast, 0, 24).is_none());
    }

    #[test]
    fn test_short_marine_series_leaves_marine_empty() {
        let forecast = sample_forecast(168, 120);

        let covered = snapshot_at(&forecast, 4, 23).expect("Slot should exist");
        assert_eq!(covered.marine.wave_period, Some(7.0));

        let uncovered = snapshot_at(&forecast, 5, 0).expect("Weather should still be present");
        assert_eq!(uncovered.weather.wind_speed, Some(120.0));
        assert_eq!(uncovered.marine, MarinePartial::default());
    }

    #[test]
    fn test_null_values_stay_unknown() {
        let mut forecast = sample_forecast(48, 48);
        forecast.weather.temperature[30] = None;
        forecast.marine.wave_height[30] = None;

        let snapshot = snapshot_at(&forecast, 1, 6).expect("Slot should exist");
        assert!(snapshot.weather.temperature.is_none());
        assert!(snapshot.marine.wave_height.is_none());
        assert_eq!(snapshot.weather.wind_speed, Some(30.0));
    }

    #[test]
    fn test_ragged_weather_columns_yield_none_for_missing_values() {
        let mut forecast = sample_forecast(48, 0);
        forecast.weather.humidity.truncate(10);

        let snapshot = snapshot_at(&forecast, 0, 12).expect("Slot should exist");
        assert!(snapshot.weather.humidity.is_none());
        assert!(snapshot.weather.temperature.is_some());
    }

    #[test]
    fn test_to_conditions_carries_lunar_and_tidal_inputs() {
        let forecast = sample_forecast(24, 24);
        let snapshot = snapshot_at(&forecast, 0, 10).unwrap();
        let conditions = snapshot.to_conditions(Some(0.42), None);

        assert_eq!(conditions.wind_speed, Some(10.0));
        assert_eq!(conditions.wave_height, Some(0.1));
        assert_eq!(conditions.moon_phase, Some(0.42));
        assert!(conditions.tide_coefficient.is_none());
    }

    #[test]
    fn test_coverage_helpers() {
        let forecast = sample_forecast(168, 0);
        assert_eq!(forecast.days(), 7);
        assert_eq!(
            forecast.start_date(),
            Some(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
        );
        assert_eq!(Forecast::default().start_date(), None);
    }
}
