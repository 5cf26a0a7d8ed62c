//! Integration tests for the spearlog binary
//!
//! Runs the subcommands offline against a forecast file and a dive log
//! written to a temp directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{Duration, NaiveDate};
use spearlog::forecast::{Forecast, HourlyMarine, HourlyWeather};
use tempfile::TempDir;

const HISTORY: &str = r#"[
    {
        "date": "2026-06-14",
        "location_id": "calanques",
        "conditions": {"wind_speed": 8.0, "wind_direction": 110.0, "wave_height": 0.4, "temperature": 18.0},
        "catches": [{"species": "Sea bream", "weight_kg": 1.4}]
    },
    {
        "date": "2026-08-03",
        "location_id": "porquerolles",
        "conditions": {"wind_speed": 35.0, "wind_direction": 300.0, "wave_height": 2.2, "temperature": 25.0},
        "catches": [{"species": "Grouper", "weight_kg": 6.0}]
    }
]"#;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_spearlog"))
        .args(args)
        .output()
        .expect("Failed to execute spearlog")
}

/// Seven days of calm easterly weather starting 2026-10-16
fn calm_forecast() -> Forecast {
    let start = NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let hours = 7 * 24;
    let time: Vec<_> = (0..hours).map(|h| start + Duration::hours(h as i64)).collect();

    Forecast {
        weather: HourlyWeather {
            time: time.clone(),
            temperature: vec![Some(18.0); hours],
            humidity: vec![Some(70.0); hours],
            precipitation: vec![Some(0.0); hours],
            weather_code: vec![Some(1); hours],
            wind_speed: vec![Some(8.0); hours],
            wind_direction: vec![Some(110.0); hours],
        },
        marine: HourlyMarine {
            time,
            wave_height: vec![Some(0.4); hours],
            wave_direction: vec![Some(120.0); hours],
            wave_period: vec![Some(6.0); hours],
        },
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("dives.json"), HISTORY).unwrap();
        fs::write(
            dir.path().join("forecast.json"),
            serde_json::to_string(&calm_forecast()).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"forecast": {"disable_cache": true}}"#,
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn arg(&self, name: &str) -> String {
        path_arg(&self.path(name))
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("spearlog"), "Help should mention spearlog");
    assert!(stdout.contains("solunar"), "Help should list the solunar subcommand");
    assert!(stdout.contains("outlook"), "Help should list the outlook subcommand");
}

#[test]
fn test_solunar_runs_offline() {
    let output = run_cli(&["solunar", "--date", "2026-10-16", "--lat", "43.2"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Solunar for Friday 16 October 2026"));
    assert!(stdout.contains("Major"));
    assert!(stdout.contains("Minor"));
}

#[test]
fn test_invalid_latitude_prints_error_and_exits() {
    let output = run_cli(&["solunar", "--lat", "123"]);
    assert!(!output.status.success(), "Expected invalid latitude to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid latitude"),
        "Should print error message about the latitude: {}",
        stderr
    );
}

#[test]
fn test_match_finds_similar_dive() {
    let ws = Workspace::new();
    let output = run_cli(&[
        "--config",
        &ws.arg("config.json"),
        "match",
        "--history",
        &ws.arg("dives.json"),
        "--forecast",
        &ws.arg("forecast.json"),
        "--lat",
        "43.2",
        "--lon",
        "5.4",
        "--hour",
        "7",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Conditions for Fri 16 Oct 07:00"), "{}", stdout);
    assert!(stdout.contains("Sea bream"), "{}", stdout);
    assert!(!stdout.contains("Grouper"), "{}", stdout);
}

#[test]
fn test_match_location_filter_excludes_other_spots() {
    let ws = Workspace::new();
    let output = run_cli(&[
        "--config",
        &ws.arg("config.json"),
        "match",
        "--history",
        &ws.arg("dives.json"),
        "--forecast",
        &ws.arg("forecast.json"),
        "--lat",
        "43.2",
        "--lon",
        "5.4",
        "--hour",
        "7",
        "--location",
        "Porquerolles",
        "--json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    assert_eq!(report["location"], "Porquerolles");
    assert_eq!(report["matches"].as_array().map(|m| m.len()), Some(0));
}

#[test]
fn test_outlook_rates_each_day() {
    let ws = Workspace::new();
    let output = run_cli(&[
        "--config",
        &ws.arg("config.json"),
        "outlook",
        "--history",
        &ws.arg("dives.json"),
        "--forecast",
        &ws.arg("forecast.json"),
        "--lat",
        "43.2",
        "--lon",
        "5.4",
        "--json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let days: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Output should be JSON");
    let days = days.as_array().expect("Outlook should be an array");
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["date"], "2026-10-16");
    assert!(days.iter().all(|d| d["hour"] == 7));
}

#[test]
fn test_missing_history_file_fails() {
    let ws = Workspace::new();
    let output = run_cli(&[
        "--config",
        &ws.arg("config.json"),
        "match",
        "--history",
        &ws.arg("absent.json"),
        "--forecast",
        &ws.arg("forecast.json"),
        "--lat",
        "43.2",
        "--lon",
        "5.4",
    ]);
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_zero_max_results_is_rejected() {
    let ws = Workspace::new();
    let output = run_cli(&[
        "match",
        "--history",
        &ws.arg("dives.json"),
        "--forecast",
        &ws.arg("forecast.json"),
        "--lat",
        "43.2",
        "--lon",
        "5.4",
        "--max-results",
        "0",
    ]);
    assert!(!output.status.success(), "Expected --max-results 0 to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid max results"), "{}", stderr);
}

#[test]
fn test_missing_config_file_fails() {
    let ws = Workspace::new();
    let output = run_cli(&["--config", &ws.arg("nope.json"), "solunar", "--lat", "43.2"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope.json"), "{}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Scenario checks against the library without running the binary

    use chrono::NaiveDate;
    use spearlog::data::{Catch, Conditions, HistoricalDive};
    use spearlog::matcher::find_matches;
    use spearlog::similarity::{similarity, ScoringConfig};
    use spearlog::solunar::{day_moon_phase, solunar_periods};

    fn dive(date: (i32, u32, u32), conditions: Conditions) -> HistoricalDive {
        HistoricalDive {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            location_id: "calanques".to_string(),
            conditions: Some(conditions),
            duration_minutes: Some(90),
            max_depth_m: Some(12.0),
            catches: vec![Catch {
                species: "Sea bass".to_string(),
                weight_kg: Some(2.1),
            }],
        }
    }

    #[test]
    fn test_near_identical_conditions_score_high() {
        let current = Conditions {
            wind_speed: Some(10.0),
            wind_direction: Some(90.0),
            wave_height: Some(0.5),
            tide_coefficient: Some(80.0),
            moon_phase: Some(0.5),
            temperature: Some(20.0),
            ..Default::default()
        };
        let past = Conditions {
            wind_speed: Some(12.0),
            wind_direction: Some(100.0),
            wave_height: Some(0.6),
            tide_coefficient: Some(85.0),
            moon_phase: Some(0.48),
            temperature: Some(19.0),
            ..Default::default()
        };
        let result = similarity(&current, &past, &ScoringConfig::default());
        assert!(result.score > 0.8, "score was {}", result.score);
        assert_eq!(result.fields_compared, 6);
    }

    #[test]
    fn test_opposite_conditions_score_low() {
        let current = Conditions {
            wind_speed: Some(5.0),
            wind_direction: Some(0.0),
            wave_height: Some(0.2),
            ..Default::default()
        };
        let past = Conditions {
            wind_speed: Some(45.0),
            wind_direction: Some(180.0),
            wave_height: Some(2.5),
            ..Default::default()
        };
        let result = similarity(&current, &past, &ScoringConfig::default());
        assert!(result.score < 0.3, "score was {}", result.score);
    }

    #[test]
    fn test_find_matches_respects_limits() {
        let current = Conditions {
            wind_speed: Some(10.0),
            wave_height: Some(0.5),
            ..Default::default()
        };
        let history: Vec<_> = (1..=9)
            .map(|d| {
                dive(
                    (2026, 5, d),
                    Conditions {
                        wind_speed: Some(10.0 + d as f64),
                        wave_height: Some(0.5),
                        ..Default::default()
                    },
                )
            })
            .collect();

        let matches = find_matches(&current, &history, 0.6, 3);
        assert_eq!(matches.len(), 3);
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(matches[0].dive.date, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
    }

    #[test]
    fn test_solunar_day_is_consistent() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let phase = day_moon_phase(date);
        assert!((0.0..1.0).contains(&phase));
        let periods = solunar_periods(date, 43.2);
        assert!(periods.iter().all(|p| p.start.date() == date));
    }
}
