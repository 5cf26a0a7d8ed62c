//! Dive history source
//!
//! Loads a fisher's logged dives from a JSON export. One bad record never
//! fails the whole file: unreadable conditions are dropped from the record,
//! and records that are unreadable even without them are skipped.

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::HistoricalDive;

/// Errors that can occur when loading a dive history
#[derive(Debug, Error)]
pub enum HistoryError {
    /// History file could not be read
    #[error("Failed to read dive history: {0}")]
    Io(#[from] std::io::Error),

    /// History file is not valid JSON
    #[error("Failed to parse dive history: {0}")]
    Parse(#[from] serde_json::Error),

    /// Top-level JSON value is not a list of dives
    #[error("Dive history must be a JSON array of dives")]
    NotAnArray,
}

/// Loads the dive history stored at `path`.
pub fn load_history(path: &Path) -> Result<Vec<HistoricalDive>, HistoryError> {
    let content = fs::read_to_string(path)?;
    let dives = parse_history(&content)?;
    debug!(count = dives.len(), path = %path.display(), "Loaded dive history");
    Ok(dives)
}

/// Parses a JSON array of dives, salvaging what it can from bad records.
pub fn parse_history(content: &str) -> Result<Vec<HistoricalDive>, HistoryError> {
    let Value::Array(records) = serde_json::from_str::<Value>(content)? else {
        return Err(HistoryError::NotAnArray);
    };

    let mut dives = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        if let Some(dive) = parse_record(index, record) {
            dives.push(dive);
        }
    }
    Ok(dives)
}

fn parse_record(index: usize, mut record: Value) -> Option<HistoricalDive> {
    match serde_json::from_value::<HistoricalDive>(record.clone()) {
        Ok(dive) => return Some(dive),
        Err(e) => debug!(index, error = %e, "Dive record did not parse as-is"),
    }

    // Retry without the conditions so the catches are still usable
    let removed = record
        .as_object_mut()
        .and_then(|obj| obj.remove("conditions"))
        .is_some();

    match serde_json::from_value::<HistoricalDive>(record) {
        Ok(dive) if removed => {
            warn!(
                index,
                date = %dive.date,
                "Dive has unreadable conditions, keeping it without them"
            );
            Some(dive)
        }
        Ok(dive) => Some(dive),
        Err(e) => {
            warn!(index, error = %e, "Skipping unreadable dive record");
            None
        }
    }
}
