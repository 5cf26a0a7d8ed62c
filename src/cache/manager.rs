//! Disk memoization for forecast lookups
//!
//! Entries are JSON files keyed by (location, day) and stamped with an
//! expiry. Expired entries are still readable so callers can fall back to
//! stale data when the provider is unreachable.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk envelope around a cached value
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// A value read back from the cache
#[derive(Debug)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    /// Past its expiry; usable only as a fallback
    pub is_expired: bool,
}

/// Reads and writes cache entries under one directory
///
/// Defaults to the XDG cache directory (`~/.cache/spearlog/` on Linux).
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

/// Cache key for a value that depends on a location and a local day.
///
/// Coordinates are rounded to two decimals (about 1 km) so nearby requests
/// share an entry.
pub fn location_day_key(prefix: &str, latitude: f64, longitude: f64, day: NaiveDate) -> String {
    format!("{}_{:.2}_{:.2}_{}", prefix, latitude, longitude, day.format("%Y%m%d"))
}

impl CacheManager {
    /// Uses the platform cache directory. Returns `None` when it cannot be
    /// determined (e.g. no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "spearlog")?;
        Some(Self {
            cache_dir: project_dirs.cache_dir().to_path_buf(),
        })
    }

    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.cache_dir.join(format!("{}.json", file_name))
    }

    /// Stores `data` under `key`, fresh for `ttl`.
    pub fn write<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let now = Utc::now();
        let entry = CacheEntry {
            data,
            cached_at: now,
            expires_at: now + ttl,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let path = self.cache_path(key);
        fs::write(&path, json)?;
        debug!(key, path = %path.display(), "Cache entry written");
        Ok(())
    }

    /// Reads the entry under `key`, fresh or expired.
    ///
    /// Returns `None` when the entry is missing or unreadable.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        let content = fs::read_to_string(self.cache_path(key)).ok()?;
        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "Ignoring unreadable cache entry");
                return None;
            }
        };

        Some(CachedData {
            data: entry.data,
            cached_at: entry.cached_at,
            is_expired: Utc::now() > entry.expires_at,
        })
    }

    /// Reads the entry under `key` only if it has not expired.
    pub fn read_fresh<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read(key).filter(|c| !c.is_expired).map(|c| c.data)
    }
}
