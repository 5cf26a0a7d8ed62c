//! On-disk cache for forecast lookups
//!
//! Memoizes provider responses per (location, day) with a time-to-live.
//! Expired entries stay readable so the forecast client can degrade to
//! stale data when the provider is unavailable.

mod manager;

pub use manager::{location_day_key, CacheManager, CachedData};
