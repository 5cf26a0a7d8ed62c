//! Spearlog library
//!
//! Catch prediction for spearfishing: solunar periods, forecast indexing,
//! condition similarity scoring and matching against a personal dive log.
//! Exposed as a library so the binary and the integration tests share it.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod forecast;
pub mod matcher;
pub mod report;
pub mod similarity;
pub mod solunar;
