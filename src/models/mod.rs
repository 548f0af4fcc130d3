// src/models/mod.rs

//! Domain models for the outage sync application.

mod config;
mod outage;

// Re-export all public types
pub use config::{API_KEY_ENV, ApiConfig, Config, LoggingConfig, RetryConfig, SyncConfig};
pub use outage::{Device, EnrichedOutage, Outage, SiteInfo};
