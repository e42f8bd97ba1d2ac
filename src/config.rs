//! Configuration loader for the `quakeflow` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). It also names every pipeline policy constant in one
//! place so thresholds are never inlined at their point of use.

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::regions::{RegionFilter, RegionId};

// ---
// Pipeline policy constants. These resolve the numbers the pipeline depends
// on to one canonical set; every component reads them from here.

/// Default alert scope when no preference has been stored.
pub const DEFAULT_REGION_FILTER: RegionFilter = RegionFilter::Within(RegionId::Myanmar);

/// Default minimum magnitude for alert eligibility.
pub const DEFAULT_MIN_ALERT_MAGNITUDE: f64 = 4.5;

/// At most this many alerts are emitted per batch. Events dropped by the cap
/// are not recorded in the ledger and stay eligible next pass.
pub const MAX_ALERTS_PER_BATCH: usize = 3;

/// Capacity of the notified-event ledger; oldest entries evict first.
pub const NOTIFIED_LEDGER_BOUND: usize = 50;

/// Heat-map weight is `magnitude^EXPONENT / DIVISOR`.
pub const HEAT_WEIGHT_EXPONENT: f64 = 1.8;
pub const HEAT_WEIGHT_DIVISOR: f64 = 8.0;

/// An event is significant at this magnitude anywhere on earth.
pub const SIGNIFICANT_MAGNITUDE_GLOBAL: f64 = 5.0;

/// Inside the filtered region the significance floor drops to this.
pub const SIGNIFICANT_MAGNITUDE_IN_REGION: f64 = 4.0;

/// Impact tier edges over the most significant event of a batch.
pub const SEVERE_IMPACT_MAGNITUDE: f64 = 6.0;
pub const MODERATE_IMPACT_MAGNITUDE: f64 = 5.0;

/// The rolling recent-activity window, in days before the reference instant.
pub const ROLLING_WINDOW_DAYS: i64 = 7;

/// Default magnitude floor for historical range queries.
pub const DEFAULT_HISTORY_MIN_MAGNITUDE: f64 = 4.0;

// ---

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Read an optional string environment variable with a default value.
macro_rules! env_or {
    ($var_name:expr, $default:expr) => {
        env::var($var_name).unwrap_or_else(|_| $default.to_string())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// SQLite connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Base URL for the rolling summary feeds.
    pub feed_base_url: String,

    /// Secondary base URL tried when the primary attempt fails. Defaults to
    /// the primary, which makes the second attempt a plain retry unless a
    /// mirror is configured.
    pub feed_fallback_url: String,

    /// Endpoint for historical range queries.
    pub feed_query_url: String,

    /// Per-attempt feed fetch budget, in seconds.
    pub feed_timeout_secs: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – SQLite connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `FEED_BASE_URL` – summary feed base (default: USGS v1.0 summary)
/// - `FEED_FALLBACK_URL` – secondary feed base (default: same as primary)
/// - `FEED_QUERY_URL` – historical query endpoint (default: USGS fdsnws)
/// - `FEED_TIMEOUT_SECS` – per-attempt fetch budget (default: 10)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let feed_base_url = env_or!(
        "FEED_BASE_URL",
        "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary"
    );
    let feed_fallback_url = env_or!("FEED_FALLBACK_URL", feed_base_url.as_str());
    let feed_query_url = env_or!("FEED_QUERY_URL", "https://earthquake.usgs.gov/fdsnws/event/1/query");
    let feed_timeout_secs = parse_env_u32!("FEED_TIMEOUT_SECS", 10);

    Ok(Config {
        db_url,
        db_pool_max,
        feed_base_url,
        feed_fallback_url,
        feed_query_url,
        feed_timeout_secs,
    })
}

impl Config {
    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.feed_timeout_secs))
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL      : {}", self.db_url);
        tracing::info!("  DB_POOL_MAX       : {}", self.db_pool_max);
        tracing::info!("  FEED_BASE_URL     : {}", self.feed_base_url);
        tracing::info!("  FEED_FALLBACK_URL : {}", self.feed_fallback_url);
        tracing::info!("  FEED_QUERY_URL    : {}", self.feed_query_url);
        tracing::info!("  FEED_TIMEOUT_SECS : {}", self.feed_timeout_secs);
    }
}
