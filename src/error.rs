//! Error taxonomy for the earthquake pipeline service.
//!
//! Three failure domains, recovered at different levels:
//! - [`RecordError`]: a single feed record is unusable. Recovered inside the
//!   normalizer (record dropped and counted, batch continues).
//! - [`FeedError`]: a whole fetch attempt failed. The caller walks the
//!   fallback chain and may serve the last good batch instead.
//! - [`StoreError`]: the durable key-value store misbehaved. Ledger writes
//!   are non-fatal (alerts still fire for the current run); preference
//!   writes surface to the client.

use std::time::Duration;

use thiserror::Error;

// ---

/// Why a single feed record was rejected during normalization.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required field is absent or JSON null.
    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),

    /// A required field is present but not a finite number.
    #[error("record field `{0}` is not numeric")]
    NonNumeric(&'static str),

    /// The epoch-millisecond timestamp does not map to a valid instant.
    #[error("record timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// Failures of the feed collaborator (whole-attempt, never per-record).
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request did not complete within the configured budget.
    #[error("feed request timed out after {0:?}")]
    Timeout(Duration),

    /// The feed answered with a non-success HTTP status.
    #[error("feed returned HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// Connection, TLS, or body-decoding error from the HTTP client.
    #[error("feed transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response parsed as JSON but is not a GeoJSON feature collection.
    #[error("feed body is not a GeoJSON feature collection")]
    MalformedBody,
}

/// Failures of the durable key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLx error (connection, query, etc.)
    #[error("store error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A stored value could not be decoded back into its typed form.
    #[error("stored value under key `{key}` is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("could not encode value for key `{key}`: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
