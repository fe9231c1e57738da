//! Error types for wifi-intel
//!
//! Most failures come from two places: an analyzer is built from an
//! invalid configuration, or a model value is built from data that breaks
//! its invariants. "Nothing to report" outcomes are never errors.

use thiserror::Error;

/// Result type alias for wifi-intel operations
pub type Result<T> = std::result::Result<T, WifiIntelError>;

/// Main error type for wifi-intel operations
#[derive(Error, Debug)]
pub enum WifiIntelError {
    /// Invalid analyzer configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model invariant violation
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Prediction horizon outside the supported range
    #[error("Invalid prediction horizon: {horizon_ms}ms (must be in 1..={max_ms}ms)")]
    InvalidHorizon { horizon_ms: u64, max_ms: u64 },

    /// Invalid statistical distribution parameters
    #[error("Statistics error: {0}")]
    Stats(#[from] statrs::StatsError),

    /// Failure reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while validating analyzer configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Value must be strictly positive
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// Value outside an allowed range
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Count below the required minimum
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        value: u64,
        min: u64,
    },

    /// Two settings contradict each other
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Errors raised when model values are built from invalid data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// A history needs at least one observation
    #[error("History for {bssid} has no observations")]
    EmptyHistory { bssid: String },

    /// Observation belongs to another access point
    #[error("Observation for {found} does not belong to history of {expected}")]
    BssidMismatch { expected: String, found: String },

    /// Observations must be appended in time order
    #[error("Observation at {timestamp_ms}ms is older than last seen {last_seen_ms}ms")]
    OutOfOrder { timestamp_ms: u64, last_seen_ms: u64 },

    /// Stored first/last seen times disagree with the observations
    #[error("History for {bssid} claims {first_seen_ms}..={last_seen_ms}ms, observations span {observed_first_ms}..={observed_last_ms}ms")]
    SeenRangeMismatch {
        bssid: String,
        first_seen_ms: u64,
        last_seen_ms: u64,
        observed_first_ms: u64,
        observed_last_ms: u64,
    },

    /// A cluster needs at least one BSS
    #[error("Cluster {cluster_id} has no BSS entries")]
    EmptyCluster { cluster_id: String },

    /// BSSIDs must be unique within a cluster
    #[error("Cluster {cluster_id} lists {bssid} more than once")]
    DuplicateBss { cluster_id: String, bssid: String },

    /// A network needs at least one AP history
    #[error("Network {ssid} has no AP histories")]
    EmptyNetwork { ssid: String },
}
