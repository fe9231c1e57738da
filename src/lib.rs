//! # wifi-intel - WiFi signal intelligence
//!
//! Heuristic analysis of WiFi scan data: where an AP's signal is heading,
//! what looks abnormal, which clients cling to weak links, where a client
//! should roam and what the network will look like shortly.
//!
//! ## Key Features
//!
//! - **Trends**: least-squares RSSI rates per AP and network roll-ups
//! - **Anomalies**: signal jumps, BSS churn, variance, roaming problems
//! - **Sticky clients**: weak associations with a clearly better BSS nearby
//! - **Roaming**: 0-100 candidate scores with tie-stable ranking
//! - **Prediction**: signal, health, coverage and connection risk
//!
//! ## Quick Start
//!
//! ```rust
//! use wifi_intel::{ApHistory, SignalObservation, SignalTrend, TrendAnalyzer};
//!
//! // Ten scans six minutes apart, losing 2 dB each time
//! let observations = (0..10u64)
//!     .map(|i| SignalObservation::new("aa:bb:cc:dd:ee:01", i * 360_000, -55 - 2 * i as i32))
//!     .collect();
//! let history = ApHistory::from_observations("aa:bb:cc:dd:ee:01", observations).unwrap();
//!
//! let analyzer = TrendAnalyzer::default();
//! let trend = analyzer.analyze_ap_signal_trend(&history, history.last_seen_ms());
//!
//! assert_eq!(trend.trend, SignalTrend::StronglyDegrading);
//! assert!(trend.is_significant);
//! assert!((trend.change_rate_db_per_hour + 20.0).abs() < 1e-6);
//! ```
//!
//! ## Modules
//!
//! - [`observation`]: BSSIDs, RSSI samples, roaming events, AP histories
//! - [`cluster`]: BSS descriptions grouped into ESS clusters
//! - [`snapshot`]: Scan snapshots and their differences
//! - [`network`]: Network-wide view over AP histories
//! - [`trend`]: Signal, churn and roaming trends
//! - [`anomaly`]: Anomaly detection, with records in [`event`]
//! - [`sticky`]: Sticky client detection
//! - [`roaming`]: Roaming candidate scoring
//! - [`prediction`]: Performance prediction
//! - [`config`]: Analyzer configuration

// Modules
pub mod anomaly;
pub mod cluster;
pub mod config;
pub mod error;
pub mod event;
pub mod network;
pub mod observation;
pub mod prediction;
pub mod roaming;
pub mod snapshot;
pub mod stats;
pub mod sticky;
pub mod trend;

// Re-exports for convenient access
pub use anomaly::AnomalyDetector;
pub use cluster::{
    ApCluster, ChannelWidth, ClusteredBss, RoamingCapabilities, WifiBand, WifiStandard,
};
pub use config::{
    AnalysisConfig, AnomalyConfig, PredictionConfig, ScoringWeights, StickyConfig, TrendConfig,
};
pub use error::{ConfigError, DataError, Result, WifiIntelError};
pub use event::{Anomaly, AnomalyReport, AnomalySeverity, AnomalyType};
pub use network::NetworkTrend;
pub use observation::{ApHistory, Bssid, RoamingEvent, SignalObservation};
pub use prediction::{
    ConnectionIssuePrediction, ConnectionTimeRecommendation, CoveragePrediction, CoverageQuality,
    HealthChange, NetworkHealth, NetworkHealthPrediction, PerformancePredictor,
    PredictionConfidence, RiskLevel, SignalPrediction,
};
pub use roaming::{RoamingCandidate, RoamingScorer};
pub use snapshot::{RssiDelta, ScanSnapshot, SnapshotComparison};
pub use sticky::{StickyClientDetection, StickyClientDetector, StickyEvent};
pub use trend::{
    ApSignalTrend, ChurnAnalysis, EnvironmentStability, NetworkSignalTrend, RoamingHealth,
    RoamingTrendAnalysis, SignalTrend, TrendAnalyzer, TrendConfidence,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Every analyzer of the crate built from one validated configuration.
#[derive(Debug, Clone)]
pub struct Analyzers {
    pub trend: TrendAnalyzer,
    pub anomaly: AnomalyDetector,
    pub sticky: StickyClientDetector,
    pub roaming: RoamingScorer,
    pub prediction: PerformancePredictor,
}

impl Analyzers {
    /// Build all analyzers; the anomaly detector shares the trend settings.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            trend: TrendAnalyzer::new(config.trend.clone())?,
            anomaly: AnomalyDetector::new(config.anomaly.clone())?
                .with_trend_config(config.trend.clone())?,
            sticky: StickyClientDetector::new(config.sticky.clone())?,
            roaming: RoamingScorer::new(config.roaming.clone())?,
            prediction: PerformancePredictor::new(config.prediction.clone())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_analyzers_from_default_config() {
        let analyzers = Analyzers::new(&AnalysisConfig::default()).unwrap();
        assert_eq!(analyzers.trend.config(), &TrendConfig::default());
        assert_eq!(analyzers.sticky.config().sticky_rssi_threshold_dbm, -75);
    }

    #[test]
    fn test_analyzers_reject_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.roaming.very_weak_signal_dbm = -70;
        assert!(matches!(
            Analyzers::new(&config),
            Err(WifiIntelError::Config(_))
        ));
    }
}
