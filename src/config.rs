//! Analyzer configuration.
//!
//! Every analyzer owns one of these structs and validates it in its
//! constructor, so a misconfigured analyzer can never be built.
//! [`AnalysisConfig`] bundles all of them for loading from JSON.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const HOUR_MS: u64 = 3_600_000;

/// Master configuration for all analyzers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Signal trend and churn analysis.
    pub trend: TrendConfig,

    /// Anomaly detection thresholds.
    pub anomaly: AnomalyConfig,

    /// Sticky client detection.
    pub sticky: StickyConfig,

    /// Roaming candidate scoring weights.
    pub roaming: ScoringWeights,

    /// Signal and health prediction.
    pub prediction: PredictionConfig,
}

impl AnalysisConfig {
    /// Validate every section.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.trend.validate()?;
        self.anomaly.validate()?;
        self.sticky.validate()?;
        self.roaming.validate()?;
        self.prediction.validate()
    }

    /// Parse and validate a JSON document. Missing sections take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Signal trend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Minimum in-window observations before a trend is reported (>= 3).
    pub min_observations_for_trend: usize,

    /// Look-back window for trend and churn analysis (ms).
    pub trend_window_ms: u64,

    /// Change over the observed span that counts as significant (dB).
    pub significant_change_threshold_db: f64,

    /// Rates within +/- this value are Stable (dB/hour).
    pub stable_band_db_per_hour: f64,

    /// Rates at or beyond this value are Strongly improving/degrading (dB/hour).
    pub strong_change_db_per_hour: f64,

    /// Look-back window for roaming trend analysis (ms).
    pub roaming_window_ms: u64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_observations_for_trend: 5,
            trend_window_ms: HOUR_MS,
            significant_change_threshold_db: 5.0,
            stable_band_db_per_hour: 1.0,
            strong_change_db_per_hour: 5.0,
            roaming_window_ms: 24 * HOUR_MS,
        }
    }
}

impl TrendConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        at_least(
            "min_observations_for_trend",
            self.min_observations_for_trend as u64,
            3,
        )?;
        positive("trend_window_ms", self.trend_window_ms as f64)?;
        positive(
            "significant_change_threshold_db",
            self.significant_change_threshold_db,
        )?;
        non_negative("stable_band_db_per_hour", self.stable_band_db_per_hour)?;
        positive("roaming_window_ms", self.roaming_window_ms as f64)?;
        if self.strong_change_db_per_hour.is_nan()
            || self.strong_change_db_per_hour <= self.stable_band_db_per_hour
        {
            return Err(ConfigError::Inconsistent(format!(
                "strong_change_db_per_hour ({}) must exceed stable_band_db_per_hour ({})",
                self.strong_change_db_per_hour, self.stable_band_db_per_hour
            )));
        }
        Ok(())
    }
}

/// Anomaly detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// RSSI change between samples that counts as sudden (dB).
    pub sudden_drop_threshold_db: f64,

    /// Added + removed BSSes relative to the earlier scan, in percent.
    pub churn_threshold_percentage: f64,

    /// Roaming gaps longer than this are anomalous (ms).
    pub roaming_latency_anomaly_ms: u64,

    /// RSSI standard deviation of a healthy link (dB).
    pub typical_rssi_std_dev_db: f64,

    /// Multiple of the typical deviation that counts as extreme.
    pub variance_multiplier: f64,

    /// Observations needed before variance is judged (>= 2).
    pub min_observations_for_variance: usize,

    /// Window for ping-pong detection across a network (ms).
    pub ping_pong_window_ms: u64,

    /// Alternating transitions inside the window that make a ping-pong (>= 2).
    pub ping_pong_min_occurrences: usize,

    /// Fraction of degrading APs that makes a network-wide degradation.
    pub network_degradation_fraction: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            sudden_drop_threshold_db: 15.0,
            churn_threshold_percentage: 30.0,
            roaming_latency_anomaly_ms: 1000,
            typical_rssi_std_dev_db: 4.0,
            variance_multiplier: 2.5,
            min_observations_for_variance: 5,
            ping_pong_window_ms: 5 * 60_000,
            ping_pong_min_occurrences: 3,
            network_degradation_fraction: 0.5,
        }
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        positive("sudden_drop_threshold_db", self.sudden_drop_threshold_db)?;
        in_range(
            "churn_threshold_percentage",
            self.churn_threshold_percentage,
            0.0,
            100.0,
        )?;
        positive(
            "roaming_latency_anomaly_ms",
            self.roaming_latency_anomaly_ms as f64,
        )?;
        positive("typical_rssi_std_dev_db", self.typical_rssi_std_dev_db)?;
        positive("variance_multiplier", self.variance_multiplier)?;
        at_least(
            "min_observations_for_variance",
            self.min_observations_for_variance as u64,
            2,
        )?;
        positive("ping_pong_window_ms", self.ping_pong_window_ms as f64)?;
        at_least(
            "ping_pong_min_occurrences",
            self.ping_pong_min_occurrences as u64,
            2,
        )?;
        in_range(
            "network_degradation_fraction",
            self.network_degradation_fraction,
            0.0,
            1.0,
        )
    }

    /// Standard deviation above which a history is flagged (dB).
    pub fn variance_limit_db(&self) -> f64 {
        self.typical_rssi_std_dev_db * self.variance_multiplier
    }
}

/// Sticky client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyConfig {
    /// At or below this level the current link is considered weak (dBm).
    pub sticky_rssi_threshold_dbm: i32,

    /// How much stronger an alternative must be to matter (dB).
    pub better_ap_differential_db: i32,
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            sticky_rssi_threshold_dbm: -75,
            better_ap_differential_db: 10,
        }
    }
}

impl StickyConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        in_range(
            "sticky_rssi_threshold_dbm",
            self.sticky_rssi_threshold_dbm as f64,
            -100.0,
            0.0,
        )?;
        positive(
            "better_ap_differential_db",
            self.better_ap_differential_db as f64,
        )
    }
}

/// Roaming candidate scoring weights (points out of 100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Absolute candidate signal.
    pub signal: f64,
    /// Gain over the current link.
    pub improvement: f64,
    /// Band preference (6 GHz best).
    pub band: f64,
    /// WiFi generation.
    pub standard: f64,
    /// 802.11k/r/v support.
    pub fast_roaming: f64,
    /// Deducted when the candidate is below `weak_signal_dbm`.
    pub weak_signal_penalty: f64,
    /// Deducted instead when below `very_weak_signal_dbm`.
    pub very_weak_signal_penalty: f64,
    pub weak_signal_dbm: i32,
    pub very_weak_signal_dbm: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            signal: 40.0,
            improvement: 25.0,
            band: 15.0,
            standard: 10.0,
            fast_roaming: 10.0,
            weak_signal_penalty: 10.0,
            very_weak_signal_penalty: 20.0,
            weak_signal_dbm: -75,
            very_weak_signal_dbm: -80,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        non_negative("signal", self.signal)?;
        non_negative("improvement", self.improvement)?;
        non_negative("band", self.band)?;
        non_negative("standard", self.standard)?;
        non_negative("fast_roaming", self.fast_roaming)?;
        non_negative("weak_signal_penalty", self.weak_signal_penalty)?;
        non_negative("very_weak_signal_penalty", self.very_weak_signal_penalty)?;
        if self.very_weak_signal_dbm >= self.weak_signal_dbm {
            return Err(ConfigError::Inconsistent(format!(
                "very_weak_signal_dbm ({}) must be below weak_signal_dbm ({})",
                self.very_weak_signal_dbm, self.weak_signal_dbm
            )));
        }
        Ok(())
    }
}

/// Prediction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Samples needed before a prediction rises above Low confidence (>= 3).
    pub min_historical_data_points: usize,

    /// Longest supported prediction horizon (ms).
    pub max_prediction_horizon_ms: u64,

    /// Confidence level of the prediction bounds, in (0, 1].
    pub confidence_interval: f64,

    /// An AP not seen for longer than this is no longer visible (ms).
    pub visibility_threshold_ms: u64,

    /// Signal below which an AP is expected to drop out of scans (dBm).
    pub detection_floor_dbm: i32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            min_historical_data_points: 10,
            max_prediction_horizon_ms: 24 * HOUR_MS,
            confidence_interval: 0.95,
            visibility_threshold_ms: 5 * 60_000,
            detection_floor_dbm: -90,
        }
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        at_least(
            "min_historical_data_points",
            self.min_historical_data_points as u64,
            3,
        )?;
        positive(
            "max_prediction_horizon_ms",
            self.max_prediction_horizon_ms as f64,
        )?;
        let ci = self.confidence_interval;
        if ci.is_nan() || ci <= 0.0 || ci > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "confidence_interval",
                value: self.confidence_interval,
                min: 0.0,
                max: 1.0,
            });
        }
        positive("visibility_threshold_ms", self.visibility_threshold_ms as f64)?;
        in_range(
            "detection_floor_dbm",
            self.detection_floor_dbm as f64,
            -120.0,
            0.0,
        )
    }
}

fn positive(field: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    // NaN fails this comparison too.
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> std::result::Result<(), ConfigError> {
    in_range(field, value, 0.0, f64::MAX)
}

fn in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> std::result::Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn at_least(field: &'static str, value: u64, min: u64) -> std::result::Result<(), ConfigError> {
    if value >= min {
        Ok(())
    } else {
        Err(ConfigError::TooSmall { field, value, min })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trend.min_observations_for_trend, 5);
        assert_eq!(config.sticky.sticky_rssi_threshold_dbm, -75);
        assert_eq!(config.sticky.better_ap_differential_db, 10);
    }

    #[test]
    fn test_config_serialization() {
        let config = AnalysisConfig::default();
        let json = config.to_json_pretty().unwrap();
        let parsed = AnalysisConfig::from_json(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let parsed = AnalysisConfig::from_json(r#"{"sticky": {"sticky_rssi_threshold_dbm": -70}}"#)
            .unwrap();
        assert_eq!(parsed.sticky.sticky_rssi_threshold_dbm, -70);
        assert_eq!(parsed.sticky.better_ap_differential_db, 10);
        assert_eq!(parsed.trend, TrendConfig::default());
    }

    #[test]
    fn test_invalid_json_section_rejected() {
        let err = AnalysisConfig::from_json(r#"{"anomaly": {"churn_threshold_percentage": 150.0}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::WifiIntelError::Config(ConfigError::OutOfRange {
                field: "churn_threshold_percentage",
                ..
            })
        ));
    }

    #[test]
    fn test_trend_config_validation() {
        let config = TrendConfig {
            min_observations_for_trend: 2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooSmall { min: 3, .. })
        ));

        let config = TrendConfig {
            trend_window_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TrendConfig {
            strong_change_db_per_hour: 0.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Inconsistent(_))));
    }

    #[test]
    fn test_anomaly_config_validation() {
        let config = AnomalyConfig {
            sudden_drop_threshold_db: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnomalyConfig {
            sudden_drop_threshold_db: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnomalyConfig {
            ping_pong_min_occurrences: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!((AnomalyConfig::default().variance_limit_db() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_config_validation() {
        for ci in [0.0, -0.5, 1.5, f64::NAN] {
            let config = PredictionConfig {
                confidence_interval: ci,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "ci {} accepted", ci);
        }
        let config = PredictionConfig {
            confidence_interval: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scoring_weights_validation() {
        let weights = ScoringWeights {
            very_weak_signal_dbm: -70,
            ..Default::default()
        };
        assert!(weights.validate().is_err());

        let weights = ScoringWeights {
            band: -1.0,
            ..Default::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_sticky_config_validation() {
        let config = StickyConfig {
            better_ap_differential_db: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StickyConfig {
            sticky_rssi_threshold_dbm: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
