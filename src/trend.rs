//! Signal trend analysis.
//!
//! The [`TrendAnalyzer`] classifies where an AP's signal is heading from
//! its recent observations, rolls that up across a network, measures how
//! fast the set of visible BSSes changes between scans, and summarizes
//! roaming behavior.
//!
//! Rates are ordinary least-squares slopes over every observation in the
//! trend window, in dB per hour.

use crate::config::TrendConfig;
use crate::error::Result;
use crate::network::NetworkTrend;
use crate::observation::{ApHistory, Bssid};
use crate::snapshot::ScanSnapshot;
use crate::stats;
use log::debug;
use serde::{Deserialize, Serialize};

/// Samples needed for Medium confidence.
pub const MEDIUM_CONFIDENCE_SAMPLES: usize = 30;
/// Samples needed for High confidence.
pub const HIGH_CONFIDENCE_SAMPLES: usize = 100;

/// Direction of an RSSI series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalTrend {
    StronglyImproving,
    Improving,
    Stable,
    Degrading,
    StronglyDegrading,
    /// Too few samples in the window to say.
    InsufficientData,
}

impl SignalTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalTrend::StronglyImproving => "STRONGLY_IMPROVING",
            SignalTrend::Improving => "IMPROVING",
            SignalTrend::Stable => "STABLE",
            SignalTrend::Degrading => "DEGRADING",
            SignalTrend::StronglyDegrading => "STRONGLY_DEGRADING",
            SignalTrend::InsufficientData => "INSUFFICIENT_DATA",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Improving | Self::StronglyImproving)
    }

    pub fn indicates_problem(&self) -> bool {
        matches!(self, Self::Degrading | Self::StronglyDegrading)
    }
}

/// Confidence derived from how many samples backed a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrendConfidence {
    Low,
    Medium,
    High,
}

impl TrendConfidence {
    pub fn from_sample_count(count: usize) -> Self {
        if count >= HIGH_CONFIDENCE_SAMPLES {
            TrendConfidence::High
        } else if count >= MEDIUM_CONFIDENCE_SAMPLES {
            TrendConfidence::Medium
        } else {
            TrendConfidence::Low
        }
    }
}

/// Trend of a single AP over the trend window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApSignalTrend {
    pub bssid: Bssid,
    pub trend: SignalTrend,
    pub confidence: TrendConfidence,
    /// OLS slope, 0.0 without enough data.
    pub change_rate_db_per_hour: f64,
    pub sample_count: usize,
    pub window_start_ms: u64,
    pub window_end_ms: u64,
    pub average_rssi_dbm: Option<f64>,
    pub min_rssi_dbm: Option<i32>,
    pub max_rssi_dbm: Option<i32>,
    pub std_dev_db: f64,
    pub is_significant: bool,
}

/// Per-AP trends of a network with simple counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSignalTrend {
    pub ssid: String,
    pub analyzed_at_ms: u64,
    pub ap_trends: Vec<ApSignalTrend>,
    pub improving_count: usize,
    pub degrading_count: usize,
    pub stable_count: usize,
    pub insufficient_data_count: usize,
    pub total_aps: usize,
}

impl NetworkSignalTrend {
    /// Share of all APs whose trend indicates a problem.
    pub fn degrading_fraction(&self) -> f64 {
        if self.total_aps == 0 {
            return 0.0;
        }
        self.degrading_count as f64 / self.total_aps as f64
    }

    /// Most common direction; ties resolve to Stable.
    pub fn dominant_trend(&self) -> SignalTrend {
        let classified = self.improving_count + self.degrading_count + self.stable_count;
        if classified == 0 {
            return SignalTrend::InsufficientData;
        }
        if self.degrading_count > self.improving_count && self.degrading_count > self.stable_count
        {
            SignalTrend::Degrading
        } else if self.improving_count > self.degrading_count
            && self.improving_count > self.stable_count
        {
            SignalTrend::Improving
        } else {
            SignalTrend::Stable
        }
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// How settled the RF environment is, from BSS churn per hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnvironmentStability {
    VeryStable,
    Stable,
    Moderate,
    Unstable,
    VeryUnstable,
}

impl EnvironmentStability {
    pub fn from_churn_rate(changes_per_hour: f64) -> Self {
        if changes_per_hour < 0.5 {
            Self::VeryStable
        } else if changes_per_hour < 2.0 {
            Self::Stable
        } else if changes_per_hour < 5.0 {
            Self::Moderate
        } else if changes_per_hour < 10.0 {
            Self::Unstable
        } else {
            Self::VeryUnstable
        }
    }
}

/// BSS churn across a sequence of snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnAnalysis {
    pub snapshot_count: usize,
    pub total_added: usize,
    pub total_removed: usize,
    /// Consecutive snapshot pairs with identical BSS sets.
    pub unchanged_intervals: usize,
    pub elapsed_hours: f64,
    /// Added plus removed BSSes per hour.
    pub churn_rate_per_hour: f64,
    pub stability: EnvironmentStability,
    pub analyzed_at_ms: u64,
}

/// Overall roaming experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoamingHealth {
    Excellent,
    Good,
    Fair,
    Poor,
    /// No roaming events in the window.
    NoData,
}

/// Aggregate of a network's roaming events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingTrendAnalysis {
    pub ssid: String,
    pub total_events: usize,
    pub seamless_events: usize,
    pub seamless_percentage: f64,
    pub forced_disconnects: usize,
    pub average_duration_ms: f64,
    pub average_quality_score: f64,
    pub average_rssi_improvement_db: f64,
    pub health: RoamingHealth,
}

impl RoamingTrendAnalysis {
    pub fn is_healthy(&self) -> bool {
        matches!(self.health, RoamingHealth::Excellent | RoamingHealth::Good)
    }
}

/// Signal trend analyzer.
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    /// Create an analyzer, rejecting invalid configuration.
    pub fn new(config: TrendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Classify the RSSI trend of one AP over `[now - window, now]`.
    pub fn analyze_ap_signal_trend(&self, history: &ApHistory, current_time_ms: u64) -> ApSignalTrend {
        let window_start_ms = current_time_ms.saturating_sub(self.config.trend_window_ms);
        let window = history.observations_between(window_start_ms, current_time_ms);
        let values = stats::rssi_values(window);
        let sample_count = window.len();

        let average_rssi_dbm = stats::mean(&values);
        let min_rssi_dbm = window.iter().map(|o| o.rssi_dbm).min();
        let max_rssi_dbm = window.iter().map(|o| o.rssi_dbm).max();
        let std_dev_db = stats::std_dev(&values);

        if sample_count < self.config.min_observations_for_trend {
            debug!(
                "trend {}: {} samples in window, need {}",
                history.bssid(),
                sample_count,
                self.config.min_observations_for_trend
            );
            return ApSignalTrend {
                bssid: history.bssid().clone(),
                trend: SignalTrend::InsufficientData,
                confidence: TrendConfidence::Low,
                change_rate_db_per_hour: 0.0,
                sample_count,
                window_start_ms,
                window_end_ms: current_time_ms,
                average_rssi_dbm,
                min_rssi_dbm,
                max_rssi_dbm,
                std_dev_db,
                is_significant: false,
            };
        }

        let rate = stats::rssi_slope_db_per_hour(window);
        let trend = self.classify_rate(rate);
        let projected_change = rate.abs() * stats::span_hours(window);
        let is_significant = projected_change > self.config.significant_change_threshold_db;

        debug!(
            "trend {}: {} at {:.2} dB/h over {} samples",
            history.bssid(),
            trend.as_str(),
            rate,
            sample_count
        );

        ApSignalTrend {
            bssid: history.bssid().clone(),
            trend,
            confidence: TrendConfidence::from_sample_count(sample_count),
            change_rate_db_per_hour: rate,
            sample_count,
            window_start_ms,
            window_end_ms: current_time_ms,
            average_rssi_dbm,
            min_rssi_dbm,
            max_rssi_dbm,
            std_dev_db,
            is_significant,
        }
    }

    /// Map a rate of change onto a trend bucket.
    pub fn classify_rate(&self, rate_db_per_hour: f64) -> SignalTrend {
        let magnitude = rate_db_per_hour.abs();
        if magnitude <= self.config.stable_band_db_per_hour {
            SignalTrend::Stable
        } else if rate_db_per_hour > 0.0 {
            if magnitude >= self.config.strong_change_db_per_hour {
                SignalTrend::StronglyImproving
            } else {
                SignalTrend::Improving
            }
        } else if magnitude >= self.config.strong_change_db_per_hour {
            SignalTrend::StronglyDegrading
        } else {
            SignalTrend::Degrading
        }
    }

    /// Per-AP trends of every AP in the network, with counts.
    pub fn analyze_network_signal_trend(
        &self,
        network: &NetworkTrend,
        current_time_ms: u64,
    ) -> NetworkSignalTrend {
        let ap_trends: Vec<ApSignalTrend> = network
            .ap_histories()
            .iter()
            .map(|h| self.analyze_ap_signal_trend(h, current_time_ms))
            .collect();

        let mut improving_count = 0;
        let mut degrading_count = 0;
        let mut stable_count = 0;
        let mut insufficient_data_count = 0;
        for t in &ap_trends {
            match t.trend {
                trend if trend.is_positive() => improving_count += 1,
                trend if trend.indicates_problem() => degrading_count += 1,
                SignalTrend::Stable => stable_count += 1,
                _ => insufficient_data_count += 1,
            }
        }

        debug!(
            "network {}: {} improving, {} degrading, {} stable, {} without data",
            network.ssid(),
            improving_count,
            degrading_count,
            stable_count,
            insufficient_data_count
        );

        NetworkSignalTrend {
            ssid: network.ssid().to_string(),
            analyzed_at_ms: current_time_ms,
            total_aps: ap_trends.len(),
            ap_trends,
            improving_count,
            degrading_count,
            stable_count,
            insufficient_data_count,
        }
    }

    /// BSS churn rate across time-ordered snapshots inside the trend window.
    ///
    /// `None` with fewer than two usable snapshots or no elapsed time.
    pub fn analyze_ap_churn(
        &self,
        snapshots: &[ScanSnapshot],
        current_time_ms: u64,
    ) -> Option<ChurnAnalysis> {
        let window_start_ms = current_time_ms.saturating_sub(self.config.trend_window_ms);
        let usable: Vec<&ScanSnapshot> = snapshots
            .iter()
            .filter(|s| s.timestamp_ms >= window_start_ms && s.timestamp_ms <= current_time_ms)
            .collect();

        if usable.len() < 2 {
            return None;
        }

        let mut total_added = 0;
        let mut total_removed = 0;
        let mut unchanged_intervals = 0;
        for pair in usable.windows(2) {
            let comparison = pair[0].compare(pair[1]);
            if comparison.is_unchanged() {
                unchanged_intervals += 1;
                continue;
            }
            total_added += comparison.added.len();
            total_removed += comparison.removed.len();
        }

        let first_ms = usable.iter().map(|s| s.timestamp_ms).min()?;
        let last_ms = usable.iter().map(|s| s.timestamp_ms).max()?;
        let elapsed_hours = (last_ms - first_ms) as f64 / stats::MS_PER_HOUR;
        if elapsed_hours <= 0.0 {
            return None;
        }

        let churn_rate_per_hour = (total_added + total_removed) as f64 / elapsed_hours;
        let stability = EnvironmentStability::from_churn_rate(churn_rate_per_hour);
        debug!(
            "churn: {:.2} changes/h over {} snapshots ({:?})",
            churn_rate_per_hour,
            usable.len(),
            stability
        );

        Some(ChurnAnalysis {
            snapshot_count: usable.len(),
            total_added,
            total_removed,
            unchanged_intervals,
            elapsed_hours,
            churn_rate_per_hour,
            stability,
            analyzed_at_ms: current_time_ms,
        })
    }

    /// Summarize roaming events inside the roaming window.
    pub fn analyze_roaming_trend(
        &self,
        network: &NetworkTrend,
        current_time_ms: u64,
    ) -> RoamingTrendAnalysis {
        let window_start_ms = current_time_ms.saturating_sub(self.config.roaming_window_ms);
        let events: Vec<_> = network
            .all_roaming_events()
            .into_iter()
            .filter(|e| e.timestamp_ms >= window_start_ms && e.timestamp_ms <= current_time_ms)
            .collect();

        let total_events = events.len();
        if total_events == 0 {
            return RoamingTrendAnalysis {
                ssid: network.ssid().to_string(),
                total_events: 0,
                seamless_events: 0,
                seamless_percentage: 0.0,
                forced_disconnects: 0,
                average_duration_ms: 0.0,
                average_quality_score: 0.0,
                average_rssi_improvement_db: 0.0,
                health: RoamingHealth::NoData,
            };
        }

        let n = total_events as f64;
        let seamless_events = events.iter().filter(|e| e.is_seamless()).count();
        let forced_disconnects = events.iter().filter(|e| e.was_forced_disconnect).count();
        let seamless_percentage = seamless_events as f64 / n * 100.0;
        let average_duration_ms = events.iter().map(|e| e.duration_ms as f64).sum::<f64>() / n;
        let average_quality_score = events.iter().map(|e| e.quality_score()).sum::<f64>() / n;
        let average_rssi_improvement_db =
            events.iter().map(|e| e.rssi_improvement_db() as f64).sum::<f64>() / n;

        let health = if seamless_percentage >= 80.0 && average_quality_score >= 80.0 {
            RoamingHealth::Excellent
        } else if seamless_percentage >= 50.0 && average_quality_score >= 60.0 {
            RoamingHealth::Good
        } else if average_quality_score >= 40.0 {
            RoamingHealth::Fair
        } else {
            RoamingHealth::Poor
        };

        RoamingTrendAnalysis {
            ssid: network.ssid().to_string(),
            total_events,
            seamless_events,
            seamless_percentage,
            forced_disconnects,
            average_duration_ms,
            average_quality_score,
            average_rssi_improvement_db,
            health,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ApCluster, ClusteredBss, WifiBand};
    use crate::observation::{RoamingEvent, SignalObservation};

    const AP: &str = "aa:bb:cc:00:00:01";

    fn history(points: &[(u64, i32)]) -> ApHistory {
        let obs = points
            .iter()
            .map(|&(t, r)| SignalObservation::new(AP, t, r))
            .collect();
        ApHistory::from_observations(AP, obs).unwrap()
    }

    fn analyzer(min_observations: usize) -> TrendAnalyzer {
        TrendAnalyzer::new(TrendConfig {
            min_observations_for_trend: min_observations,
            ..Default::default()
        })
        .unwrap()
    }

    fn snapshot(timestamp_ms: u64, macs: &[&str]) -> ScanSnapshot {
        let bss = macs
            .iter()
            .map(|m| ClusteredBss::new(*m, WifiBand::Band5GHz, 36, 5180).with_rssi(-60))
            .collect();
        ScanSnapshot::new(
            timestamp_ms,
            vec![ApCluster::new("c", "corp", "wpa2", bss).unwrap()],
        )
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = TrendAnalyzer::new(TrendConfig {
            min_observations_for_trend: 1,
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_improving_series() {
        let h = history(&[(0, -70), (1000, -65), (2000, -60), (3000, -55), (4000, -50)]);
        let result = analyzer(5).analyze_ap_signal_trend(&h, 10_000);

        assert!(result.trend.is_positive());
        assert_eq!(result.trend, SignalTrend::StronglyImproving);
        assert!(result.change_rate_db_per_hour > 0.0);
        assert_eq!(result.confidence, TrendConfidence::Low);
        assert_eq!(result.sample_count, 5);
        assert!(result.is_significant);
    }

    #[test]
    fn test_degrading_series() {
        let h = history(&[(0, -50), (1000, -55), (2000, -60), (3000, -65), (4000, -70)]);
        let result = analyzer(5).analyze_ap_signal_trend(&h, 10_000);

        assert!(result.trend.indicates_problem());
        assert!(result.change_rate_db_per_hour < 0.0);
    }

    #[test]
    fn test_constant_series_is_stable() {
        let h = history(&[(0, -60), (1000, -60), (2000, -60)]);
        let result = analyzer(3).analyze_ap_signal_trend(&h, 3000);
        assert_eq!(result.trend, SignalTrend::Stable);
        assert!(!result.is_significant);
        assert_eq!(result.std_dev_db, 0.0);
    }

    #[test]
    fn test_insufficient_data() {
        let h = history(&[(0, -60), (1000, -55)]);
        let result = analyzer(3).analyze_ap_signal_trend(&h, 2000);
        assert_eq!(result.trend, SignalTrend::InsufficientData);
        assert_eq!(result.confidence, TrendConfidence::Low);
        assert_eq!(result.change_rate_db_per_hour, 0.0);
    }

    #[test]
    fn test_window_excludes_old_samples() {
        let hour = 3_600_000;
        // Old samples degrade sharply, recent ones are flat.
        let h = history(&[
            (0, -40),
            (1000, -90),
            (2 * hour, -60),
            (2 * hour + 1000, -60),
            (2 * hour + 2000, -60),
        ]);
        let result = analyzer(3).analyze_ap_signal_trend(&h, 2 * hour + 2000);
        assert_eq!(result.sample_count, 3);
        assert_eq!(result.trend, SignalTrend::Stable);
    }

    #[test]
    fn test_classify_rate_buckets() {
        let a = TrendAnalyzer::default();
        assert_eq!(a.classify_rate(0.5), SignalTrend::Stable);
        assert_eq!(a.classify_rate(-1.0), SignalTrend::Stable);
        assert_eq!(a.classify_rate(2.0), SignalTrend::Improving);
        assert_eq!(a.classify_rate(5.0), SignalTrend::StronglyImproving);
        assert_eq!(a.classify_rate(-3.0), SignalTrend::Degrading);
        assert_eq!(a.classify_rate(-12.0), SignalTrend::StronglyDegrading);
    }

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(TrendConfidence::from_sample_count(29), TrendConfidence::Low);
        assert_eq!(TrendConfidence::from_sample_count(30), TrendConfidence::Medium);
        assert_eq!(TrendConfidence::from_sample_count(100), TrendConfidence::High);
    }

    #[test]
    fn test_network_counts() {
        let up = history(&[(0, -70), (1000, -65), (2000, -60)]);
        let obs = |m: &str, pts: &[(u64, i32)]| {
            ApHistory::from_observations(
                m,
                pts.iter().map(|&(t, r)| SignalObservation::new(m, t, r)).collect(),
            )
            .unwrap()
        };
        let down = obs("b", &[(0, -50), (1000, -60), (2000, -70)]);
        let flat = obs("c", &[(0, -60), (1000, -60), (2000, -60)]);
        let sparse = obs("d", &[(0, -60)]);

        let network = NetworkTrend::new("corp", vec![up, down, flat, sparse]).unwrap();
        let result = analyzer(3).analyze_network_signal_trend(&network, 2000);

        assert_eq!(result.total_aps, 4);
        assert_eq!(result.improving_count, 1);
        assert_eq!(result.degrading_count, 1);
        assert_eq!(result.stable_count, 1);
        assert_eq!(result.insufficient_data_count, 1);
        assert_eq!(result.dominant_trend(), SignalTrend::Stable);
        assert!((result.degrading_fraction() - 0.25).abs() < 1e-9);
        assert!(result.to_json().unwrap().contains("corp"));
    }

    #[test]
    fn test_churn_stability() {
        let hour = 3_600_000;
        let snapshots = vec![
            snapshot(0, &["a", "b"]),
            snapshot(hour / 2, &["a", "c"]),
            snapshot(hour, &["a", "c"]),
        ];
        let result = TrendAnalyzer::default()
            .analyze_ap_churn(&snapshots, hour)
            .unwrap();
        assert_eq!(result.total_added, 1);
        assert_eq!(result.total_removed, 1);
        assert_eq!(result.unchanged_intervals, 1);
        assert!((result.churn_rate_per_hour - 2.0).abs() < 1e-9);
        assert_eq!(result.stability, EnvironmentStability::Moderate);
    }

    #[test]
    fn test_churn_needs_two_snapshots() {
        let a = TrendAnalyzer::default();
        assert!(a.analyze_ap_churn(&[snapshot(1000, &["a"])], 1000).is_none());
        assert!(a
            .analyze_ap_churn(&[snapshot(1000, &["a"]), snapshot(1000, &["b"])], 1000)
            .is_none());
    }

    #[test]
    fn test_stability_thresholds() {
        assert_eq!(EnvironmentStability::from_churn_rate(0.4), EnvironmentStability::VeryStable);
        assert_eq!(EnvironmentStability::from_churn_rate(1.0), EnvironmentStability::Stable);
        assert_eq!(EnvironmentStability::from_churn_rate(9.9), EnvironmentStability::Unstable);
        assert_eq!(EnvironmentStability::from_churn_rate(10.0), EnvironmentStability::VeryUnstable);
    }

    #[test]
    fn test_roaming_trend() {
        let fast = |t| RoamingEvent::new(t, "a", "b", "corp", 40, -75, -60).with_assistance(true, true, true);
        let slow = RoamingEvent::new(4000, "b", "a", "corp", 1500, -78, -70).forced();
        let h = history(&[(0, -60), (5000, -60)])
            .with_roaming_event(fast(1000))
            .with_roaming_event(fast(2000))
            .with_roaming_event(fast(3000))
            .with_roaming_event(slow);
        let network = NetworkTrend::new("corp", vec![h]).unwrap();

        let result = TrendAnalyzer::default().analyze_roaming_trend(&network, 5000);
        assert_eq!(result.total_events, 4);
        assert_eq!(result.seamless_events, 3);
        assert!((result.seamless_percentage - 75.0).abs() < 1e-9);
        assert_eq!(result.forced_disconnects, 1);
        assert_eq!(result.health, RoamingHealth::Good);
        assert!(result.is_healthy());
    }

    #[test]
    fn test_roaming_trend_without_events() {
        let network = NetworkTrend::new("corp", vec![history(&[(0, -60)])]).unwrap();
        let result = TrendAnalyzer::default().analyze_roaming_trend(&network, 5000);
        assert_eq!(result.health, RoamingHealth::NoData);
        assert_eq!(result.total_events, 0);
    }
}
