//! Anomaly detection.
//!
//! Turns snapshot comparisons, AP histories and roaming logs into
//! severity-ranked [`Anomaly`] records. Every detector is a pure function of
//! its input and the configuration fixed at construction.

use crate::config::{AnomalyConfig, TrendConfig};
use crate::error::Result;
use crate::event::{Anomaly, AnomalyReport, AnomalySeverity, AnomalyType};
use crate::network::NetworkTrend;
use crate::observation::{ApHistory, Bssid, RoamingEvent};
use crate::snapshot::SnapshotComparison;
use crate::stats;
use crate::trend::TrendAnalyzer;
use log::{debug, info};
use std::collections::BTreeMap;

/// Degrading share of a network that escalates to Critical.
const CRITICAL_DEGRADATION_FRACTION: f64 = 0.75;

/// Threshold-based anomaly detector.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
    trend_analyzer: TrendAnalyzer,
}

impl AnomalyDetector {
    /// Create a detector, rejecting invalid configuration.
    pub fn new(config: AnomalyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            trend_analyzer: TrendAnalyzer::default(),
        })
    }

    /// Use a custom trend configuration for network-wide degradation.
    pub fn with_trend_config(mut self, trend: TrendConfig) -> Result<Self> {
        self.trend_analyzer = TrendAnalyzer::new(trend)?;
        Ok(self)
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Churn and per-BSS signal jumps between two scans.
    pub fn detect_snapshot_anomalies(&self, comparison: &SnapshotComparison) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        let timestamp_ms = comparison.after_timestamp_ms;
        let churn_threshold = self.config.churn_threshold_percentage;

        let churn = comparison.churn_percentage();
        if comparison.total_before > 0 && churn > churn_threshold {
            let severity = if churn >= 2.0 * churn_threshold {
                AnomalySeverity::High
            } else {
                AnomalySeverity::Medium
            };
            let affected = comparison
                .added
                .iter()
                .chain(comparison.removed.iter())
                .cloned()
                .collect();
            anomalies.push(Anomaly::massive_ap_churn(
                timestamp_ms,
                severity,
                churn,
                churn_threshold,
                affected,
            ));
        }

        let threshold = self.config.sudden_drop_threshold_db;
        for delta in &comparison.rssi_deltas {
            let change = delta.delta_db() as f64;
            if change < -threshold {
                anomalies.push(Anomaly::sudden_signal_drop(
                    timestamp_ms,
                    self.drop_severity(change),
                    delta.bssid.clone(),
                    delta.before_dbm,
                    delta.after_dbm,
                ));
            } else if change > threshold {
                anomalies.push(Anomaly::sudden_signal_spike(
                    timestamp_ms,
                    delta.bssid.clone(),
                    delta.before_dbm,
                    delta.after_dbm,
                ));
            }
        }

        debug!(
            "snapshot {} -> {}: {} anomalies",
            comparison.before_timestamp_ms,
            comparison.after_timestamp_ms,
            anomalies.len()
        );
        anomalies
    }

    /// Variance and sample-to-sample drops over a full history.
    pub fn detect_ap_history_anomalies(&self, history: &ApHistory) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        let observations = history.observations();

        if observations.len() >= self.config.min_observations_for_variance {
            let std_dev = stats::std_dev(&history.rssi_values());
            let limit = self.config.variance_limit_db();
            if std_dev > limit {
                let severity = if std_dev > 1.5 * limit {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                };
                anomalies.push(Anomaly::extreme_signal_variance(
                    history.last_seen_ms(),
                    severity,
                    history.bssid().clone(),
                    std_dev,
                    limit,
                ));
            }
        }

        let threshold = self.config.sudden_drop_threshold_db;
        for pair in observations.windows(2) {
            let change = (pair[1].rssi_dbm - pair[0].rssi_dbm) as f64;
            if change < -threshold {
                anomalies.push(Anomaly::sudden_signal_drop(
                    pair[1].timestamp_ms,
                    self.drop_severity(change),
                    history.bssid().clone(),
                    pair[0].rssi_dbm,
                    pair[1].rssi_dbm,
                ));
            }
        }

        anomalies
    }

    /// Slow and forced roams.
    pub fn detect_roaming_anomalies<'a, I>(&self, events: I) -> Vec<Anomaly>
    where
        I: IntoIterator<Item = &'a RoamingEvent>,
    {
        let limit = self.config.roaming_latency_anomaly_ms;
        let mut anomalies = Vec::new();

        for event in events {
            let affected = vec![event.from_bssid.clone(), event.to_bssid.clone()];
            if event.duration_ms > limit {
                let severity = if event.duration_ms > 2 * limit {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                };
                anomalies.push(Anomaly::new(
                    AnomalyType::ExcessiveRoamingLatency,
                    severity,
                    event.timestamp_ms,
                    format!(
                        "Roam {} -> {} took {} ms (limit: {} ms)",
                        event.from_bssid, event.to_bssid, event.duration_ms, limit
                    ),
                    affected.clone(),
                ));
            }
            if event.was_forced_disconnect {
                anomalies.push(Anomaly::new(
                    AnomalyType::ForcedRoamingDisconnect,
                    AnomalySeverity::Medium,
                    event.timestamp_ms,
                    format!(
                        "Roam {} -> {} followed a forced disconnect",
                        event.from_bssid, event.to_bssid
                    ),
                    affected,
                ));
            }
        }

        anomalies
    }

    /// Back-and-forth roaming between the same two BSSes.
    ///
    /// For every BSSID pair, runs of alternating transitions (each hop leaves
    /// the BSS the previous one arrived at) are scanned with a sliding
    /// window; one anomaly is reported per pair whose busiest window holds at
    /// least `min_occurrences` transitions. Values below 2 are treated as 2.
    pub fn detect_roaming_ping_pong<'a, I>(
        &self,
        events: I,
        window_ms: u64,
        min_occurrences: usize,
    ) -> Vec<Anomaly>
    where
        I: IntoIterator<Item = &'a RoamingEvent>,
    {
        let min_occurrences = min_occurrences.max(2);
        let mut ordered: Vec<&RoamingEvent> = events.into_iter().collect();
        ordered.sort_by_key(|e| e.timestamp_ms);

        let mut by_pair: BTreeMap<(Bssid, Bssid), Vec<&RoamingEvent>> = BTreeMap::new();
        for event in ordered {
            if event.from_bssid == event.to_bssid {
                continue;
            }
            by_pair.entry(pair_key(event)).or_default().push(event);
        }

        let mut anomalies = Vec::new();
        for ((a, b), pair_events) in by_pair {
            let mut best: Option<(usize, &RoamingEvent)> = None;
            for run in alternating_runs(&pair_events) {
                let mut start = 0;
                for end in 0..run.len() {
                    while run[end].timestamp_ms - run[start].timestamp_ms > window_ms {
                        start += 1;
                    }
                    let count = end - start + 1;
                    if best.map_or(true, |(c, _)| count > c) {
                        best = Some((count, run[end]));
                    }
                }
            }

            if let Some((count, last)) = best {
                if count >= min_occurrences {
                    let severity = if count >= 2 * min_occurrences {
                        AnomalySeverity::High
                    } else {
                        AnomalySeverity::Medium
                    };
                    anomalies.push(Anomaly::new(
                        AnomalyType::RoamingPingPong,
                        severity,
                        last.timestamp_ms,
                        format!(
                            "{} roams between {} and {} within {} ms",
                            count, a, b, window_ms
                        ),
                        vec![a, b],
                    ));
                }
            }
        }

        anomalies
    }

    /// Every detector applied across a network, plus network-wide degradation.
    ///
    /// Trends are evaluated at the network's most recent observation.
    pub fn detect_network_anomalies(&self, network: &NetworkTrend) -> AnomalyReport {
        let now_ms = network.latest_timestamp_ms();
        let mut anomalies = Vec::new();

        for history in network.ap_histories() {
            anomalies.extend(self.detect_ap_history_anomalies(history));
            anomalies.extend(self.detect_roaming_anomalies(history.roaming_events()));
        }

        let events = network.all_roaming_events();
        anomalies.extend(self.detect_roaming_ping_pong(
            events,
            self.config.ping_pong_window_ms,
            self.config.ping_pong_min_occurrences,
        ));

        let trends = self
            .trend_analyzer
            .analyze_network_signal_trend(network, now_ms);
        let fraction = trends.degrading_fraction();
        if trends.degrading_count > 0 && fraction > self.config.network_degradation_fraction {
            let severity = if fraction >= CRITICAL_DEGRADATION_FRACTION {
                AnomalySeverity::Critical
            } else {
                AnomalySeverity::High
            };
            let affected = trends
                .ap_trends
                .iter()
                .filter(|t| t.trend.indicates_problem())
                .map(|t| t.bssid.clone())
                .collect();
            anomalies.push(Anomaly::new(
                AnomalyType::NetworkWideDegradation,
                severity,
                now_ms,
                format!(
                    "{} of {} APs on {} are degrading",
                    trends.degrading_count,
                    trends.total_aps,
                    network.ssid()
                ),
                affected,
            ));
        }

        let report = AnomalyReport::new(anomalies, now_ms);
        if report.total() > 0 {
            info!(
                "network {}: {} anomalies ({} critical, {} high)",
                network.ssid(),
                report.total(),
                report.critical_count,
                report.high_count
            );
        }
        report
    }

    fn drop_severity(&self, change_db: f64) -> AnomalySeverity {
        if change_db <= -2.0 * self.config.sudden_drop_threshold_db {
            AnomalySeverity::High
        } else {
            AnomalySeverity::Medium
        }
    }
}

fn pair_key(event: &RoamingEvent) -> (Bssid, Bssid) {
    if event.from_bssid <= event.to_bssid {
        (event.from_bssid.clone(), event.to_bssid.clone())
    } else {
        (event.to_bssid.clone(), event.from_bssid.clone())
    }
}

/// Split time-ordered transitions of one pair into alternating chains.
fn alternating_runs<'a>(events: &[&'a RoamingEvent]) -> Vec<Vec<&'a RoamingEvent>> {
    let mut runs: Vec<Vec<&RoamingEvent>> = Vec::new();
    for &event in events {
        let continues = runs
            .last()
            .and_then(|run| run.last())
            .map_or(false, |prev| prev.to_bssid == event.from_bssid);
        if continues {
            if let Some(run) = runs.last_mut() {
                run.push(event);
                continue;
            }
        }
        runs.push(vec![event]);
    }
    runs
}
