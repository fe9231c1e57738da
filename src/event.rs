//! Anomaly records and reports.

use crate::observation::Bssid;
use serde::{Deserialize, Serialize};

/// Kind of anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnomalyType {
    /// RSSI fell by more than the drop threshold between samples.
    SuddenSignalDrop,
    /// RSSI rose by more than the drop threshold between samples.
    SuddenSignalSpike,
    /// Too many BSSes appeared or disappeared between scans.
    MassiveApChurn,
    /// RSSI spread far beyond a healthy link.
    ExtremeSignalVariance,
    /// A roam left the client unassociated for too long.
    ExcessiveRoamingLatency,
    /// A roam happened through a forced disconnect.
    ForcedRoamingDisconnect,
    /// Client bounced between the same two BSSes.
    RoamingPingPong,
    /// Most APs of the network degrading at once.
    NetworkWideDegradation,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::SuddenSignalDrop => "SUDDEN_SIGNAL_DROP",
            AnomalyType::SuddenSignalSpike => "SUDDEN_SIGNAL_SPIKE",
            AnomalyType::MassiveApChurn => "MASSIVE_AP_CHURN",
            AnomalyType::ExtremeSignalVariance => "EXTREME_SIGNAL_VARIANCE",
            AnomalyType::ExcessiveRoamingLatency => "EXCESSIVE_ROAMING_LATENCY",
            AnomalyType::ForcedRoamingDisconnect => "FORCED_ROAMING_DISCONNECT",
            AnomalyType::RoamingPingPong => "ROAMING_PING_PONG",
            AnomalyType::NetworkWideDegradation => "NETWORK_WIDE_DEGRADATION",
        }
    }
}

/// Severity level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AnomalySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalySeverity::Low => "LOW",
            AnomalySeverity::Medium => "MEDIUM",
            AnomalySeverity::High => "HIGH",
            AnomalySeverity::Critical => "CRITICAL",
        }
    }
}

/// A detected anomaly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub anomaly_type: AnomalyType,
    pub severity: AnomalySeverity,
    /// When the anomalous condition was observed (ms).
    pub timestamp_ms: u64,
    /// Human-readable message.
    pub description: String,
    pub affected_bssids: Vec<Bssid>,
}

impl Anomaly {
    pub fn new(
        anomaly_type: AnomalyType,
        severity: AnomalySeverity,
        timestamp_ms: u64,
        description: impl Into<String>,
        affected_bssids: Vec<Bssid>,
    ) -> Self {
        Self {
            anomaly_type,
            severity,
            timestamp_ms,
            description: description.into(),
            affected_bssids,
        }
    }

    pub fn sudden_signal_drop(
        timestamp_ms: u64,
        severity: AnomalySeverity,
        bssid: Bssid,
        before_dbm: i32,
        after_dbm: i32,
    ) -> Self {
        Self::new(
            AnomalyType::SuddenSignalDrop,
            severity,
            timestamp_ms,
            format!(
                "Signal of {} dropped {} dB ({} -> {} dBm)",
                bssid,
                before_dbm - after_dbm,
                before_dbm,
                after_dbm
            ),
            vec![bssid],
        )
    }

    pub fn sudden_signal_spike(timestamp_ms: u64, bssid: Bssid, before_dbm: i32, after_dbm: i32) -> Self {
        Self::new(
            AnomalyType::SuddenSignalSpike,
            AnomalySeverity::Low,
            timestamp_ms,
            format!(
                "Signal of {} jumped {} dB ({} -> {} dBm)",
                bssid,
                after_dbm - before_dbm,
                before_dbm,
                after_dbm
            ),
            vec![bssid],
        )
    }

    pub fn massive_ap_churn(
        timestamp_ms: u64,
        severity: AnomalySeverity,
        churn_percentage: f64,
        threshold: f64,
        affected_bssids: Vec<Bssid>,
    ) -> Self {
        Self::new(
            AnomalyType::MassiveApChurn,
            severity,
            timestamp_ms,
            format!(
                "AP churn {:.0}% between scans (threshold: {:.0}%)",
                churn_percentage, threshold
            ),
            affected_bssids,
        )
    }

    pub fn extreme_signal_variance(
        timestamp_ms: u64,
        severity: AnomalySeverity,
        bssid: Bssid,
        std_dev_db: f64,
        limit_db: f64,
    ) -> Self {
        Self::new(
            AnomalyType::ExtremeSignalVariance,
            severity,
            timestamp_ms,
            format!(
                "Signal of {} varies by {:.1} dB (limit: {:.1} dB)",
                bssid, std_dev_db, limit_db
            ),
            vec![bssid],
        )
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Anomalies of one analysis pass with per-severity counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Most severe first, then oldest first.
    pub anomalies: Vec<Anomaly>,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub generated_at_ms: u64,
}

impl AnomalyReport {
    pub fn new(mut anomalies: Vec<Anomaly>, generated_at_ms: u64) -> Self {
        anomalies.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.timestamp_ms.cmp(&b.timestamp_ms))
        });

        let count = |severity| anomalies.iter().filter(|a| a.severity == severity).count();
        Self {
            critical_count: count(AnomalySeverity::Critical),
            high_count: count(AnomalySeverity::High),
            medium_count: count(AnomalySeverity::Medium),
            low_count: count(AnomalySeverity::Low),
            anomalies,
            generated_at_ms,
        }
    }

    /// A report with nothing in it.
    pub fn empty(generated_at_ms: u64) -> Self {
        Self::new(Vec::new(), generated_at_ms)
    }

    pub fn total(&self) -> usize {
        self.anomalies.len()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.critical_count > 0
    }

    /// No Critical and no High anomalies.
    pub fn is_healthy(&self) -> bool {
        self.critical_count == 0 && self.high_count == 0
    }

    pub fn of_type(&self, anomaly_type: AnomalyType) -> impl Iterator<Item = &Anomaly> {
        self.anomalies
            .iter()
            .filter(move |a| a.anomaly_type == anomaly_type)
    }

    pub fn most_severe(&self) -> Option<&Anomaly> {
        self.anomalies.first()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anomaly(severity: AnomalySeverity, timestamp_ms: u64) -> Anomaly {
        Anomaly::new(
            AnomalyType::SuddenSignalDrop,
            severity,
            timestamp_ms,
            "test",
            vec![Bssid::new("a")],
        )
    }

    #[test]
    fn test_type_as_str() {
        assert_eq!(AnomalyType::MassiveApChurn.as_str(), "MASSIVE_AP_CHURN");
        assert_eq!(AnomalyType::RoamingPingPong.as_str(), "ROAMING_PING_PONG");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AnomalySeverity::Critical > AnomalySeverity::High);
        assert!(AnomalySeverity::Medium > AnomalySeverity::Low);
        assert_eq!(AnomalySeverity::High.as_str(), "HIGH");
    }

    #[test]
    fn test_drop_description() {
        let a = Anomaly::sudden_signal_drop(1000, AnomalySeverity::Medium, Bssid::new("a"), -55, -75);
        assert!(a.description.contains("20 dB"));
        assert_eq!(a.affected_bssids, vec![Bssid::new("a")]);
    }

    #[test]
    fn test_report_counts_and_order() {
        let report = AnomalyReport::new(
            vec![
                anomaly(AnomalySeverity::Low, 1),
                anomaly(AnomalySeverity::Critical, 5),
                anomaly(AnomalySeverity::High, 3),
                anomaly(AnomalySeverity::High, 2),
            ],
            10,
        );

        assert_eq!(report.total(), 4);
        assert_eq!(report.critical_count, 1);
        assert_eq!(report.high_count, 2);
        assert_eq!(report.medium_count, 0);
        assert_eq!(report.low_count, 1);
        assert!(report.has_critical_issues());
        assert!(!report.is_healthy());

        let order: Vec<(AnomalySeverity, u64)> = report
            .anomalies
            .iter()
            .map(|a| (a.severity, a.timestamp_ms))
            .collect();
        assert_eq!(
            order,
            vec![
                (AnomalySeverity::Critical, 5),
                (AnomalySeverity::High, 2),
                (AnomalySeverity::High, 3),
                (AnomalySeverity::Low, 1),
            ]
        );
    }

    #[test]
    fn test_medium_only_report_is_healthy() {
        let report = AnomalyReport::new(vec![anomaly(AnomalySeverity::Medium, 1)], 10);
        assert!(report.is_healthy());
        assert!(!report.has_critical_issues());
        assert!(AnomalyReport::empty(0).is_healthy());
    }

    #[test]
    fn test_report_json() {
        let report = AnomalyReport::new(vec![anomaly(AnomalySeverity::High, 1)], 10);
        let json = report.to_json().unwrap();
        // Serde serializes enum as "SuddenSignalDrop" (Pascal case)
        assert!(json.contains("SuddenSignalDrop"));
        let restored: AnomalyReport = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, report);
    }
}
