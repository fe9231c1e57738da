//! Sticky client detection.
//!
//! A client is sticky when it holds on to a weak link while a clearly
//! stronger BSS of the same network is in range.

use crate::cluster::{ApCluster, ClusteredBss};
use crate::config::StickyConfig;
use crate::error::Result;
use crate::observation::Bssid;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// One recorded sticky episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickyEvent {
    pub timestamp_ms: u64,
    pub duration_ms: u64,
    /// RSSI of the link the client stayed on (dBm).
    pub sticky_rssi_dbm: i32,
    /// RSSI of the best alternative at the time (dBm).
    pub better_ap_rssi_dbm: i32,
    /// Episode still in progress.
    pub is_ongoing: bool,
}

impl StickyEvent {
    pub fn new(timestamp_ms: u64, duration_ms: u64, sticky_rssi_dbm: i32, better_ap_rssi_dbm: i32) -> Self {
        Self {
            timestamp_ms,
            duration_ms,
            sticky_rssi_dbm,
            better_ap_rssi_dbm,
            is_ongoing: false,
        }
    }

    pub fn ongoing(mut self) -> Self {
        self.is_ongoing = true;
        self
    }

    /// How much stronger the alternative was (dB).
    pub fn missed_gain_db(&self) -> i32 {
        self.better_ap_rssi_dbm - self.sticky_rssi_dbm
    }
}

/// Sticky client findings for one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyClientDetection {
    pub ssid: String,
    pub current_bssid: Option<Bssid>,
    pub currently_sticky: bool,
    pub sticky_events_count: usize,
    pub total_sticky_duration_ms: u64,
    pub avg_sticky_rssi_dbm: f64,
    pub worst_sticky_rssi_dbm: i32,
    pub avg_better_ap_rssi_dbm: f64,
    /// Qualifying alternatives, in cluster order.
    pub better_bssids: Vec<Bssid>,
}

impl StickyClientDetection {
    fn none(ssid: String) -> Self {
        Self {
            ssid,
            current_bssid: None,
            currently_sticky: false,
            sticky_events_count: 0,
            total_sticky_duration_ms: 0,
            avg_sticky_rssi_dbm: 0.0,
            worst_sticky_rssi_dbm: 0,
            avg_better_ap_rssi_dbm: 0.0,
            better_bssids: Vec::new(),
        }
    }

    /// Average gain the client gave up by staying put (dB).
    pub fn missed_gain_db(&self) -> f64 {
        if self.sticky_events_count == 0 {
            return 0.0;
        }
        self.avg_better_ap_rssi_dbm - self.avg_sticky_rssi_dbm
    }
}

/// Detects clients clinging to weak associations.
#[derive(Debug, Clone, Default)]
pub struct StickyClientDetector {
    config: StickyConfig,
}

impl StickyClientDetector {
    pub fn new(config: StickyConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            warn!("rejected sticky configuration: {}", e);
            return Err(e.into());
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &StickyConfig {
        &self.config
    }

    /// Check whether the current association is sticky right now.
    pub fn detect_current_sticky(
        &self,
        ssid: &str,
        current_bssid: &Bssid,
        current_rssi_dbm: i32,
        cluster: &ApCluster,
    ) -> Option<StickyClientDetection> {
        let better = self.better_alternatives(current_bssid, current_rssi_dbm, cluster);
        if better.is_empty() {
            return None;
        }

        let avg_better = better
            .iter()
            .filter_map(|b| b.rssi_dbm)
            .map(f64::from)
            .sum::<f64>()
            / better.len() as f64;

        debug!(
            "sticky on {}: {} dBm with {} better BSSes (avg {:.1} dBm)",
            current_bssid,
            current_rssi_dbm,
            better.len(),
            avg_better
        );

        Some(StickyClientDetection {
            ssid: ssid.to_string(),
            current_bssid: Some(current_bssid.clone()),
            currently_sticky: true,
            sticky_events_count: 1,
            total_sticky_duration_ms: 0,
            avg_sticky_rssi_dbm: current_rssi_dbm as f64,
            worst_sticky_rssi_dbm: current_rssi_dbm,
            avg_better_ap_rssi_dbm: avg_better,
            better_bssids: better.into_iter().map(|b| b.bssid.clone()).collect(),
        })
    }

    /// Aggregate a log of sticky episodes.
    pub fn analyze_sticky_pattern(&self, ssid: &str, events: &[StickyEvent]) -> StickyClientDetection {
        if events.is_empty() {
            return StickyClientDetection::none(ssid.to_string());
        }

        let n = events.len() as f64;
        let avg_sticky = events.iter().map(|e| e.sticky_rssi_dbm as f64).sum::<f64>() / n;
        let avg_better = events.iter().map(|e| e.better_ap_rssi_dbm as f64).sum::<f64>() / n;
        let worst = events
            .iter()
            .map(|e| e.sticky_rssi_dbm)
            .min()
            .unwrap_or_default();

        StickyClientDetection {
            ssid: ssid.to_string(),
            current_bssid: None,
            currently_sticky: events.iter().any(|e| e.is_ongoing),
            sticky_events_count: events.len(),
            total_sticky_duration_ms: events.iter().map(|e| e.duration_ms).sum(),
            avg_sticky_rssi_dbm: avg_sticky,
            worst_sticky_rssi_dbm: worst,
            avg_better_ap_rssi_dbm: avg_better,
            better_bssids: Vec::new(),
        }
    }

    /// Same decision as [`detect_current_sticky`](Self::detect_current_sticky).
    pub fn should_roam(&self, current_rssi_dbm: i32, current_bssid: &Bssid, cluster: &ApCluster) -> bool {
        !self
            .better_alternatives(current_bssid, current_rssi_dbm, cluster)
            .is_empty()
    }

    /// BSSes at least the differential stronger than a weak current link.
    fn better_alternatives<'a>(
        &self,
        current_bssid: &'a Bssid,
        current_rssi_dbm: i32,
        cluster: &'a ApCluster,
    ) -> Vec<&'a ClusteredBss> {
        if current_rssi_dbm > self.config.sticky_rssi_threshold_dbm {
            return Vec::new();
        }
        let required = current_rssi_dbm + self.config.better_ap_differential_db;
        cluster
            .others(current_bssid)
            .filter(|b| b.rssi_dbm.map_or(false, |rssi| rssi >= required))
            .collect()
    }
}
