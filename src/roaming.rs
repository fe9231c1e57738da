//! Roaming candidate scoring.
//!
//! Ranks the other BSSes of the current cluster as roam targets on a 0-100
//! scale built from signal level, gain over the current link, band, WiFi
//! generation and fast-roaming support.

use crate::cluster::{ApCluster, ClusteredBss, WifiBand, WifiStandard};
use crate::config::ScoringWeights;
use crate::error::Result;
use crate::observation::Bssid;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// RSSI mapped to zero signal points (dBm).
const SIGNAL_FLOOR_DBM: f64 = -90.0;
/// RSSI mapped to full signal points (dBm).
const SIGNAL_CEILING_DBM: f64 = -30.0;
/// Gain (dB) at which the improvement term reaches ~63 % of its weight.
const IMPROVEMENT_SCALE_DB: f64 = 10.0;

const FAST_TRANSITION_SHARE: f64 = 0.7;
const NEIGHBOR_REPORT_SHARE: f64 = 0.2;
const BSS_TRANSITION_SHARE: f64 = 0.1;

/// A scored roam target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingCandidate {
    pub bssid: Bssid,
    /// 0-100.
    pub score: f64,
    pub rssi_dbm: i32,
    /// Candidate RSSI minus current RSSI.
    pub rssi_improvement_db: i32,
    pub band: WifiBand,
    pub wifi_standard: WifiStandard,
    pub supports_fast_roaming: bool,
    pub reason: String,
}

/// Scores roam targets with configurable weights.
#[derive(Debug, Clone, Default)]
pub struct RoamingScorer {
    weights: ScoringWeights,
}

impl RoamingScorer {
    pub fn new(weights: ScoringWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score every other BSS of `cluster` that reports an RSSI, best first.
    ///
    /// Ties on score fall back to stronger RSSI, then lower BSSID.
    pub fn score_roaming_candidates(
        &self,
        current_bssid: &Bssid,
        cluster: &ApCluster,
        current_rssi_dbm: i32,
    ) -> Vec<RoamingCandidate> {
        let mut candidates: Vec<RoamingCandidate> = cluster
            .others(current_bssid)
            .filter_map(|bss| self.score_candidate(bss, current_rssi_dbm))
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(b.rssi_dbm.cmp(&a.rssi_dbm))
                .then_with(|| a.bssid.cmp(&b.bssid))
        });

        debug!(
            "scored {} roaming candidates from {} at {} dBm",
            candidates.len(),
            current_bssid,
            current_rssi_dbm
        );
        candidates
    }

    /// Top-ranked candidate, if any.
    pub fn find_best_candidate(
        &self,
        current_bssid: &Bssid,
        cluster: &ApCluster,
        current_rssi_dbm: i32,
    ) -> Option<RoamingCandidate> {
        self.score_roaming_candidates(current_bssid, cluster, current_rssi_dbm)
            .into_iter()
            .next()
    }

    fn score_candidate(&self, bss: &ClusteredBss, current_rssi_dbm: i32) -> Option<RoamingCandidate> {
        let rssi_dbm = bss.rssi_dbm?;
        let w = &self.weights;
        let gain = rssi_dbm - current_rssi_dbm;

        let signal = ((rssi_dbm as f64 - SIGNAL_FLOOR_DBM) / (SIGNAL_CEILING_DBM - SIGNAL_FLOOR_DBM))
            .clamp(0.0, 1.0)
            * w.signal;
        let improvement = if gain > 0 {
            w.improvement * (1.0 - (-(gain as f64) / IMPROVEMENT_SCALE_DB).exp())
        } else {
            gain as f64
        };
        let band = bss.band.preference() * w.band;
        let standard = bss.wifi_standard.preference() * w.standard;

        let caps = &bss.roaming_capabilities;
        let mut fast = 0.0;
        if caps.supports_11r {
            fast += FAST_TRANSITION_SHARE;
        }
        if caps.supports_11k {
            fast += NEIGHBOR_REPORT_SHARE;
        }
        if caps.supports_11v {
            fast += BSS_TRANSITION_SHARE;
        }
        let fast_roaming = fast * w.fast_roaming;

        let penalty = if rssi_dbm < w.very_weak_signal_dbm {
            w.very_weak_signal_penalty
        } else if rssi_dbm < w.weak_signal_dbm {
            w.weak_signal_penalty
        } else {
            0.0
        };

        let score = (signal + improvement + band + standard + fast_roaming - penalty).clamp(0.0, 100.0);

        Some(RoamingCandidate {
            bssid: bss.bssid.clone(),
            score,
            rssi_dbm,
            rssi_improvement_db: gain,
            band: bss.band,
            wifi_standard: bss.wifi_standard,
            supports_fast_roaming: caps.has_fast_roaming(),
            reason: self.reason(bss, rssi_dbm, gain),
        })
    }

    fn reason(&self, bss: &ClusteredBss, rssi_dbm: i32, gain: i32) -> String {
        let mut factors = Vec::new();
        if gain > 0 {
            factors.push(format!("{} dB stronger", gain));
        } else if gain < 0 {
            factors.push(format!("{} dB weaker", -gain));
        }
        if bss.band != WifiBand::Band2_4GHz {
            factors.push(format!("{} band", bss.band));
        }
        if bss.wifi_standard >= WifiStandard::Wifi6 {
            factors.push(bss.wifi_standard.to_string());
        }
        if bss.roaming_capabilities.has_fast_roaming() {
            factors.push("802.11r fast transition".to_string());
        }
        if rssi_dbm < self.weights.weak_signal_dbm {
            factors.push("weak signal".to_string());
        }

        if factors.is_empty() {
            "comparable to current link".to_string()
        } else {
            factors.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::RoamingCapabilities;
    use approx::assert_abs_diff_eq;

    fn bss(mac: &str, band: WifiBand, rssi: i32) -> ClusteredBss {
        let (channel, freq) = match band {
            WifiBand::Band2_4GHz => (6, 2437),
            WifiBand::Band5GHz => (36, 5180),
            WifiBand::Band6GHz => (37, 6135),
        };
        ClusteredBss::new(mac, band, channel, freq).with_rssi(rssi)
    }

    fn cluster(bss: Vec<ClusteredBss>) -> ApCluster {
        ApCluster::new("c1", "corp", "wpa3", bss).unwrap()
    }

    fn current() -> Bssid {
        Bssid::new("cur")
    }

    #[test]
    fn test_score_components() {
        let c = cluster(vec![
            bss("cur", WifiBand::Band5GHz, -75),
            bss("x", WifiBand::Band5GHz, -60)
                .with_standard(WifiStandard::Wifi6)
                .with_capabilities(RoamingCapabilities::full()),
        ]);
        let candidates = RoamingScorer::default().score_roaming_candidates(&current(), &c, -75);

        assert_eq!(candidates.len(), 1);
        let x = &candidates[0];
        // 20 signal + 19.42 gain + 10 band + 8 standard + 10 fast roaming
        assert_abs_diff_eq!(x.score, 67.42, epsilon = 0.01);
        assert_eq!(x.rssi_improvement_db, 15);
        assert!(x.supports_fast_roaming);
        assert!(x.reason.contains("15 dB stronger"));
        assert!(x.reason.contains("802.11r"));
    }

    #[test]
    fn test_weak_candidate_penalized_and_clamped() {
        let c = cluster(vec![
            bss("cur", WifiBand::Band5GHz, -50),
            bss("weak", WifiBand::Band2_4GHz, -85),
        ]);
        let candidates = RoamingScorer::default().score_roaming_candidates(&current(), &c, -50);
        // 1.67 signal - 35 loss - 20 penalty, clamped
        assert_eq!(candidates[0].score, 0.0);
        assert!(candidates[0].reason.contains("weak signal"));
    }

    #[test]
    fn test_candidates_without_rssi_skipped() {
        let c = cluster(vec![
            bss("cur", WifiBand::Band5GHz, -70),
            ClusteredBss::new("silent", WifiBand::Band5GHz, 40, 5200),
        ]);
        let scorer = RoamingScorer::default();
        assert!(scorer.score_roaming_candidates(&current(), &c, -70).is_empty());
        assert!(scorer.find_best_candidate(&current(), &c, -70).is_none());
    }

    #[test]
    fn test_ranking_prefers_better_band_and_signal() {
        let c = cluster(vec![
            bss("cur", WifiBand::Band2_4GHz, -78),
            bss("a", WifiBand::Band2_4GHz, -62),
            bss("b", WifiBand::Band6GHz, -62),
            bss("c", WifiBand::Band5GHz, -70),
        ]);
        let order: Vec<String> = RoamingScorer::default()
            .score_roaming_candidates(&current(), &c, -78)
            .into_iter()
            .map(|c| c.bssid.to_string())
            .collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_tie_break_by_bssid() {
        let c = cluster(vec![
            bss("cur", WifiBand::Band5GHz, -70),
            bss("zz", WifiBand::Band5GHz, -60),
            bss("aa", WifiBand::Band5GHz, -60),
        ]);
        let best = RoamingScorer::default()
            .find_best_candidate(&current(), &c, -70)
            .unwrap();
        assert_eq!(best.bssid, Bssid::new("aa"));
    }

    #[test]
    fn test_scores_bounded() {
        let c = cluster(vec![
            bss("cur", WifiBand::Band2_4GHz, -95),
            bss("best", WifiBand::Band6GHz, -20)
                .with_standard(WifiStandard::Wifi7)
                .with_capabilities(RoamingCapabilities::full()),
        ]);
        let best = RoamingScorer::default()
            .find_best_candidate(&current(), &c, -95)
            .unwrap();
        assert!(best.score <= 100.0);
        assert!(best.score > 99.0);
    }

    #[test]
    fn test_invalid_weights() {
        assert!(RoamingScorer::new(ScoringWeights {
            band: -1.0,
            ..Default::default()
        })
        .is_err());
    }
}
