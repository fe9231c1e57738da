//! Logical network (ESS) view over per-AP histories.

use crate::error::{DataError, Result, WifiIntelError};
use crate::observation::{ApHistory, Bssid, RoamingEvent};
use serde::{Deserialize, Serialize};

/// Observation histories of every AP serving one SSID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNetworkTrend")]
pub struct NetworkTrend {
    ssid: String,
    ap_histories: Vec<ApHistory>,
}

#[derive(Deserialize)]
struct RawNetworkTrend {
    ssid: String,
    ap_histories: Vec<ApHistory>,
}

impl TryFrom<RawNetworkTrend> for NetworkTrend {
    type Error = WifiIntelError;

    fn try_from(raw: RawNetworkTrend) -> Result<Self> {
        Self::new(raw.ssid, raw.ap_histories)
    }
}

impl NetworkTrend {
    /// Build a network view; at least one AP history is required.
    pub fn new(ssid: impl Into<String>, ap_histories: Vec<ApHistory>) -> Result<Self> {
        let ssid = ssid.into();
        if ap_histories.is_empty() {
            return Err(DataError::EmptyNetwork { ssid }.into());
        }
        Ok(Self { ssid, ap_histories })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn ap_histories(&self) -> &[ApHistory] {
        &self.ap_histories
    }

    pub fn ap_count(&self) -> usize {
        self.ap_histories.len()
    }

    pub fn history(&self, bssid: &Bssid) -> Option<&ApHistory> {
        self.ap_histories.iter().find(|h| h.bssid() == bssid)
    }

    pub fn total_observations(&self) -> usize {
        self.ap_histories.iter().map(ApHistory::len).sum()
    }

    /// Roaming events of every AP, ordered by time.
    pub fn all_roaming_events(&self) -> Vec<&RoamingEvent> {
        let mut events: Vec<&RoamingEvent> = self
            .ap_histories
            .iter()
            .flat_map(|h| h.roaming_events().iter())
            .collect();
        events.sort_by_key(|e| e.timestamp_ms);
        events
    }

    /// Most recent `last_seen_ms` across all APs.
    pub fn latest_timestamp_ms(&self) -> u64 {
        self.ap_histories
            .iter()
            .map(ApHistory::last_seen_ms)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::SignalObservation;

    fn history(mac: &str, points: &[(u64, i32)]) -> ApHistory {
        let obs = points
            .iter()
            .map(|&(t, r)| SignalObservation::new(mac, t, r))
            .collect();
        ApHistory::from_observations(mac, obs).unwrap()
    }

    #[test]
    fn test_empty_network_rejected() {
        assert!(NetworkTrend::new("corp", Vec::new()).is_err());
    }

    #[test]
    fn test_network_queries() {
        let a = history("a", &[(1000, -60), (2000, -61)]).with_roaming_event(RoamingEvent::new(
            1500, "a", "b", "corp", 40, -72, -58,
        ));
        let b = history("b", &[(1200, -70), (5000, -65)]).with_roaming_event(RoamingEvent::new(
            1100, "b", "a", "corp", 40, -72, -58,
        ));

        let network = NetworkTrend::new("corp", vec![a, b]).unwrap();
        assert_eq!(network.ap_count(), 2);
        assert_eq!(network.total_observations(), 4);
        assert_eq!(network.latest_timestamp_ms(), 5000);
        assert!(network.history(&Bssid::new("b")).is_some());

        let stamps: Vec<u64> = network
            .all_roaming_events()
            .iter()
            .map(|e| e.timestamp_ms)
            .collect();
        assert_eq!(stamps, vec![1100, 1500]);
    }

    #[test]
    fn test_deserialize_validates_network() {
        let network = NetworkTrend::new("corp", vec![history("a", &[(1000, -60)])]).unwrap();
        let json = serde_json::to_string(&network).unwrap();
        let parsed: NetworkTrend = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, network);

        let empty = r#"{"ssid":"corp","ap_histories":[]}"#;
        assert!(serde_json::from_str::<NetworkTrend>(empty).is_err());
    }
}
