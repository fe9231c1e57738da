//! Per-AP observation histories.
//!
//! An [`ApHistory`] is the unit every analyzer consumes: an ordered,
//! non-empty run of RSSI samples for one BSSID plus the roaming events
//! recorded against it. Histories never change in place; adding data
//! produces a new value.

use crate::error::{DataError, Result, WifiIntelError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one radio interface (a MAC address), stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bssid(String);

impl Bssid {
    /// Create a BSSID, normalizing case and surrounding whitespace.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Bssid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Bssid {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// One scan sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalObservation {
    pub bssid: Bssid,
    pub timestamp_ms: u64,
    pub rssi_dbm: i32,
}

impl SignalObservation {
    pub fn new(bssid: impl Into<Bssid>, timestamp_ms: u64, rssi_dbm: i32) -> Self {
        Self {
            bssid: bssid.into(),
            timestamp_ms,
            rssi_dbm,
        }
    }

    /// Wall-clock time of the sample.
    #[cfg(feature = "timestamps")]
    pub fn observed_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms as i64)
    }
}

/// A single client transition between two BSSes of the same network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoamingEvent {
    pub timestamp_ms: u64,
    pub from_bssid: Bssid,
    pub to_bssid: Bssid,
    pub ssid: String,
    /// Time the client spent without a usable association.
    pub duration_ms: u64,
    pub rssi_before_dbm: i32,
    pub rssi_after_dbm: i32,
    pub was_forced_disconnect: bool,
    pub has_11r: bool,
    pub has_11k: bool,
    pub has_11v: bool,
}

impl RoamingEvent {
    /// Create an event with no 802.11k/r/v assistance.
    pub fn new(
        timestamp_ms: u64,
        from_bssid: impl Into<Bssid>,
        to_bssid: impl Into<Bssid>,
        ssid: impl Into<String>,
        duration_ms: u64,
        rssi_before_dbm: i32,
        rssi_after_dbm: i32,
    ) -> Self {
        Self {
            timestamp_ms,
            from_bssid: from_bssid.into(),
            to_bssid: to_bssid.into(),
            ssid: ssid.into(),
            duration_ms,
            rssi_before_dbm,
            rssi_after_dbm,
            was_forced_disconnect: false,
            has_11r: false,
            has_11k: false,
            has_11v: false,
        }
    }

    /// Mark which fast-roaming amendments were used.
    pub fn with_assistance(mut self, has_11r: bool, has_11k: bool, has_11v: bool) -> Self {
        self.has_11r = has_11r;
        self.has_11k = has_11k;
        self.has_11v = has_11v;
        self
    }

    /// Mark the event as a forced disconnect (deauth or link loss).
    pub fn forced(mut self) -> Self {
        self.was_forced_disconnect = true;
        self
    }

    pub fn rssi_improvement_db(&self) -> i32 {
        self.rssi_after_dbm - self.rssi_before_dbm
    }

    /// 802.11r transitions count as seamless.
    pub fn is_seamless(&self) -> bool {
        self.has_11r
    }

    /// Quality of the transition in [0, 100].
    ///
    /// Latency dominates; a forced disconnect costs 30 points and the
    /// signal gained or lost moves the result by up to 10.
    pub fn quality_score(&self) -> f64 {
        let base = match self.duration_ms {
            0..=50 => 100.0,
            51..=100 => 90.0,
            101..=300 => 70.0,
            301..=1000 => 45.0,
            _ => 20.0,
        };
        let forced_penalty = if self.was_forced_disconnect { 30.0 } else { 0.0 };
        let signal_adjustment = self.rssi_improvement_db().clamp(-10, 10) as f64;
        (base - forced_penalty + signal_adjustment).clamp(0.0, 100.0)
    }

    /// True when both events connect the same two BSSIDs, in either direction.
    pub fn same_pair(&self, other: &RoamingEvent) -> bool {
        (self.from_bssid == other.from_bssid && self.to_bssid == other.to_bssid)
            || (self.from_bssid == other.to_bssid && self.to_bssid == other.from_bssid)
    }
}

/// Ordered observation history of one BSSID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawApHistory")]
pub struct ApHistory {
    bssid: Bssid,
    ssid: Option<String>,
    observations: Vec<SignalObservation>,
    first_seen_ms: u64,
    last_seen_ms: u64,
    roaming_events: Vec<RoamingEvent>,
}

/// Serialized form of [`ApHistory`], checked before it becomes one.
#[derive(Deserialize)]
struct RawApHistory {
    bssid: Bssid,
    #[serde(default)]
    ssid: Option<String>,
    observations: Vec<SignalObservation>,
    first_seen_ms: u64,
    last_seen_ms: u64,
    #[serde(default)]
    roaming_events: Vec<RoamingEvent>,
}

impl TryFrom<RawApHistory> for ApHistory {
    type Error = WifiIntelError;

    fn try_from(raw: RawApHistory) -> Result<Self> {
        let mut history = Self::from_observations(raw.bssid, raw.observations)?;
        if raw.first_seen_ms != history.first_seen_ms || raw.last_seen_ms != history.last_seen_ms {
            return Err(DataError::SeenRangeMismatch {
                bssid: history.bssid.to_string(),
                first_seen_ms: raw.first_seen_ms,
                last_seen_ms: raw.last_seen_ms,
                observed_first_ms: history.first_seen_ms,
                observed_last_ms: history.last_seen_ms,
            }
            .into());
        }

        history.ssid = raw.ssid;
        history.roaming_events = raw.roaming_events;
        history.roaming_events.sort_by_key(|e| e.timestamp_ms);
        Ok(history)
    }
}

impl ApHistory {
    /// Start a history from its first observation.
    pub fn new(first: SignalObservation) -> Self {
        Self {
            bssid: first.bssid.clone(),
            ssid: None,
            first_seen_ms: first.timestamp_ms,
            last_seen_ms: first.timestamp_ms,
            observations: vec![first],
            roaming_events: Vec::new(),
        }
    }

    /// Build a history from a batch of observations.
    ///
    /// The batch must be non-empty, belong to `bssid` and be ordered by time.
    pub fn from_observations(
        bssid: impl Into<Bssid>,
        observations: Vec<SignalObservation>,
    ) -> Result<Self> {
        let bssid = bssid.into();
        let (first_seen_ms, last_seen_ms) = match (observations.first(), observations.last()) {
            (Some(first), Some(last)) => (first.timestamp_ms, last.timestamp_ms),
            _ => {
                return Err(DataError::EmptyHistory {
                    bssid: bssid.to_string(),
                }
                .into())
            }
        };

        let mut previous_ms = first_seen_ms;
        for obs in &observations {
            if obs.bssid != bssid {
                return Err(DataError::BssidMismatch {
                    expected: bssid.to_string(),
                    found: obs.bssid.to_string(),
                }
                .into());
            }
            if obs.timestamp_ms < previous_ms {
                return Err(DataError::OutOfOrder {
                    timestamp_ms: obs.timestamp_ms,
                    last_seen_ms: previous_ms,
                }
                .into());
            }
            previous_ms = obs.timestamp_ms;
        }

        Ok(Self {
            bssid,
            ssid: None,
            observations,
            first_seen_ms,
            last_seen_ms,
            roaming_events: Vec::new(),
        })
    }

    /// Attach the network name.
    pub fn with_ssid(mut self, ssid: impl Into<String>) -> Self {
        self.ssid = Some(ssid.into());
        self
    }

    /// Return a new history with `observation` appended.
    pub fn with_observation(&self, observation: SignalObservation) -> Result<Self> {
        if observation.bssid != self.bssid {
            return Err(DataError::BssidMismatch {
                expected: self.bssid.to_string(),
                found: observation.bssid.to_string(),
            }
            .into());
        }
        if observation.timestamp_ms < self.last_seen_ms {
            return Err(DataError::OutOfOrder {
                timestamp_ms: observation.timestamp_ms,
                last_seen_ms: self.last_seen_ms,
            }
            .into());
        }

        let mut next = self.clone();
        next.last_seen_ms = observation.timestamp_ms;
        next.observations.push(observation);
        Ok(next)
    }

    /// Return a new history with `event` recorded.
    pub fn with_roaming_event(&self, event: RoamingEvent) -> Self {
        let mut next = self.clone();
        let at = next
            .roaming_events
            .partition_point(|e| e.timestamp_ms <= event.timestamp_ms);
        next.roaming_events.insert(at, event);
        next
    }

    pub fn bssid(&self) -> &Bssid {
        &self.bssid
    }

    pub fn ssid(&self) -> Option<&str> {
        self.ssid.as_deref()
    }

    pub fn observations(&self) -> &[SignalObservation] {
        &self.observations
    }

    pub fn roaming_events(&self) -> &[RoamingEvent] {
        &self.roaming_events
    }

    pub fn first_seen_ms(&self) -> u64 {
        self.first_seen_ms
    }

    pub fn last_seen_ms(&self) -> u64 {
        self.last_seen_ms
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Never true for a history built through the constructors.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Most recent observation.
    pub fn latest(&self) -> &SignalObservation {
        // Non-empty by construction.
        &self.observations[self.observations.len() - 1]
    }

    /// Observations with `start_ms <= timestamp <= end_ms`.
    pub fn observations_between(&self, start_ms: u64, end_ms: u64) -> &[SignalObservation] {
        if start_ms > end_ms {
            return &[];
        }
        let lo = self
            .observations
            .partition_point(|o| o.timestamp_ms < start_ms);
        let hi = self
            .observations
            .partition_point(|o| o.timestamp_ms <= end_ms);
        &self.observations[lo..hi]
    }

    /// Observations taken at or before `end_ms`.
    pub fn observations_until(&self, end_ms: u64) -> &[SignalObservation] {
        self.observations_between(0, end_ms)
    }

    pub fn rssi_values(&self) -> Vec<f64> {
        crate::stats::rssi_values(&self.observations)
    }

    pub fn duration_ms(&self) -> u64 {
        self.last_seen_ms - self.first_seen_ms
    }

    /// Whether the AP was seen within `threshold_ms` of `now_ms`.
    pub fn is_visible(&self, now_ms: u64, threshold_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_seen_ms) <= threshold_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AP: &str = "AA:BB:CC:00:00:01";

    fn series(points: &[(u64, i32)]) -> Vec<SignalObservation> {
        points
            .iter()
            .map(|&(t, rssi)| SignalObservation::new(AP, t, rssi))
            .collect()
    }

    #[test]
    fn test_bssid_normalized() {
        assert_eq!(Bssid::new(" AA:BB:CC:00:00:01 "), Bssid::new("aa:bb:cc:00:00:01"));
        assert_eq!(Bssid::new(AP).to_string(), "aa:bb:cc:00:00:01");
    }

    #[test]
    fn test_from_observations() {
        let history =
            ApHistory::from_observations(AP, series(&[(1000, -70), (2000, -65), (3000, -60)]))
                .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.first_seen_ms(), 1000);
        assert_eq!(history.last_seen_ms(), 3000);
        assert_eq!(history.latest().rssi_dbm, -60);
    }

    #[test]
    fn test_empty_history_rejected() {
        let err = ApHistory::from_observations(AP, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            crate::WifiIntelError::Data(DataError::EmptyHistory { .. })
        ));
    }

    #[test]
    fn test_foreign_bssid_rejected() {
        let mut obs = series(&[(1000, -70)]);
        obs.push(SignalObservation::new("aa:bb:cc:00:00:02", 2000, -60));
        let err = ApHistory::from_observations(AP, obs).unwrap_err();
        assert!(matches!(
            err,
            crate::WifiIntelError::Data(DataError::BssidMismatch { .. })
        ));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let err =
            ApHistory::from_observations(AP, series(&[(2000, -70), (1000, -60)])).unwrap_err();
        assert!(matches!(
            err,
            crate::WifiIntelError::Data(DataError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_with_observation_is_copy_on_write() {
        let original = ApHistory::new(SignalObservation::new(AP, 1000, -70));
        let grown = original
            .with_observation(SignalObservation::new(AP, 2000, -60))
            .unwrap();

        assert_eq!(original.len(), 1);
        assert_eq!(original.last_seen_ms(), 1000);
        assert_eq!(grown.len(), 2);
        assert_eq!(grown.last_seen_ms(), 2000);
        assert_eq!(grown.first_seen_ms(), 1000);
    }

    #[test]
    fn test_with_observation_rejects_older_sample() {
        let history = ApHistory::new(SignalObservation::new(AP, 5000, -70));
        assert!(history
            .with_observation(SignalObservation::new(AP, 4000, -60))
            .is_err());
    }

    #[test]
    fn test_observations_between() {
        let history = ApHistory::from_observations(
            AP,
            series(&[(1000, -70), (2000, -65), (3000, -60), (4000, -55)]),
        )
        .unwrap();

        let window = history.observations_between(2000, 3000);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].timestamp_ms, 2000);
        assert!(history.observations_between(5000, 6000).is_empty());
        assert!(history.observations_between(3000, 2000).is_empty());
        assert_eq!(history.observations_until(2500).len(), 2);
    }

    #[test]
    fn test_roaming_events_kept_sorted() {
        let history = ApHistory::new(SignalObservation::new(AP, 1000, -70))
            .with_roaming_event(RoamingEvent::new(5000, AP, "b", "corp", 40, -75, -60))
            .with_roaming_event(RoamingEvent::new(3000, "b", AP, "corp", 40, -75, -60));
        let stamps: Vec<u64> = history.roaming_events().iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(stamps, vec![3000, 5000]);
    }

    #[test]
    fn test_visibility() {
        let history = ApHistory::new(SignalObservation::new(AP, 10_000, -70));
        assert!(history.is_visible(12_000, 5_000));
        assert!(!history.is_visible(20_000, 5_000));
    }

    #[test]
    fn test_roaming_quality_score() {
        let fast = RoamingEvent::new(1000, "a", "b", "corp", 30, -75, -60)
            .with_assistance(true, true, true);
        assert!(fast.is_seamless());
        assert_eq!(fast.quality_score(), 100.0);

        let slow = RoamingEvent::new(1000, "a", "b", "corp", 2500, -70, -72).forced();
        assert!(!slow.is_seamless());
        assert_eq!(slow.quality_score(), 0.0);

        let medium = RoamingEvent::new(1000, "a", "b", "corp", 200, -70, -65);
        assert_eq!(medium.quality_score(), 75.0);
    }

    #[test]
    fn test_same_pair() {
        let ab = RoamingEvent::new(1000, "a", "b", "corp", 30, -75, -60);
        let ba = RoamingEvent::new(2000, "b", "a", "corp", 30, -75, -60);
        let ac = RoamingEvent::new(3000, "a", "c", "corp", 30, -75, -60);
        assert!(ab.same_pair(&ba));
        assert!(!ab.same_pair(&ac));
    }

    #[cfg(feature = "timestamps")]
    #[test]
    fn test_observed_at() {
        let obs = SignalObservation::new(AP, 1_706_745_600_000, -60);
        let at = obs.observed_at().unwrap();
        assert_eq!(at.timestamp_millis(), 1_706_745_600_000);
    }

    #[test]
    fn test_deserialize_validates_history() {
        let history = ApHistory::from_observations(AP, series(&[(1000, -60), (2000, -62)]))
            .unwrap()
            .with_ssid("corp");
        let json = serde_json::to_value(&history).unwrap();
        let parsed: ApHistory = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(parsed, history);

        let empty = r#"{"bssid":"aa","ssid":null,"observations":[],"first_seen_ms":5,"last_seen_ms":1,"roaming_events":[]}"#;
        assert!(serde_json::from_str::<ApHistory>(empty).is_err());

        let mut inverted = json.clone();
        inverted["first_seen_ms"] = 5000.into();
        inverted["last_seen_ms"] = 1000.into();
        assert!(serde_json::from_value::<ApHistory>(inverted).is_err());

        let mut unordered = json.clone();
        unordered["observations"]
            .as_array_mut()
            .unwrap()
            .reverse();
        assert!(serde_json::from_value::<ApHistory>(unordered).is_err());

        let mut foreign = json;
        foreign["bssid"] = "aa:bb:cc:00:00:99".into();
        assert!(serde_json::from_value::<ApHistory>(foreign).is_err());
    }
}
