//! Access point clusters.
//!
//! A cluster groups the radio interfaces (BSSes) believed to belong to the
//! same logical deployment: same SSID, same security fingerprint. Clusters
//! arrive fully formed from the scanner side and are read-only here.

use crate::error::{DataError, Result, WifiIntelError};
use crate::observation::Bssid;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Frequency band of a BSS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WifiBand {
    /// 2.4 GHz (channels 1-14)
    Band2_4GHz,
    /// 5 GHz (channels 32-177)
    Band5GHz,
    /// 6 GHz (Wi-Fi 6E / 7)
    Band6GHz,
}

impl WifiBand {
    /// Infer the band from a centre frequency.
    pub fn from_frequency_mhz(frequency_mhz: u32) -> Option<Self> {
        match frequency_mhz {
            2400..=2500 => Some(Self::Band2_4GHz),
            5150..=5895 => Some(Self::Band5GHz),
            5925..=7125 => Some(Self::Band6GHz),
            _ => None,
        }
    }

    /// Relative preference for roaming, 0.0 (2.4 GHz) to 1.0 (6 GHz).
    pub fn preference(&self) -> f64 {
        match self {
            Self::Band2_4GHz => 0.0,
            Self::Band5GHz => 2.0 / 3.0,
            Self::Band6GHz => 1.0,
        }
    }
}

impl fmt::Display for WifiBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Band2_4GHz => write!(f, "2.4 GHz"),
            Self::Band5GHz => write!(f, "5 GHz"),
            Self::Band6GHz => write!(f, "6 GHz"),
        }
    }
}

/// Operating channel width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelWidth {
    Mhz20,
    Mhz40,
    Mhz80,
    Mhz160,
    Mhz320,
}

impl ChannelWidth {
    pub fn mhz(&self) -> u32 {
        match self {
            Self::Mhz20 => 20,
            Self::Mhz40 => 40,
            Self::Mhz80 => 80,
            Self::Mhz160 => 160,
            Self::Mhz320 => 320,
        }
    }
}

/// 802.11 generation, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WifiStandard {
    /// 802.11a/b/g
    Legacy,
    /// 802.11n (Wi-Fi 4)
    Wifi4,
    /// 802.11ac (Wi-Fi 5)
    Wifi5,
    /// 802.11ax (Wi-Fi 6 / 6E)
    Wifi6,
    /// 802.11be (Wi-Fi 7)
    Wifi7,
}

impl WifiStandard {
    /// Marketing generation number, 0 for legacy.
    pub fn generation(&self) -> u8 {
        match self {
            Self::Legacy => 0,
            Self::Wifi4 => 4,
            Self::Wifi5 => 5,
            Self::Wifi6 => 6,
            Self::Wifi7 => 7,
        }
    }

    /// Position between legacy (0.0) and Wi-Fi 7 (1.0).
    pub fn preference(&self) -> f64 {
        match self {
            Self::Legacy => 0.0,
            Self::Wifi4 => 0.25,
            Self::Wifi5 => 0.5,
            Self::Wifi6 => 0.8,
            Self::Wifi7 => 1.0,
        }
    }
}

impl fmt::Display for WifiStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy 802.11"),
            other => write!(f, "Wi-Fi {}", other.generation()),
        }
    }
}

/// Fast-roaming amendments advertised by a BSS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoamingCapabilities {
    /// 802.11k neighbor reports
    pub supports_11k: bool,
    /// 802.11r fast BSS transition
    pub supports_11r: bool,
    /// 802.11v BSS transition management
    pub supports_11v: bool,
}

impl RoamingCapabilities {
    pub fn new(supports_11k: bool, supports_11r: bool, supports_11v: bool) -> Self {
        Self {
            supports_11k,
            supports_11r,
            supports_11v,
        }
    }

    /// All three amendments.
    pub fn full() -> Self {
        Self::new(true, true, true)
    }

    pub fn has_fast_roaming(&self) -> bool {
        self.supports_11r
    }

    pub fn count(&self) -> usize {
        [self.supports_11k, self.supports_11r, self.supports_11v]
            .iter()
            .filter(|s| **s)
            .count()
    }
}

/// One radio interface of an access point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredBss {
    pub bssid: Bssid,
    pub band: WifiBand,
    pub channel: u16,
    pub frequency_mhz: u32,
    pub channel_width: ChannelWidth,
    pub wifi_standard: WifiStandard,
    /// Absent when the last scan did not report a level for this BSS.
    pub rssi_dbm: Option<i32>,
    pub roaming_capabilities: RoamingCapabilities,
    pub last_seen_ms: u64,
}

impl ClusteredBss {
    /// A 20 MHz Wi-Fi 4 BSS without roaming support; refine with the
    /// `with_*` methods.
    pub fn new(bssid: impl Into<Bssid>, band: WifiBand, channel: u16, frequency_mhz: u32) -> Self {
        Self {
            bssid: bssid.into(),
            band,
            channel,
            frequency_mhz,
            channel_width: ChannelWidth::Mhz20,
            wifi_standard: WifiStandard::Wifi4,
            rssi_dbm: None,
            roaming_capabilities: RoamingCapabilities::default(),
            last_seen_ms: 0,
        }
    }

    pub fn with_rssi(mut self, rssi_dbm: i32) -> Self {
        self.rssi_dbm = Some(rssi_dbm);
        self
    }

    pub fn with_standard(mut self, wifi_standard: WifiStandard) -> Self {
        self.wifi_standard = wifi_standard;
        self
    }

    pub fn with_channel_width(mut self, channel_width: ChannelWidth) -> Self {
        self.channel_width = channel_width;
        self
    }

    pub fn with_capabilities(mut self, roaming_capabilities: RoamingCapabilities) -> Self {
        self.roaming_capabilities = roaming_capabilities;
        self
    }

    pub fn seen_at(mut self, last_seen_ms: u64) -> Self {
        self.last_seen_ms = last_seen_ms;
        self
    }
}

/// BSSes of one logical deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawApCluster")]
pub struct ApCluster {
    id: String,
    ssid: String,
    security_fingerprint: String,
    bssids: Vec<ClusteredBss>,
}

#[derive(Deserialize)]
struct RawApCluster {
    id: String,
    ssid: String,
    security_fingerprint: String,
    bssids: Vec<ClusteredBss>,
}

impl TryFrom<RawApCluster> for ApCluster {
    type Error = WifiIntelError;

    fn try_from(raw: RawApCluster) -> Result<Self> {
        Self::new(raw.id, raw.ssid, raw.security_fingerprint, raw.bssids)
    }
}

impl ApCluster {
    /// Build a cluster; rejects an empty or duplicated BSS list.
    pub fn new(
        id: impl Into<String>,
        ssid: impl Into<String>,
        security_fingerprint: impl Into<String>,
        bssids: Vec<ClusteredBss>,
    ) -> Result<Self> {
        let id = id.into();
        if bssids.is_empty() {
            return Err(DataError::EmptyCluster { cluster_id: id }.into());
        }

        let mut seen = HashSet::with_capacity(bssids.len());
        for bss in &bssids {
            if !seen.insert(&bss.bssid) {
                return Err(DataError::DuplicateBss {
                    cluster_id: id,
                    bssid: bss.bssid.to_string(),
                }
                .into());
            }
        }

        Ok(Self {
            id,
            ssid: ssid.into(),
            security_fingerprint: security_fingerprint.into(),
            bssids,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn security_fingerprint(&self) -> &str {
        &self.security_fingerprint
    }

    pub fn bssids(&self) -> &[ClusteredBss] {
        &self.bssids
    }

    pub fn len(&self) -> usize {
        self.bssids.len()
    }

    /// Never true for a cluster built through [`ApCluster::new`].
    pub fn is_empty(&self) -> bool {
        self.bssids.is_empty()
    }

    pub fn get(&self, bssid: &Bssid) -> Option<&ClusteredBss> {
        self.bssids.iter().find(|b| &b.bssid == bssid)
    }

    pub fn contains(&self, bssid: &Bssid) -> bool {
        self.get(bssid).is_some()
    }

    /// Every BSS except `bssid`, in cluster order.
    pub fn others<'a>(&'a self, bssid: &'a Bssid) -> impl Iterator<Item = &'a ClusteredBss> + 'a {
        self.bssids.iter().filter(move |b| &b.bssid != bssid)
    }

    /// Strongest BSS with a known RSSI.
    pub fn strongest(&self) -> Option<&ClusteredBss> {
        self.bssids
            .iter()
            .filter(|b| b.rssi_dbm.is_some())
            .max_by_key(|b| b.rssi_dbm)
    }

    pub fn bssid_set(&self) -> BTreeSet<Bssid> {
        self.bssids.iter().map(|b| b.bssid.clone()).collect()
    }

    pub fn bands(&self) -> BTreeSet<WifiBand> {
        self.bssids.iter().map(|b| b.band).collect()
    }
}
