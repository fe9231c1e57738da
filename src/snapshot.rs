//! Point-in-time scan captures and their differences.

use crate::cluster::{ApCluster, ClusteredBss};
use crate::observation::Bssid;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Every cluster visible in one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub timestamp_ms: u64,
    pub clusters: Vec<ApCluster>,
    /// BSS the scanning client was associated with, if any.
    pub connected_bssid: Option<Bssid>,
}

impl ScanSnapshot {
    pub fn new(timestamp_ms: u64, clusters: Vec<ApCluster>) -> Self {
        Self {
            timestamp_ms,
            clusters,
            connected_bssid: None,
        }
    }

    pub fn with_connected(mut self, bssid: impl Into<Bssid>) -> Self {
        self.connected_bssid = Some(bssid.into());
        self
    }

    /// All BSSes across clusters.
    pub fn all_bss(&self) -> impl Iterator<Item = &ClusteredBss> {
        self.clusters.iter().flat_map(|c| c.bssids().iter())
    }

    pub fn bssid_set(&self) -> BTreeSet<Bssid> {
        self.all_bss().map(|b| b.bssid.clone()).collect()
    }

    pub fn bss_count(&self) -> usize {
        self.bssid_set().len()
    }

    pub fn rssi_of(&self, bssid: &Bssid) -> Option<i32> {
        self.all_bss()
            .find(|b| &b.bssid == bssid)
            .and_then(|b| b.rssi_dbm)
    }

    /// Cluster containing `bssid`.
    pub fn cluster_of(&self, bssid: &Bssid) -> Option<&ApCluster> {
        self.clusters.iter().find(|c| c.contains(bssid))
    }

    /// Diff this snapshot (before) against a later one (after).
    pub fn compare(&self, after: &ScanSnapshot) -> SnapshotComparison {
        let before_rssi = rssi_map(self);
        let after_rssi = rssi_map(after);

        let before_set: BTreeSet<Bssid> = before_rssi.keys().cloned().collect();
        let after_set: BTreeSet<Bssid> = after_rssi.keys().cloned().collect();

        let added: BTreeSet<Bssid> = after_set.difference(&before_set).cloned().collect();
        let removed: BTreeSet<Bssid> = before_set.difference(&after_set).cloned().collect();
        let persistent: BTreeSet<Bssid> = before_set.intersection(&after_set).cloned().collect();

        let rssi_deltas = persistent
            .iter()
            .filter_map(|bssid| match (before_rssi[bssid], after_rssi[bssid]) {
                (Some(before), Some(after)) => Some(RssiDelta {
                    bssid: bssid.clone(),
                    before_dbm: before,
                    after_dbm: after,
                }),
                _ => None,
            })
            .collect();

        SnapshotComparison {
            before_timestamp_ms: self.timestamp_ms,
            after_timestamp_ms: after.timestamp_ms,
            total_before: before_set.len(),
            total_after: after_set.len(),
            added,
            removed,
            persistent,
            rssi_deltas,
            connected_bssid: after.connected_bssid.clone(),
        }
    }
}

fn rssi_map(snapshot: &ScanSnapshot) -> BTreeMap<Bssid, Option<i32>> {
    snapshot
        .all_bss()
        .map(|b| (b.bssid.clone(), b.rssi_dbm))
        .collect()
}

/// RSSI change of a BSS present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RssiDelta {
    pub bssid: Bssid,
    pub before_dbm: i32,
    pub after_dbm: i32,
}

impl RssiDelta {
    /// `after - before`; negative when the signal dropped.
    pub fn delta_db(&self) -> i32 {
        self.after_dbm - self.before_dbm
    }
}

/// Result of [`ScanSnapshot::compare`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotComparison {
    pub before_timestamp_ms: u64,
    pub after_timestamp_ms: u64,
    pub total_before: usize,
    pub total_after: usize,
    pub added: BTreeSet<Bssid>,
    pub removed: BTreeSet<Bssid>,
    pub persistent: BTreeSet<Bssid>,
    /// Persistent BSSes with an RSSI in both snapshots, in BSSID order.
    pub rssi_deltas: Vec<RssiDelta>,
    /// Association of the later snapshot.
    pub connected_bssid: Option<Bssid>,
}

impl SnapshotComparison {
    /// Number of BSSes that appeared or disappeared.
    pub fn churn_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// Churn relative to the earlier snapshot, in percent.
    ///
    /// Zero when the earlier snapshot was empty.
    pub fn churn_percentage(&self) -> f64 {
        if self.total_before == 0 {
            return 0.0;
        }
        self.churn_count() as f64 / self.total_before as f64 * 100.0
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.after_timestamp_ms
            .saturating_sub(self.before_timestamp_ms)
    }

    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::WifiBand;

    fn snapshot(timestamp_ms: u64, entries: &[(&str, Option<i32>)]) -> ScanSnapshot {
        let bss = entries
            .iter()
            .map(|(mac, rssi)| {
                let b = ClusteredBss::new(*mac, WifiBand::Band5GHz, 36, 5180);
                match rssi {
                    Some(r) => b.with_rssi(*r),
                    None => b,
                }
            })
            .collect();
        let cluster = ApCluster::new("c1", "corp", "wpa2", bss).unwrap();
        ScanSnapshot::new(timestamp_ms, vec![cluster])
    }

    #[test]
    fn test_compare_sets() {
        let before = snapshot(1000, &[("a", Some(-60)), ("b", Some(-70))]);
        let after = snapshot(2000, &[("a", Some(-62)), ("c", Some(-55))]);

        let cmp = before.compare(&after);
        assert_eq!(cmp.added, BTreeSet::from([Bssid::new("c")]));
        assert_eq!(cmp.removed, BTreeSet::from([Bssid::new("b")]));
        assert_eq!(cmp.persistent, BTreeSet::from([Bssid::new("a")]));
        assert_eq!(cmp.churn_count(), 2);
        assert!((cmp.churn_percentage() - 100.0).abs() < 1e-9);
        assert_eq!(cmp.elapsed_ms(), 1000);
        assert!(!cmp.is_unchanged());
    }

    #[test]
    fn test_level_changes_alone_are_unchanged() {
        let before = snapshot(1000, &[("a", Some(-60)), ("b", Some(-70))]);
        let after = snapshot(2000, &[("b", Some(-50)), ("a", Some(-75))]);

        let cmp = before.compare(&after);
        assert!(cmp.is_unchanged());
        assert_eq!(cmp.churn_count(), 0);
        assert_eq!(cmp.rssi_deltas.len(), 2);
    }

    #[test]
    fn test_rssi_deltas_skip_unknown_levels() {
        let before = snapshot(1000, &[("a", Some(-60)), ("b", None)]);
        let after = snapshot(2000, &[("a", Some(-80)), ("b", Some(-50))]);

        let cmp = before.compare(&after);
        assert_eq!(cmp.rssi_deltas.len(), 1);
        assert_eq!(cmp.rssi_deltas[0].delta_db(), -20);
    }

    #[test]
    fn test_empty_before_has_zero_churn_percentage() {
        let before = ScanSnapshot::new(1000, Vec::new());
        let after = snapshot(2000, &[("a", Some(-60))]);
        let cmp = before.compare(&after);
        assert_eq!(cmp.churn_count(), 1);
        assert_eq!(cmp.churn_percentage(), 0.0);
    }

    #[test]
    fn test_snapshot_lookups() {
        let snap = snapshot(1000, &[("a", Some(-60)), ("b", None)]).with_connected("a");
        assert_eq!(snap.rssi_of(&Bssid::new("a")), Some(-60));
        assert_eq!(snap.rssi_of(&Bssid::new("b")), None);
        assert_eq!(snap.bss_count(), 2);
        assert!(snap.cluster_of(&Bssid::new("b")).is_some());
        assert_eq!(snap.connected_bssid, Some(Bssid::new("a")));
    }
}
