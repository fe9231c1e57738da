// wifi-intel testdata - Scenarios
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Ready-made environments for exercising the analyzers.

use crate::generator::{generate_history, HistoryConfig};
use crate::patterns::RssiPattern;
use rand::prelude::*;
use rand::rngs::StdRng;
use wifi_intel::{
    ApCluster, ChannelWidth, ClusteredBss, NetworkTrend, RoamingCapabilities, RoamingEvent,
    ScanSnapshot, WifiBand, WifiStandard,
};

/// Locally administered MAC address for index `n`.
pub fn bssid(n: usize) -> String {
    format!("02:00:00:00:{:02x}:{:02x}", (n >> 8) & 0xff, n & 0xff)
}

/// Six-BSS office cluster with mixed bands, generations and capabilities.
///
/// Index 0 is a weak 2.4 GHz BSS that a client would typically be stuck on;
/// index 3 is the strongest 6 GHz BSS.
pub fn office_cluster(seen_at_ms: u64) -> wifi_intel::Result<ApCluster> {
    let bss = vec![
        ClusteredBss::new(bssid(0), WifiBand::Band2_4GHz, 6, 2437)
            .with_rssi(-82)
            .with_standard(WifiStandard::Wifi4),
        ClusteredBss::new(bssid(1), WifiBand::Band2_4GHz, 11, 2462)
            .with_rssi(-70)
            .with_standard(WifiStandard::Wifi4),
        ClusteredBss::new(bssid(2), WifiBand::Band5GHz, 36, 5180)
            .with_rssi(-64)
            .with_standard(WifiStandard::Wifi5)
            .with_channel_width(ChannelWidth::Mhz80)
            .with_capabilities(RoamingCapabilities::new(true, false, true)),
        ClusteredBss::new(bssid(3), WifiBand::Band6GHz, 37, 6135)
            .with_rssi(-58)
            .with_standard(WifiStandard::Wifi6)
            .with_channel_width(ChannelWidth::Mhz160)
            .with_capabilities(RoamingCapabilities::full()),
        ClusteredBss::new(bssid(4), WifiBand::Band5GHz, 149, 5745)
            .with_rssi(-73)
            .with_standard(WifiStandard::Wifi6)
            .with_capabilities(RoamingCapabilities::full()),
        // Out of range on this scan
        ClusteredBss::new(bssid(5), WifiBand::Band5GHz, 100, 5500)
            .with_standard(WifiStandard::Wifi6),
    ]
    .into_iter()
    .map(|b| b.seen_at(seen_at_ms))
    .collect();

    ApCluster::new("office", "corp", "wpa3-sae", bss)
}

/// Alternating roams between `a` and `b`, `interval_ms` apart.
pub fn ping_pong_events(
    a: &str,
    b: &str,
    start_ms: u64,
    interval_ms: u64,
    count: usize,
) -> Vec<RoamingEvent> {
    (0..count)
        .map(|i| {
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            RoamingEvent::new(
                start_ms + i as u64 * interval_ms,
                from,
                to,
                "corp",
                60,
                -74,
                -70,
            )
        })
        .collect()
}

/// Network where the first `degrading` of `ap_count` APs lose 20 dB/h.
///
/// The remaining APs hold a constant level. Every history follows
/// `config`, with the seed offset per AP.
pub fn degrading_network(
    ssid: &str,
    ap_count: usize,
    degrading: usize,
    config: &HistoryConfig,
) -> wifi_intel::Result<NetworkTrend> {
    let histories = (0..ap_count.max(1))
        .map(|i| {
            let pattern = if i < degrading {
                RssiPattern::linear(-55.0, -20.0)
            } else {
                RssiPattern::constant(-62.0)
            };
            let mut ap_config = config.clone();
            ap_config.seed = config.seed.map(|s| s.wrapping_add(i as u64));
            generate_history(bssid(i), &pattern, &ap_config).map(|h| h.with_ssid(ssid))
        })
        .collect::<wifi_intel::Result<Vec<_>>>()?;

    NetworkTrend::new(ssid, histories)
}

/// Scan snapshots where `churn_per_step` BSSes are swapped for new ones
/// at every step.
///
/// Each snapshot holds `visible` BSSes with seeded RSSI values.
pub fn churning_snapshots(
    count: usize,
    visible: usize,
    churn_per_step: usize,
    start_ms: u64,
    interval_ms: u64,
    seed: u64,
) -> wifi_intel::Result<Vec<ScanSnapshot>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let visible = visible.max(1);
    let churn = churn_per_step.min(visible);
    let mut next_index = visible;
    let mut current: Vec<usize> = (0..visible).collect();
    let mut snapshots = Vec::with_capacity(count);

    for step in 0..count {
        if step > 0 {
            for slot in current.iter_mut().take(churn) {
                *slot = next_index;
                next_index += 1;
            }
            current.rotate_left(churn);
        }

        let timestamp_ms = start_ms + step as u64 * interval_ms;
        let bss = current
            .iter()
            .map(|&n| {
                ClusteredBss::new(bssid(n), WifiBand::Band5GHz, 36, 5180)
                    .with_rssi(rng.gen_range(-85..=-45))
                    .seen_at(timestamp_ms)
            })
            .collect();
        let cluster = ApCluster::new("scan", "corp", "wpa2-psk", bss)?;
        snapshots.push(ScanSnapshot::new(timestamp_ms, vec![cluster]));
    }

    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bssid_format() {
        assert_eq!(bssid(0), "02:00:00:00:00:00");
        assert_eq!(bssid(258), "02:00:00:00:01:02");
    }

    #[test]
    fn test_office_cluster() {
        let cluster = office_cluster(1000).unwrap();
        assert_eq!(cluster.len(), 6);
        assert_eq!(cluster.bands().len(), 3);
        assert_eq!(cluster.strongest().unwrap().bssid.as_str(), bssid(3));
    }

    #[test]
    fn test_ping_pong_events_alternate() {
        let events = ping_pong_events("a", "b", 0, 1000, 4);
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].from_bssid.as_str(), "b");
        assert_eq!(events[3].timestamp_ms, 3000);
    }

    #[test]
    fn test_degrading_network() {
        let config = HistoryConfig::new().with_num_samples(10).with_seed(3);
        let network = degrading_network("corp", 4, 3, &config).unwrap();
        assert_eq!(network.ap_count(), 4);
        assert_eq!(network.ap_histories()[0].ssid(), Some("corp"));
    }

    #[test]
    fn test_churning_snapshots() {
        let snapshots = churning_snapshots(3, 10, 4, 0, 60_000, 5).unwrap();
        assert_eq!(snapshots.len(), 3);
        let diff = snapshots[0].compare(&snapshots[1]);
        assert_eq!(diff.added.len(), 4);
        assert_eq!(diff.removed.len(), 4);
        assert_eq!(snapshots[2].bss_count(), 10);
    }
}
