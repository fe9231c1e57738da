// wifi-intel testdata - History generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Observation history generation.

use crate::patterns::{clamp_rssi, PatternState, RssiPattern};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use wifi_intel::{ApHistory, Bssid, SignalObservation};

/// Sampling configuration of a generated history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Timestamp of the first sample (ms).
    pub start_time_ms: u64,
    /// Interval between samples (ms).
    pub sample_interval_ms: u64,
    /// Number of samples, at least one is always generated.
    pub num_samples: usize,
    /// Standard deviation of Gaussian noise added to each sample (dB).
    pub noise_std_db: f64,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            start_time_ms: 1_706_745_600_000, // 2024-02-01 00:00:00 UTC
            sample_interval_ms: 60_000,
            num_samples: 60,
            noise_std_db: 0.0,
            seed: None,
        }
    }
}

impl HistoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_time(mut self, timestamp_ms: u64) -> Self {
        self.start_time_ms = timestamp_ms;
        self
    }

    pub fn with_sample_interval_ms(mut self, interval_ms: u64) -> Self {
        self.sample_interval_ms = interval_ms;
        self
    }

    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = n;
        self
    }

    /// Set duration in hours (calculates num_samples from interval).
    pub fn with_duration_hours(mut self, hours: f64) -> Self {
        let total_ms = hours * 3_600_000.0;
        self.num_samples = (total_ms / self.sample_interval_ms.max(1) as f64).ceil() as usize;
        self
    }

    pub fn with_noise(mut self, noise_std_db: f64) -> Self {
        self.noise_std_db = noise_std_db;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Timestamp of the last sample.
    pub fn end_time_ms(&self) -> u64 {
        self.start_time_ms
            + self.sample_interval_ms * self.num_samples.saturating_sub(1) as u64
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON file.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Generate time-ordered observations of one BSS.
pub fn generate_observations(
    bssid: impl Into<Bssid>,
    pattern: &RssiPattern,
    config: &HistoryConfig,
) -> Vec<SignalObservation> {
    let bssid = bssid.into();
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let noise = if config.noise_std_db > 0.0 {
        Normal::new(0.0, config.noise_std_db).ok()
    } else {
        None
    };
    let mut state = PatternState::new(pattern.clone());

    (0..config.num_samples.max(1))
        .map(|i| {
            let elapsed_ms = i as u64 * config.sample_interval_ms;
            let mut value = state.next_value(elapsed_ms, &mut rng);
            if let Some(noise) = &noise {
                value += noise.sample(&mut rng);
            }
            SignalObservation::new(
                bssid.clone(),
                config.start_time_ms + elapsed_ms,
                clamp_rssi(value).round() as i32,
            )
        })
        .collect()
}

/// Generate a full [`ApHistory`] of one BSS.
pub fn generate_history(
    bssid: impl Into<Bssid>,
    pattern: &RssiPattern,
    config: &HistoryConfig,
) -> wifi_intel::Result<ApHistory> {
    let bssid = bssid.into();
    let observations = generate_observations(bssid.clone(), pattern, config);
    ApHistory::from_observations(bssid, observations)
}
