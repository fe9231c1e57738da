// wifi-intel testdata - Deterministic WiFi scan data generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # wifi-intel testdata
//!
//! Reproducible WiFi scan data for testing and benchmarking wifi-intel.
//!
//! - **RSSI patterns**: constant, linear, step, random walk, fading
//! - **Histories**: seeded sampling with Gaussian noise
//! - **Scenarios**: office cluster, ping-pong roaming, degrading network,
//!   churning scans
//!
//! ## Quick Start
//!
//! ```rust
//! use wifi_intel_testdata::{generate_history, HistoryConfig, RssiPattern};
//!
//! let config = HistoryConfig::new()
//!     .with_num_samples(30)
//!     .with_noise(1.5)
//!     .with_seed(42);
//!
//! let history = generate_history("02:00:00:00:00:01", &RssiPattern::linear(-55.0, -12.0), &config)
//!     .unwrap();
//! assert_eq!(history.len(), 30);
//! ```

pub mod generator;
pub mod patterns;
pub mod scenario;

// Re-exports for convenience
pub use generator::{generate_history, generate_observations, HistoryConfig};
pub use patterns::{clamp_rssi, PatternState, RssiPattern, MAX_RSSI_DBM, MIN_RSSI_DBM};
pub use scenario::{bssid, churning_snapshots, degrading_network, office_cluster, ping_pong_events};
