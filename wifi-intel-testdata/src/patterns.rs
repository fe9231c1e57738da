// wifi-intel testdata - RSSI patterns
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! RSSI patterns for generated observation histories.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Weakest RSSI a generated sample may take (dBm).
pub const MIN_RSSI_DBM: f64 = -100.0;
/// Strongest RSSI a generated sample may take (dBm).
pub const MAX_RSSI_DBM: f64 = -20.0;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Shape of an RSSI series over time.
///
/// Times are measured from the first sample of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RssiPattern {
    /// Fixed level.
    Constant { rssi_dbm: f64 },

    /// Straight line.
    ///
    /// `rssi = start_dbm + db_per_hour * t_hours`
    Linear { start_dbm: f64, db_per_hour: f64 },

    /// Level changes at fixed offsets.
    ///
    /// `(offset_ms, rssi_dbm)` pairs in ascending order; each level holds
    /// until the next offset.
    Step { levels: Vec<(u64, f64)> },

    /// Brownian motion from a start level.
    RandomWalk { start_dbm: f64, step_std_db: f64 },

    /// Periodic fading around a mean.
    ///
    /// `rssi = mean_dbm + amplitude_db * sin(2*PI*t/period_ms)`
    Fading {
        mean_dbm: f64,
        amplitude_db: f64,
        period_ms: u64,
    },
}

impl RssiPattern {
    /// A level that never changes.
    pub fn constant(rssi_dbm: f64) -> Self {
        RssiPattern::Constant { rssi_dbm }
    }

    /// A level moving at `db_per_hour`.
    pub fn linear(start_dbm: f64, db_per_hour: f64) -> Self {
        RssiPattern::Linear {
            start_dbm,
            db_per_hour,
        }
    }
}

/// Evaluates a pattern sample by sample, carrying random-walk state.
#[derive(Debug, Clone)]
pub struct PatternState {
    pattern: RssiPattern,
    walk_dbm: Option<f64>,
}

impl PatternState {
    pub fn new(pattern: RssiPattern) -> Self {
        Self {
            pattern,
            walk_dbm: None,
        }
    }

    /// Unclamped, noise-free value at `elapsed_ms`.
    pub fn next_value(&mut self, elapsed_ms: u64, rng: &mut impl Rng) -> f64 {
        match &self.pattern {
            RssiPattern::Constant { rssi_dbm } => *rssi_dbm,

            RssiPattern::Linear {
                start_dbm,
                db_per_hour,
            } => start_dbm + db_per_hour * elapsed_ms as f64 / MS_PER_HOUR,

            RssiPattern::Step { levels } => {
                let mut current = levels.first().map(|(_, v)| *v).unwrap_or(MIN_RSSI_DBM);
                for (offset_ms, level) in levels {
                    if elapsed_ms >= *offset_ms {
                        current = *level;
                    } else {
                        break;
                    }
                }
                current
            }

            RssiPattern::RandomWalk {
                start_dbm,
                step_std_db,
            } => {
                let next = match self.walk_dbm {
                    None => *start_dbm,
                    Some(previous) => match Normal::new(0.0, *step_std_db) {
                        Ok(step) => clamp_rssi(previous + step.sample(rng)),
                        Err(_) => previous,
                    },
                };
                self.walk_dbm = Some(next);
                next
            }

            RssiPattern::Fading {
                mean_dbm,
                amplitude_db,
                period_ms,
            } => {
                let period = (*period_ms).max(1) as f64;
                mean_dbm + amplitude_db * (2.0 * PI * elapsed_ms as f64 / period).sin()
            }
        }
    }
}

/// Clamp to the generated RSSI range.
pub fn clamp_rssi(rssi_dbm: f64) -> f64 {
    rssi_dbm.clamp(MIN_RSSI_DBM, MAX_RSSI_DBM)
}
