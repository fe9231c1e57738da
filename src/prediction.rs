//! Short-term performance prediction.
//!
//! All forecasts extrapolate the least-squares RSSI rate of an AP's history
//! linearly over the requested horizon. Horizons are validated against
//! [`PredictionConfig::max_prediction_horizon_ms`].

use crate::config::PredictionConfig;
use crate::error::{Result, WifiIntelError};
use crate::network::NetworkTrend;
use crate::observation::{ApHistory, Bssid};
use crate::stats::{self, MS_PER_HOUR};
use crate::trend::{HIGH_CONFIDENCE_SAMPLES, MEDIUM_CONFIDENCE_SAMPLES};
use log::debug;
use serde::{Deserialize, Serialize};

/// Lowest and highest physically meaningful RSSI (dBm).
const RSSI_MIN_DBM: f64 = -100.0;
const RSSI_MAX_DBM: f64 = 0.0;

/// RSSI range mapped onto the 0-100 health score.
const HEALTH_FLOOR_DBM: f64 = -100.0;
const HEALTH_SPAN_DB: f64 = 70.0;

/// Health score movement treated as no change.
const HEALTH_DEAD_BAND: f64 = 5.0;

const GOOD_LINK_DBM: f64 = -67.0;
const USABLE_LINK_DBM: f64 = -75.0;
const UNSTABLE_STD_DEV_DB: f64 = 8.0;
const MEANINGFUL_GAIN_DB: f64 = 5.0;

/// Confidence of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PredictionConfidence {
    Low,
    Medium,
    High,
}

impl PredictionConfidence {
    fn from_sample_count(count: usize) -> Self {
        if count >= HIGH_CONFIDENCE_SAMPLES {
            PredictionConfidence::High
        } else if count >= MEDIUM_CONFIDENCE_SAMPLES {
            PredictionConfidence::Medium
        } else {
            PredictionConfidence::Low
        }
    }

    /// One level lower, saturating at Low.
    pub fn downgrade(self) -> Self {
        match self {
            PredictionConfidence::High => PredictionConfidence::Medium,
            _ => PredictionConfidence::Low,
        }
    }
}

/// Forecast RSSI of one AP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPrediction {
    pub bssid: Bssid,
    pub current_rssi_dbm: i32,
    pub predicted_rssi_dbm: f64,
    pub lower_bound_dbm: f64,
    pub upper_bound_dbm: f64,
    pub change_rate_db_per_hour: f64,
    pub horizon_ms: u64,
    /// Point in time the forecast refers to (ms).
    pub target_timestamp_ms: u64,
    pub confidence: PredictionConfidence,
    pub sample_count: usize,
}

impl SignalPrediction {
    pub fn predicted_change_db(&self) -> f64 {
        self.predicted_rssi_dbm - self.current_rssi_dbm as f64
    }
}

/// Health category of a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NetworkHealth {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl NetworkHealth {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            NetworkHealth::Excellent
        } else if score >= 60.0 {
            NetworkHealth::Good
        } else if score >= 40.0 {
            NetworkHealth::Fair
        } else if score >= 20.0 {
            NetworkHealth::Poor
        } else {
            NetworkHealth::Critical
        }
    }
}

/// Direction of a health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthChange {
    Improving,
    Stable,
    Degrading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkHealthPrediction {
    pub ssid: String,
    pub horizon_ms: u64,
    pub current_score: f64,
    pub predicted_score: f64,
    pub current_health: NetworkHealth,
    pub predicted_health: NetworkHealth,
    pub change: HealthChange,
    pub ap_predictions: Vec<SignalPrediction>,
}

/// Share of visible APs expected to stay usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    /// No AP currently visible.
    NoCoverage,
}

impl CoverageQuality {
    fn from_ratio(visible: usize, ratio: f64) -> Self {
        if visible == 0 {
            CoverageQuality::NoCoverage
        } else if ratio >= 0.9 {
            CoverageQuality::Excellent
        } else if ratio >= 0.7 {
            CoverageQuality::Good
        } else if ratio >= 0.5 {
            CoverageQuality::Fair
        } else {
            CoverageQuality::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePrediction {
    pub ssid: String,
    pub horizon_ms: u64,
    pub visible_aps: usize,
    /// Visible APs predicted to stay above the detection floor.
    pub expected_visible_aps: usize,
    /// Visible APs predicted to drop below the floor.
    pub at_risk_bssids: Vec<Bssid>,
    /// `expected_visible_aps / visible_aps`, 0 without visible APs.
    pub coverage_ratio: f64,
    pub quality: CoverageQuality,
}

/// When to (re)connect to an AP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConnectionTimeRecommendation {
    /// Not enough history to judge.
    InsufficientData,
    /// The link is usable and steady now.
    ConnectNow,
    /// The signal is on its way up.
    WaitForImprovement {
        wait_ms: u64,
        expected_rssi_dbm: f64,
    },
    /// Neither the current nor the predicted link is worth it.
    SeekAlternative,
}

/// Risk category of a 0-100 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RiskLevel::Critical
        } else if score >= 50.0 {
            RiskLevel::High
        } else if score >= 25.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionIssuePrediction {
    pub bssid: Bssid,
    pub horizon_ms: u64,
    /// 0-100.
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub std_dev_db: f64,
    pub average_rssi_dbm: f64,
    pub predicted_rssi_dbm: f64,
}

/// Linear-extrapolation forecaster.
#[derive(Debug, Clone, Default)]
pub struct PerformancePredictor {
    config: PredictionConfig,
}

impl PerformancePredictor {
    pub fn new(config: PredictionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    fn check_horizon(&self, horizon_ms: u64) -> Result<()> {
        if horizon_ms == 0 || horizon_ms > self.config.max_prediction_horizon_ms {
            return Err(WifiIntelError::InvalidHorizon {
                horizon_ms,
                max_ms: self.config.max_prediction_horizon_ms,
            });
        }
        Ok(())
    }

    /// RSSI of one AP `horizon_ms` after `current_time_ms`.
    ///
    /// Only observations taken at or before `current_time_ms` are used, or
    /// the whole history when none are.
    pub fn predict_ap_signal_strength(
        &self,
        history: &ApHistory,
        horizon_ms: u64,
        current_time_ms: u64,
    ) -> Result<SignalPrediction> {
        self.check_horizon(horizon_ms)?;

        let mut window = history.observations_until(current_time_ms);
        if window.is_empty() {
            window = history.observations();
        }
        let current_rssi_dbm = window.last().unwrap_or_else(|| history.latest()).rssi_dbm;
        let sample_count = window.len();

        let rate = stats::rssi_slope_db_per_hour(window);
        let horizon_hours = horizon_ms as f64 / MS_PER_HOUR;
        let predicted = (current_rssi_dbm as f64 + rate * horizon_hours).clamp(RSSI_MIN_DBM, RSSI_MAX_DBM);

        let margin = stats::two_sided_z(self.config.confidence_interval)?
            * stats::std_dev(&stats::rssi_values(window));

        let mut confidence = if sample_count < self.config.min_historical_data_points {
            PredictionConfidence::Low
        } else {
            PredictionConfidence::from_sample_count(sample_count)
        };
        if horizon_ms > self.config.max_prediction_horizon_ms / 2 {
            confidence = confidence.downgrade();
        }

        debug!(
            "predict {}: {} dBm -> {:.1} dBm in {} ms ({:.2} dB/h, {} samples)",
            history.bssid(),
            current_rssi_dbm,
            predicted,
            horizon_ms,
            rate,
            sample_count
        );

        Ok(SignalPrediction {
            bssid: history.bssid().clone(),
            current_rssi_dbm,
            predicted_rssi_dbm: predicted,
            lower_bound_dbm: (predicted - margin).max(RSSI_MIN_DBM),
            upper_bound_dbm: (predicted + margin).min(RSSI_MAX_DBM),
            change_rate_db_per_hour: rate,
            horizon_ms,
            target_timestamp_ms: current_time_ms.saturating_add(horizon_ms),
            confidence,
            sample_count,
        })
    }

    /// Current and predicted health of a whole network.
    pub fn predict_network_health(
        &self,
        network: &NetworkTrend,
        horizon_ms: u64,
    ) -> Result<NetworkHealthPrediction> {
        self.check_horizon(horizon_ms)?;
        let now_ms = network.latest_timestamp_ms();

        let ap_predictions = network
            .ap_histories()
            .iter()
            .map(|h| self.predict_ap_signal_strength(h, horizon_ms, now_ms))
            .collect::<Result<Vec<_>>>()?;

        let n = ap_predictions.len().max(1) as f64;
        let current_score = ap_predictions
            .iter()
            .map(|p| health_score(p.current_rssi_dbm as f64))
            .sum::<f64>()
            / n;
        let predicted_score = ap_predictions
            .iter()
            .map(|p| health_score(p.predicted_rssi_dbm))
            .sum::<f64>()
            / n;

        let delta = predicted_score - current_score;
        let change = if delta > HEALTH_DEAD_BAND {
            HealthChange::Improving
        } else if delta < -HEALTH_DEAD_BAND {
            HealthChange::Degrading
        } else {
            HealthChange::Stable
        };

        Ok(NetworkHealthPrediction {
            ssid: network.ssid().to_string(),
            horizon_ms,
            current_score,
            predicted_score,
            current_health: NetworkHealth::from_score(current_score),
            predicted_health: NetworkHealth::from_score(predicted_score),
            change,
            ap_predictions,
        })
    }

    /// How many currently visible APs will still be detectable.
    pub fn predict_coverage_quality(
        &self,
        network: &NetworkTrend,
        horizon_ms: u64,
        current_time_ms: u64,
    ) -> Result<CoveragePrediction> {
        self.check_horizon(horizon_ms)?;
        let floor = self.config.detection_floor_dbm as f64;

        let mut visible_aps = 0;
        let mut at_risk_bssids = Vec::new();
        for history in network.ap_histories() {
            if !history.is_visible(current_time_ms, self.config.visibility_threshold_ms) {
                continue;
            }
            visible_aps += 1;
            let prediction = self.predict_ap_signal_strength(history, horizon_ms, current_time_ms)?;
            if prediction.predicted_rssi_dbm < floor {
                at_risk_bssids.push(history.bssid().clone());
            }
        }

        let expected_visible_aps = visible_aps - at_risk_bssids.len();
        let coverage_ratio = if visible_aps == 0 {
            0.0
        } else {
            expected_visible_aps as f64 / visible_aps as f64
        };

        Ok(CoveragePrediction {
            ssid: network.ssid().to_string(),
            horizon_ms,
            visible_aps,
            expected_visible_aps,
            at_risk_bssids,
            coverage_ratio,
            quality: CoverageQuality::from_ratio(visible_aps, coverage_ratio),
        })
    }

    /// Whether to connect now, wait for the signal to improve, or look elsewhere.
    pub fn recommend_optimal_connection_time(
        &self,
        history: &ApHistory,
        look_ahead_hours: f64,
    ) -> Result<ConnectionTimeRecommendation> {
        let horizon_ms = hours_to_ms(look_ahead_hours);
        self.check_horizon(horizon_ms)?;

        if history.len() < self.config.min_historical_data_points {
            return Ok(ConnectionTimeRecommendation::InsufficientData);
        }

        let prediction = self.predict_ap_signal_strength(history, horizon_ms, history.last_seen_ms())?;
        let current = prediction.current_rssi_dbm as f64;
        let predicted = prediction.predicted_rssi_dbm;
        let std_dev = stats::std_dev(&history.rssi_values());

        if current < GOOD_LINK_DBM
            && predicted - current >= MEANINGFUL_GAIN_DB
            && predicted >= USABLE_LINK_DBM
        {
            let rate = prediction.change_rate_db_per_hour;
            let target = GOOD_LINK_DBM.min(predicted);
            let wait_ms = if rate > 0.0 {
                hours_to_ms((target - current).max(0.0) / rate).min(horizon_ms)
            } else {
                horizon_ms
            };
            return Ok(ConnectionTimeRecommendation::WaitForImprovement {
                wait_ms,
                expected_rssi_dbm: predicted,
            });
        }

        if current >= USABLE_LINK_DBM && std_dev <= UNSTABLE_STD_DEV_DB {
            Ok(ConnectionTimeRecommendation::ConnectNow)
        } else {
            Ok(ConnectionTimeRecommendation::SeekAlternative)
        }
    }

    /// Risk of connection problems within `horizon_ms` of the last sample.
    ///
    /// Up to 50 points from signal variance, 50 from a weak average level and
    /// 25 from a predicted decline, capped at 100.
    pub fn predict_connection_issues(
        &self,
        history: &ApHistory,
        horizon_ms: u64,
    ) -> Result<ConnectionIssuePrediction> {
        let prediction = self.predict_ap_signal_strength(history, horizon_ms, history.last_seen_ms())?;
        let values = history.rssi_values();
        let std_dev_db = stats::std_dev(&values);
        let average_rssi_dbm = stats::mean(&values).unwrap_or(prediction.current_rssi_dbm as f64);

        let variance_risk = (std_dev_db / 15.0).min(1.0) * 50.0;
        let signal_risk = ((-60.0 - average_rssi_dbm) / 30.0).clamp(0.0, 1.0) * 50.0;
        let decline = (-prediction.predicted_change_db()).max(0.0);
        let decline_risk = (decline / 10.0).min(1.0) * 25.0;
        let risk_score = (variance_risk + signal_risk + decline_risk).clamp(0.0, 100.0);

        Ok(ConnectionIssuePrediction {
            bssid: history.bssid().clone(),
            horizon_ms,
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            std_dev_db,
            average_rssi_dbm,
            predicted_rssi_dbm: prediction.predicted_rssi_dbm,
        })
    }
}

/// RSSI -100..-30 dBm onto a 0-100 score.
fn health_score(rssi_dbm: f64) -> f64 {
    ((rssi_dbm - HEALTH_FLOOR_DBM) / HEALTH_SPAN_DB * 100.0).clamp(0.0, 100.0)
}

fn hours_to_ms(hours: f64) -> u64 {
    if hours.is_finite() && hours > 0.0 {
        (hours * MS_PER_HOUR).round() as u64
    } else {
        0
    }
}
