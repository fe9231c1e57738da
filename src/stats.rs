//! Small numeric helpers shared by the analyzers.
//!
//! Everything here works on plain slices so the analyzers can feed
//! windows of an [`ApHistory`](crate::ApHistory) without copying.

use crate::error::Result;
use crate::observation::SignalObservation;
use statrs::distribution::{ContinuousCDF, Normal};

/// Milliseconds per hour, the time unit of every rate in this crate.
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Zero below two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let m = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    variance.max(0.0).sqrt()
}

/// RSSI values of a run of observations as `f64`.
pub fn rssi_values(observations: &[SignalObservation]) -> Vec<f64> {
    observations.iter().map(|o| o.rssi_dbm as f64).collect()
}

/// Ordinary least-squares slope of RSSI against time, in dB per hour.
///
/// Time is measured from the first observation. Returns 0.0 when fewer
/// than two points are given or all timestamps coincide.
pub fn rssi_slope_db_per_hour(observations: &[SignalObservation]) -> f64 {
    let first = match observations.first() {
        Some(first) if observations.len() >= 2 => first.timestamp_ms,
        _ => return 0.0,
    };

    let n = observations.len() as f64;
    let xs: Vec<f64> = observations
        .iter()
        .map(|o| o.timestamp_ms.saturating_sub(first) as f64 / MS_PER_HOUR)
        .collect();
    let ys = rssi_values(observations);

    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x).powi(2);
    }

    if sxx < 1e-12 {
        return 0.0;
    }
    sxy / sxx
}

/// Elapsed time between first and last observation, in hours.
pub fn span_hours(observations: &[SignalObservation]) -> f64 {
    match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => {
            last.timestamp_ms.saturating_sub(first.timestamp_ms) as f64 / MS_PER_HOUR
        }
        _ => 0.0,
    }
}

/// Two-sided standard normal quantile for a confidence level in (0, 1].
///
/// A level of 1.0 is capped at 99.99 % so the bound stays finite.
pub fn two_sided_z(confidence: f64) -> Result<f64> {
    let confidence = confidence.clamp(1e-6, 0.9999);
    let standard = Normal::new(0.0, 1.0)?;
    Ok(standard.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn obs(timestamp_ms: u64, rssi_dbm: i32) -> SignalObservation {
        SignalObservation::new("aa:bb:cc:00:00:01", timestamp_ms, rssi_dbm)
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_abs_diff_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[5.0]), 0.0);
        assert_abs_diff_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.138, epsilon = 0.001);
    }

    #[test]
    fn test_slope_linear_series() {
        // +10 dB per hour
        let series: Vec<_> = (0..5)
            .map(|i| obs(i * 360_000, -80 + i as i32))
            .collect();
        assert_abs_diff_eq!(rssi_slope_db_per_hour(&series), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_slope_degenerate() {
        assert_eq!(rssi_slope_db_per_hour(&[obs(1000, -60)]), 0.0);
        assert_eq!(rssi_slope_db_per_hour(&[obs(1000, -60), obs(1000, -40)]), 0.0);
    }

    #[test]
    fn test_span_hours() {
        let series = vec![obs(0, -60), obs(1_800_000, -61)];
        assert_abs_diff_eq!(span_hours(&series), 0.5);
        assert_eq!(span_hours(&[]), 0.0);
    }

    #[test]
    fn test_two_sided_z() {
        assert_abs_diff_eq!(two_sided_z(0.95).unwrap(), 1.959964, epsilon = 1e-5);
        assert_abs_diff_eq!(two_sided_z(0.99).unwrap(), 2.575829, epsilon = 1e-5);
        assert_abs_diff_eq!(two_sided_z(0.6827).unwrap(), 1.0, epsilon = 1e-3);
        assert!(two_sided_z(1.0).unwrap() > 3.8);
        assert!(two_sided_z(1.0).unwrap().is_finite());
        assert!(two_sided_z(0.5).unwrap() < two_sided_z(0.9).unwrap());
    }
}
