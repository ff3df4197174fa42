//! Statistical Features Computation

use serde::{Deserialize, Serialize};
use telemetry::{GeoPoint, TelemetrySample};

/// Mean Earth radius used for distance calculations (meters)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n); 0.0 for an empty slice
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Great-circle distance between two points (meters)
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lng - a.lng).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Summary statistics for a signal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean absolute step between consecutive values
    pub rate_of_change: f64,
}

impl StatisticalFeatures {
    /// Compute statistical features from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mean = mean(values);
        let variance = variance(values);
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);

        let rate_of_change = if values.len() >= 2 {
            let total: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
            total / (values.len() - 1) as f64
        } else {
            0.0
        };

        Self {
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
            rate_of_change,
        }
    }

    /// Speed channel of a window
    pub fn extract_speed(samples: &[TelemetrySample]) -> Vec<f64> {
        samples.iter().map(|s| s.speed).collect()
    }

    /// Steering channel of a window; missing angles read as 0
    pub fn extract_steering(samples: &[TelemetrySample]) -> Vec<f64> {
        samples.iter().map(|s| s.steering_angle.unwrap_or(0.0)).collect()
    }

    /// Acceleration magnitude of each sample
    pub fn extract_acceleration_magnitude(samples: &[TelemetrySample]) -> Vec<f64> {
        samples.iter().map(TelemetrySample::acceleration_magnitude).collect()
    }
}
