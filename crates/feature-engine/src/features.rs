//! Window Feature Assembly

use crate::statistics::{haversine_distance, StatisticalFeatures};
use serde::{Deserialize, Serialize};
use telemetry::TelemetrySample;
use tracing::debug;

/// Features of a trailing telemetry window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowFeatures {
    pub sample_count: usize,
    pub speed: StatisticalFeatures,
    pub steering: StatisticalFeatures,
    pub acceleration_magnitude: StatisticalFeatures,
    /// Path length along consecutive samples (meters)
    pub distance_meters: f64,
    /// First to last timestamp (seconds)
    pub duration_seconds: f64,
}

impl WindowFeatures {
    pub fn extract(window: &[TelemetrySample]) -> Self {
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return Self::default();
        };

        let distance_meters = window
            .windows(2)
            .map(|pair| haversine_distance(pair[0].location(), pair[1].location()))
            .sum();

        let features = Self {
            sample_count: window.len(),
            speed: StatisticalFeatures::compute(&StatisticalFeatures::extract_speed(window)),
            steering: StatisticalFeatures::compute(&StatisticalFeatures::extract_steering(window)),
            acceleration_magnitude: StatisticalFeatures::compute(
                &StatisticalFeatures::extract_acceleration_magnitude(window),
            ),
            distance_meters,
            duration_seconds: last.seconds_since(first).max(0.0),
        };

        debug!(
            "Window features: {} samples, mean speed {:.1}, {:.0}m",
            features.sample_count, features.speed.mean, features.distance_meters
        );

        features
    }
}
