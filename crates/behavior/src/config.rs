//! Behavior analyzer configuration

use serde::{Deserialize, Serialize};

/// Detection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Limit assumed below the highway threshold (km/h)
    pub urban_speed_limit: f64,

    /// Limit assumed above the highway threshold (km/h)
    pub highway_speed_limit: f64,

    /// Speed above which the highway limit applies (km/h)
    pub highway_speed_threshold: f64,

    /// Speed-change rate below which braking is harsh
    pub harsh_braking_threshold: f64,

    /// Speed-change rate above which acceleration is rapid
    pub rapid_acceleration_threshold: f64,

    /// Steering angle for a sharp turn (degrees)
    pub sharp_turn_angle: f64,

    /// Minimum speed for a sharp turn (km/h)
    pub sharp_turn_min_speed: f64,

    /// Samples needed before fatigue is evaluated
    pub fatigue_min_samples: usize,
    pub fatigue_speed_variance: f64,
    pub fatigue_variance_hits: usize,
    pub fatigue_micro_sleep_hits: usize,

    pub distraction_steering_variance: f64,
    pub distraction_speed_variance: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            urban_speed_limit: 60.0,
            highway_speed_limit: 100.0,
            highway_speed_threshold: 80.0,
            harsh_braking_threshold: -8.0,
            rapid_acceleration_threshold: 4.0,
            sharp_turn_angle: 30.0,
            sharp_turn_min_speed: 40.0,
            fatigue_min_samples: 100,
            fatigue_speed_variance: 100.0,
            fatigue_variance_hits: 20,
            fatigue_micro_sleep_hits: 5,
            distraction_steering_variance: 50.0,
            distraction_speed_variance: 30.0,
        }
    }
}

impl BehaviorConfig {
    /// Create strict config (lower thresholds)
    pub fn strict() -> Self {
        Self {
            harsh_braking_threshold: -6.0,
            rapid_acceleration_threshold: 3.0,
            sharp_turn_angle: 25.0,
            ..Default::default()
        }
    }

    /// Speed limit inferred from the current speed
    pub fn speed_limit_for(&self, speed: f64) -> f64 {
        if speed > self.highway_speed_threshold {
            self.highway_speed_limit
        } else {
            self.urban_speed_limit
        }
    }
}
