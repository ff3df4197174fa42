//! Telemetry Sample

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// One timestamped vehicle motion reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Sample time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Vehicle speed (km/h)
    pub speed: f64,
    /// Longitudinal acceleration (m/s²)
    pub acceleration_x: f64,
    /// Lateral acceleration (m/s²)
    pub acceleration_y: f64,
    /// Vertical acceleration (m/s²)
    pub acceleration_z: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Engine speed (rev/min)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm: Option<f64>,
    /// Throttle position (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle_position: Option<f64>,
    /// Brake pressure (bar)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_pressure: Option<f64>,
    /// Steering wheel angle (degrees, signed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steering_angle: Option<f64>,
}

impl TelemetrySample {
    /// Create a sample with zero acceleration and no optional channels
    pub fn new(timestamp: DateTime<Utc>, speed: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            speed,
            acceleration_x: 0.0,
            acceleration_y: 0.0,
            acceleration_z: 0.0,
            latitude,
            longitude,
            rpm: None,
            throttle_position: None,
            brake_pressure: None,
            steering_angle: None,
        }
    }

    /// Set the three acceleration axes
    pub fn with_acceleration(mut self, x: f64, y: f64, z: f64) -> Self {
        self.acceleration_x = x;
        self.acceleration_y = y;
        self.acceleration_z = z;
        self
    }

    /// Set the steering angle
    pub fn with_steering_angle(mut self, angle: f64) -> Self {
        self.steering_angle = Some(angle);
        self
    }

    /// Position of the sample
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// Euclidean norm of the acceleration vector (m/s²)
    pub fn acceleration_magnitude(&self) -> f64 {
        (self.acceleration_x.powi(2) + self.acceleration_y.powi(2) + self.acceleration_z.powi(2))
            .sqrt()
    }

    /// Seconds elapsed since `earlier` (negative if `earlier` is later)
    pub fn seconds_since(&self, earlier: &TelemetrySample) -> f64 {
        (self.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1000.0
    }
}
