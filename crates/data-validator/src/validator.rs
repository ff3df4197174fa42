//! Telemetry Range and Ordering Checks

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use telemetry::TelemetrySample;
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Speed valid range (km/h)
    pub speed_range: (f64, f64),
    /// Per-axis acceleration valid range (m/s²)
    pub acceleration_range: (f64, f64),
    /// RPM valid range
    pub rpm_range: (f64, f64),
    /// Throttle position valid range (%)
    pub throttle_range: (f64, f64),
    /// Brake pressure valid range (bar)
    pub brake_range: (f64, f64),
    /// Steering angle valid range (degrees)
    pub steering_range: (f64, f64),
    /// Largest window accepted in one request
    pub max_window: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            speed_range: (0.0, 300.0),
            acceleration_range: (-100.0, 100.0),
            rpm_range: (0.0, 10000.0),
            throttle_range: (0.0, 100.0),
            brake_range: (0.0, 200.0),
            steering_range: (-720.0, 720.0),
            max_window: 10_000,
        }
    }
}

/// Result of validating a batch of samples
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of samples checked
    pub samples_checked: usize,
}

impl ValidationResult {
    /// First error, if any
    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Telemetry validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    fn validate_optional(
        &self,
        field: &'static str,
        value: Option<f64>,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        match value {
            Some(v) => self.validate_range(field, v, range),
            None => Ok(()),
        }
    }

    /// Validate every field of one sample
    pub fn validate_sample(&self, sample: &TelemetrySample) -> Result<(), ValidationError> {
        let c = &self.config;
        self.validate_range("speed", sample.speed, c.speed_range)?;
        self.validate_range("acceleration_x", sample.acceleration_x, c.acceleration_range)?;
        self.validate_range("acceleration_y", sample.acceleration_y, c.acceleration_range)?;
        self.validate_range("acceleration_z", sample.acceleration_z, c.acceleration_range)?;
        self.validate_range("latitude", sample.latitude, (-90.0, 90.0))?;
        self.validate_range("longitude", sample.longitude, (-180.0, 180.0))?;
        self.validate_optional("rpm", sample.rpm, c.rpm_range)?;
        self.validate_optional("throttle_position", sample.throttle_position, c.throttle_range)?;
        self.validate_optional("brake_pressure", sample.brake_pressure, c.brake_range)?;
        self.validate_optional("steering_angle", sample.steering_angle, c.steering_range)?;
        Ok(())
    }

    /// Validate a window: size limit, every sample, and non-decreasing timestamps.
    ///
    /// An empty window is accepted; callers that need data use
    /// [`Validator::validate_non_empty`].
    pub fn validate_window(&self, window: &[TelemetrySample]) -> Result<(), ValidationError> {
        self.check_window(window).into_result()
    }

    /// Same as [`Validator::validate_window`] but rejects an empty window
    pub fn validate_non_empty(&self, window: &[TelemetrySample]) -> Result<(), ValidationError> {
        if window.is_empty() {
            return Err(ValidationError::EmptyWindow);
        }
        self.validate_window(window)
    }

    /// Collect every problem in a window instead of stopping at the first
    pub fn check_window(&self, window: &[TelemetrySample]) -> ValidationResult {
        let mut errors = Vec::new();

        if window.len() > self.config.max_window {
            errors.push(ValidationError::WindowTooLarge {
                len: window.len(),
                max: self.config.max_window,
            });
        }

        for (index, sample) in window.iter().enumerate() {
            if let Err(err) = self.validate_sample(sample) {
                errors.push(err);
            }
            if index > 0 && sample.timestamp < window[index - 1].timestamp {
                errors.push(ValidationError::OutOfOrder { index });
            }
        }

        if !errors.is_empty() {
            debug!("Window of {} samples failed validation: {:?}", window.len(), errors[0]);
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            samples_checked: window.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sample(offset_s: i64, speed: f64) -> TelemetrySample {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::seconds(offset_s);
        TelemetrySample::new(t, speed, 12.97, 77.59)
    }

    #[test]
    fn test_valid_sample() {
        let validator = Validator::default();
        assert!(validator.validate_sample(&sample(0, 60.0)).is_ok());
        assert!(validator.validate_sample(&sample(0, 0.0)).is_ok());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let validator = Validator::default();
        let err = validator.validate_sample(&sample(0, -5.0)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "speed", .. }));
    }

    #[test]
    fn test_nan_rejected() {
        let validator = Validator::default();
        let mut s = sample(0, 50.0);
        s.acceleration_y = f64::NAN;
        assert_eq!(
            validator.validate_sample(&s),
            Err(ValidationError::NotFinite { field: "acceleration_y" })
        );
    }

    #[test]
    fn test_coordinates_checked() {
        let validator = Validator::default();
        let mut s = sample(0, 50.0);
        s.latitude = 95.0;
        assert!(validator.validate_sample(&s).is_err());
    }

    #[test]
    fn test_optional_channels() {
        let validator = Validator::default();
        let s = sample(0, 50.0).with_steering_angle(900.0);
        assert!(matches!(
            validator.validate_sample(&s),
            Err(ValidationError::OutOfRange { field: "steering_angle", .. })
        ));
    }

    #[test]
    fn test_out_of_order_window() {
        let validator = Validator::default();
        let window = vec![sample(0, 50.0), sample(2, 51.0), sample(1, 52.0)];
        assert_eq!(
            validator.validate_window(&window),
            Err(ValidationError::OutOfOrder { index: 2 })
        );
    }

    #[test]
    fn test_equal_timestamps_allowed() {
        let validator = Validator::default();
        let window = vec![sample(0, 50.0), sample(0, 51.0)];
        assert!(validator.validate_window(&window).is_ok());
    }

    #[test]
    fn test_empty_window() {
        let validator = Validator::default();
        assert!(validator.validate_window(&[]).is_ok());
        assert_eq!(validator.validate_non_empty(&[]), Err(ValidationError::EmptyWindow));
    }

    #[test]
    fn test_check_window_collects_all() {
        let validator = Validator::new(ValidationConfig {
            max_window: 2,
            ..Default::default()
        });
        let window = vec![sample(0, -1.0), sample(1, 50.0), sample(0, 400.0)];
        let result = validator.check_window(&window);
        assert!(!result.valid);
        assert_eq!(result.samples_checked, 3);
        assert_eq!(result.errors.len(), 4);
    }
}
