//! Validation Error Types

use thiserror::Error;

/// Errors during telemetry validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// NaN or infinite value
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    /// Sample timestamps not in ascending order
    #[error("Sample {index} is older than the sample before it")]
    OutOfOrder { index: usize },

    /// Window has no samples where at least one is required
    #[error("Telemetry window is empty")]
    EmptyWindow,

    /// Window exceeds the accepted size
    #[error("Telemetry window has {len} samples, limit is {max}")]
    WindowTooLarge { len: usize, max: usize },
}
