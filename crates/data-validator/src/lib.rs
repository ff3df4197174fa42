//! Telemetry Validation
//!
//! Rejects malformed telemetry before it reaches scoring: non-finite
//! numbers, out-of-range speed or coordinates, and windows whose
//! timestamps run backwards.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
