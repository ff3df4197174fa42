//! Live Scoring Pipeline
//!
//! Wires the stages together for one vehicle:
//! - Validates and buffers incoming telemetry in a trailing window
//! - Analyzes behavior and predicts accident risk once the window is warm
//! - Dispatches alerts for newly detected events and risky predictions
//! - Writes telemetry, events, predictions and alerts to the persistence sink
//!
//! Storage failures never stop scoring; they are logged, counted and
//! returned with the computed outputs.

mod engine;
mod sink;

pub use engine::{PipelineConfig, PipelineOutput, PipelineStats, SafetyPipeline};
pub use sink::store_alerts;

use data_validator::ValidationError;
use thiserror::Error;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Rejected sample: {0}")]
    InvalidSample(#[from] ValidationError),
}
