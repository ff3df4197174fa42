//! Vehicle Telemetry
//!
//! Timestamped motion samples and a scenario-driven simulator that produces
//! them on a fixed interval.

mod sample;
mod scenario;
mod simulator;

pub use sample::{GeoPoint, TelemetrySample};
pub use scenario::{Scenario, ScenarioGenerator};
pub use simulator::{SimulationConfig, TelemetrySimulator};

use thiserror::Error;

/// Simulation errors
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Simulation already running")]
    AlreadyRunning,
    #[error("Invalid sampling interval: {0}ms")]
    InvalidInterval(u64),
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}
