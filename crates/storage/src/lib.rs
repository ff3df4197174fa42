//! Storage Layer
//!
//! In-memory persistence sink for telemetry, driving events, accident
//! predictions, alerts and safety reports. Tables are keyed by vehicle or
//! customer id, capped by retention limits, and announce every insert on a
//! broadcast channel.

mod records;
mod repository;

pub use records::{AlertRecord, DrivingEventRecord, PredictionRecord, StorageChange, TelemetryRecord};
pub use repository::{Repository, StorageConfig};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Lock error on {0} table")]
    LockPoisoned(&'static str),
    #[error("{table} record not found: {id}")]
    NotFound { table: &'static str, id: String },
    #[error("Invalid time range: start is after end")]
    InvalidRange,
}
