//! Accident Risk Prediction
//!
//! Scores six risk factors for the current sample, combines them into a
//! weighted risk score, flags anomalies against the recent window and
//! explains the result with linear per-factor attributions.

mod config;
mod explain;
mod predictor;
mod zones;

pub use config::PredictorConfig;
pub use explain::{Explainability, Factor, RiskFactors, TopFactor};
pub use predictor::{
    AccidentPrediction, AccidentPredictor, AccidentRiskLevel, AnomalyType, ConstantWeather,
    WeatherSource,
};
pub use zones::{default_risk_zones, RiskZone, ZoneRiskLevel};

use thiserror::Error;

/// Errors constructing a predictor
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Invalid UTC offset: {0} minutes")]
    InvalidUtcOffset(i32),
    #[error("Invalid risk zone {name}: {reason}")]
    InvalidZone { name: String, reason: String },
}
