//! Predictor configuration

use serde::{Deserialize, Serialize};

use crate::explain::RiskFactors;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Label reported as `predictionModel`
    pub model_name: String,
    /// Offset from UTC used to read the hour of day (minutes)
    pub utc_offset_minutes: i32,
    /// Per-factor weights for the risk score
    pub feature_importance: RiskFactors,
    pub medium_threshold: f64,
    pub high_threshold: f64,
    pub critical_threshold: f64,
    /// Samples needed before anomaly detection runs
    pub anomaly_window: usize,
    /// Multiplier applied to the score when picking the level under an anomaly
    pub anomaly_boost: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_name: "weighted-risk v2.1".to_string(),
            utc_offset_minutes: 0,
            feature_importance: RiskFactors::default_importance(),
            medium_threshold: 0.5,
            high_threshold: 0.7,
            critical_threshold: 0.85,
            anomaly_window: 30,
            anomaly_boost: 1.3,
        }
    }
}
