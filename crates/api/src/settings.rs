//! Service settings
//!
//! Layered with the `config` crate: `config/default.toml`, then
//! `config/local.toml`, then `FLEETSAFE__SECTION__KEY` environment variables.
//! Every section falls back to its component defaults.

use alerting::AlertConfig;
use behavior::BehaviorConfig;
use cloud_sync::CloudConfig;
use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use pipeline::PipelineConfig;
use risk_predictor::PredictorConfig;
use safety_report::ReportConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use storage::StorageConfig;
use telemetry::SimulationConfig;

use crate::rate_limit::RateLimitConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of the human format
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// MQTT alert forwarding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub enabled: bool,
    pub cloud: CloudConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub rate_limit: RateLimitConfig,
    pub simulation: SimulationConfig,
    pub pipeline: PipelineConfig,
    pub validation: ValidationConfig,
    pub behavior: BehaviorConfig,
    pub predictor: PredictorConfig,
    pub alerts: AlertConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub mqtt: MqttSettings,
}

impl Settings {
    /// Load from `./config` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load from the given directory and the environment
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            .add_source(
                Environment::with_prefix("FLEETSAFE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
