//! Shared service state

use alerting::AlertDispatcher;
use behavior::BehaviorAnalyzer;
use cloud_sync::CloudSync;
use data_validator::Validator;
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline::{PipelineStats, SafetyPipeline};
use risk_predictor::AccidentPredictor;
use safety_report::SafetyReportGenerator;
use std::sync::Arc;
use std::time::Instant;
use storage::Repository;
use telemetry::{SimulationConfig, TelemetrySimulator};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::ApiError;
use crate::settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    pub settings: Settings,
    pub validator: Validator,
    pub analyzer: BehaviorAnalyzer,
    pub predictor: Arc<AccidentPredictor>,
    /// The one dispatcher shared by the pipeline, MQTT and handlers
    pub dispatcher: Arc<AlertDispatcher>,
    pub repository: Arc<Repository>,
    pub reports: SafetyReportGenerator,
    pub simulator: TelemetrySimulator,
    /// Pipeline consuming the running simulation
    pub pipeline_task: Option<JoinHandle<PipelineStats>>,
    pub cloud: Option<Arc<CloudSync>>,
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: Instant,
}

impl AppState {
    /// Build every component from settings
    pub fn new(settings: Settings) -> Result<Self, ApiError> {
        let predictor = Arc::new(AccidentPredictor::new(settings.predictor.clone())?);
        let dispatcher = Arc::new(AlertDispatcher::new(settings.alerts.clone()));
        let repository = Arc::new(Repository::new(settings.storage.clone()));

        Ok(Self {
            validator: Validator::new(settings.validation.clone()),
            analyzer: BehaviorAnalyzer::new(settings.behavior.clone()),
            predictor,
            dispatcher,
            repository,
            reports: SafetyReportGenerator::new(settings.report.clone()),
            simulator: TelemetrySimulator::new(),
            pipeline_task: None,
            cloud: None,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            settings,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Forward every emitted alert over MQTT
    pub fn with_cloud(mut self, cloud: Arc<CloudSync>) -> Self {
        cloud.forward_alerts(&self.dispatcher);
        self.cloud = Some(cloud);
        self
    }

    /// Start the simulator and a pipeline consuming it
    pub fn start_simulation(&mut self, config: SimulationConfig) -> Result<(), ApiError> {
        let rx = self.simulator.start(config)?;

        let pipeline = SafetyPipeline::new(
            self.settings.pipeline.clone(),
            self.analyzer.clone(),
            Arc::clone(&self.predictor),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.repository),
        )
        .with_validator(self.validator.clone());

        // A previous task's simulator has already finished, so it drains and exits
        self.pipeline_task = Some(tokio::spawn(pipeline.run(rx)));
        info!("Simulation started for {}", self.settings.pipeline.vehicle_id);
        Ok(())
    }

    /// Stop the simulator and hand back the pipeline task to await
    pub fn stop_simulation(&mut self) -> Result<Option<JoinHandle<PipelineStats>>, ApiError> {
        if !self.simulator.stop() {
            return Err(ApiError::NotRunning);
        }
        Ok(self.pipeline_task.take())
    }
}
