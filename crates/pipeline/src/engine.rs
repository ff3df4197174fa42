//! Pipeline engine

use alerting::{Alert, AlertDispatcher};
use behavior::{BehaviorAnalysisResult, BehaviorAnalyzer, DrivingEvent};
use chrono::{DateTime, Utc};
use data_validator::{ValidationError, Validator};
use feature_engine::WindowFeatures;
use ring_buffer::RingBuffer;
use risk_predictor::{AccidentPrediction, AccidentPredictor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{DrivingEventRecord, PredictionRecord, Repository, StorageError};
use telemetry::TelemetrySample;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::sink::store_alerts;
use crate::PipelineError;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub vehicle_id: String,
    pub customer_id: String,
    /// Samples analyzed per step; scoring starts once this many are buffered
    pub analysis_window: usize,
    /// Trailing samples handed to the predictor
    pub prediction_window: usize,
    /// Samples kept in the trailing window
    pub history_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vehicle_id: "vehicle-001".to_string(),
            customer_id: "customer-001".to_string(),
            analysis_window: 30,
            prediction_window: 20,
            history_capacity: 100,
        }
    }
}

/// Everything produced for one scored sample
#[derive(Debug)]
pub struct PipelineOutput {
    pub analysis: BehaviorAnalysisResult,
    /// Statistics of the analyzed window
    pub features: WindowFeatures,
    pub prediction: AccidentPrediction,
    /// Events not seen in an earlier step
    pub new_events: Vec<DrivingEvent>,
    pub alerts: Vec<Alert>,
    pub storage_errors: Vec<StorageError>,
}

/// Counters returned when a run ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub samples_received: u64,
    pub samples_rejected: u64,
    pub outputs: u64,
    pub alerts: u64,
    pub storage_errors: u64,
}

/// Per-vehicle scoring pipeline
pub struct SafetyPipeline {
    config: PipelineConfig,
    validator: Validator,
    analyzer: BehaviorAnalyzer,
    predictor: Arc<AccidentPredictor>,
    dispatcher: Arc<AlertDispatcher>,
    repository: Arc<Repository>,
    window: RingBuffer<TelemetrySample>,
    /// Timestamp of the newest event already dispatched
    last_dispatched: Option<DateTime<Utc>>,
}

impl SafetyPipeline {
    pub fn new(
        config: PipelineConfig,
        analyzer: BehaviorAnalyzer,
        predictor: Arc<AccidentPredictor>,
        dispatcher: Arc<AlertDispatcher>,
        repository: Arc<Repository>,
    ) -> Self {
        info!("Creating pipeline with config: {:?}", config);
        let capacity = config
            .history_capacity
            .max(config.analysis_window)
            .max(config.prediction_window);
        Self {
            validator: Validator::default(),
            analyzer,
            predictor,
            dispatcher,
            repository,
            window: RingBuffer::new(capacity),
            last_dispatched: None,
            config,
        }
    }

    /// Replace the default validator
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Samples currently buffered
    pub fn buffered(&self) -> usize {
        self.window.len()
    }

    /// Push one sample. Returns `Ok(None)` while the window is warming up.
    pub fn ingest(&mut self, sample: TelemetrySample) -> Result<Option<PipelineOutput>, PipelineError> {
        self.validator.validate_sample(&sample)?;
        if let Some(previous) = self.window.latest() {
            if sample.timestamp < previous.timestamp {
                return Err(ValidationError::OutOfOrder {
                    index: self.window.len(),
                }
                .into());
            }
        }

        metrics::counter!("telemetry_samples_total").increment(1);

        let mut storage_errors = Vec::new();
        if let Err(err) = self.repository.insert_telemetry(&self.config.vehicle_id, sample.clone()) {
            storage_errors.push(err);
        }

        self.window.push(sample);
        if self.window.len() < self.config.analysis_window {
            self.record_storage_errors(&storage_errors);
            return Ok(None);
        }

        let recent = self.window.tail(self.config.analysis_window);
        let analysis = self.analyzer.analyze_behavior(&recent);
        let features = WindowFeatures::extract(&recent);

        let new_events: Vec<DrivingEvent> = analysis
            .events
            .iter()
            .filter(|e| self.last_dispatched.map_or(true, |t| e.timestamp > t))
            .cloned()
            .collect();

        let mut alerts = Vec::new();
        for event in &new_events {
            metrics::counter!("driving_events_total", "type" => event.event_type.as_str()).increment(1);
            let record = DrivingEventRecord::new(self.config.vehicle_id.clone(), event.clone());
            if let Err(err) = self.repository.insert_driving_event(record) {
                storage_errors.push(err);
            }
            if let Some(alert) = self.dispatcher.process_driving_event(event) {
                alerts.push(alert);
            }
        }
        if let Some(newest) = new_events.iter().map(|e| e.timestamp).max() {
            self.last_dispatched = Some(newest);
        }

        let Some(current) = recent.last().cloned() else {
            return Ok(None);
        };
        let trailing = self.window.tail(self.config.prediction_window);
        let prediction = self
            .predictor
            .predict_accident_risk(&current, &trailing, &analysis.events);
        metrics::histogram!("risk_score").record(prediction.risk_score);

        let prediction_alerts = self
            .dispatcher
            .process_accident_prediction(&prediction, current.location());

        let record = PredictionRecord {
            id: 0,
            vehicle_id: self.config.vehicle_id.clone(),
            trip_id: None,
            location: current.location(),
            speed: current.speed,
            alert_sent: !prediction_alerts.is_empty(),
            prediction: prediction.clone(),
        };
        if let Err(err) = self.repository.insert_prediction(record) {
            storage_errors.push(err);
        }
        alerts.extend(prediction_alerts);
        storage_errors.extend(store_alerts(
            &self.repository,
            &self.config.vehicle_id,
            &self.config.customer_id,
            &alerts,
        ));

        debug!(
            "Scored {}: behavior {:.0} ({}), risk {:.2} ({}), {} new events, {} alerts",
            self.config.vehicle_id,
            analysis.overall_score,
            analysis.risk_level.as_str(),
            prediction.risk_score,
            prediction.risk_level.as_str(),
            new_events.len(),
            alerts.len()
        );

        self.record_storage_errors(&storage_errors);

        Ok(Some(PipelineOutput {
            analysis,
            features,
            prediction,
            new_events,
            alerts,
            storage_errors,
        }))
    }

    fn record_storage_errors(&self, errors: &[StorageError]) {
        for err in errors {
            metrics::counter!("storage_errors_total").increment(1);
            error!("Storage write failed for {}: {}", self.config.vehicle_id, err);
        }
    }

    /// Consume samples until the channel closes
    pub async fn run(mut self, mut rx: mpsc::Receiver<TelemetrySample>) -> PipelineStats {
        let mut stats = PipelineStats::default();
        info!("Pipeline for {} running", self.config.vehicle_id);

        while let Some(sample) = rx.recv().await {
            stats.samples_received += 1;
            match self.ingest(sample) {
                Ok(Some(output)) => {
                    stats.outputs += 1;
                    stats.alerts += output.alerts.len() as u64;
                    stats.storage_errors += output.storage_errors.len() as u64;
                }
                Ok(None) => {}
                Err(err) => {
                    stats.samples_rejected += 1;
                    warn!("Pipeline for {} dropped a sample: {}", self.config.vehicle_id, err);
                }
            }
        }

        info!("Pipeline for {} finished: {:?}", self.config.vehicle_id, stats);
        stats
    }
}
