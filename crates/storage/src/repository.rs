//! Repository Implementation

use crate::records::{AlertRecord, DrivingEventRecord, PredictionRecord, StorageChange, TelemetryRecord};
use crate::StorageError;
use chrono::{DateTime, Utc};
use safety_report::{ReportType, SafetyReport};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use telemetry::TelemetrySample;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Retention limits per table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// ~28 hours at 1 Hz
    pub max_telemetry_records: usize,
    pub max_event_records: usize,
    pub max_prediction_records: usize,
    pub max_alert_records: usize,
    pub max_report_records: usize,
    /// Insert notifications buffered per subscriber
    pub notification_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_telemetry_records: 100_000,
            max_event_records: 10_000,
            max_prediction_records: 10_000,
            max_alert_records: 10_000,
            max_report_records: 1_000,
            notification_capacity: 1024,
        }
    }
}

fn lock<'a, T>(table: &'static str, mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>, StorageError> {
    mutex.lock().map_err(|_| StorageError::LockPoisoned(table))
}

/// Append with retention: the oldest row goes first
fn append<T>(rows: &mut VecDeque<T>, row: T, max: usize) {
    while rows.len() >= max.max(1) {
        rows.pop_front();
    }
    rows.push_back(row);
}

/// Repository for data access (in-memory tables)
pub struct Repository {
    config: StorageConfig,
    telemetry: Mutex<VecDeque<TelemetryRecord>>,
    events: Mutex<VecDeque<DrivingEventRecord>>,
    predictions: Mutex<VecDeque<PredictionRecord>>,
    alerts: Mutex<VecDeque<AlertRecord>>,
    reports: Mutex<VecDeque<SafetyReport>>,
    next_event_id: AtomicU64,
    next_prediction_id: AtomicU64,
    changes: broadcast::Sender<StorageChange>,
}

impl Repository {
    pub fn new(config: StorageConfig) -> Self {
        info!("Creating in-memory repository with config: {:?}", config);
        let (changes, _) = broadcast::channel(config.notification_capacity.max(1));
        Self {
            telemetry: Mutex::new(VecDeque::with_capacity(1024)),
            events: Mutex::new(VecDeque::new()),
            predictions: Mutex::new(VecDeque::new()),
            alerts: Mutex::new(VecDeque::new()),
            reports: Mutex::new(VecDeque::new()),
            next_event_id: AtomicU64::new(1),
            next_prediction_id: AtomicU64::new(1),
            changes,
            config,
        }
    }

    /// Receive every subsequent insert. Slow receivers lag and skip rows.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StorageChange) {
        // No receivers is fine
        let _ = self.changes.send(change);
    }

    pub fn insert_telemetry(&self, vehicle_id: &str, sample: TelemetrySample) -> Result<(), StorageError> {
        let record = TelemetryRecord {
            vehicle_id: vehicle_id.to_string(),
            sample,
        };
        {
            let mut rows = lock("telemetry", &self.telemetry)?;
            append(&mut rows, record.clone(), self.config.max_telemetry_records);
        }
        self.notify(StorageChange::Telemetry(record));
        Ok(())
    }

    /// Insert a driving event, returning its assigned id
    pub fn insert_driving_event(&self, mut record: DrivingEventRecord) -> Result<u64, StorageError> {
        record.id = self.next_event_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut rows = lock("driving_events", &self.events)?;
            append(&mut rows, record.clone(), self.config.max_event_records);
        }
        debug!("Inserted {} event {} for {}", record.event.event_type, record.id, record.vehicle_id);
        let id = record.id;
        self.notify(StorageChange::DrivingEvent(record));
        Ok(id)
    }

    /// Insert a prediction, returning its assigned id
    pub fn insert_prediction(&self, mut record: PredictionRecord) -> Result<u64, StorageError> {
        record.id = self.next_prediction_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut rows = lock("predictions", &self.predictions)?;
            append(&mut rows, record.clone(), self.config.max_prediction_records);
        }
        debug!("Inserted prediction with ID {}", record.id);
        let id = record.id;
        self.notify(StorageChange::Prediction(record));
        Ok(id)
    }

    pub fn insert_alert(&self, record: AlertRecord) -> Result<(), StorageError> {
        {
            let mut rows = lock("alerts", &self.alerts)?;
            append(&mut rows, record.clone(), self.config.max_alert_records);
        }
        debug!("Inserted alert {} for customer {}", record.alert.id, record.customer_id);
        self.notify(StorageChange::Alert(record));
        Ok(())
    }

    pub fn insert_safety_report(&self, report: SafetyReport) -> Result<(), StorageError> {
        {
            let mut rows = lock("reports", &self.reports)?;
            append(&mut rows, report.clone(), self.config.max_report_records);
        }
        info!("Stored {} report {} for customer {}", report.report_type, report.id, report.customer_id);
        self.notify(StorageChange::Report(Box::new(report)));
        Ok(())
    }

    /// Latest telemetry for a vehicle, newest first
    pub fn get_telemetry(&self, vehicle_id: &str, limit: usize) -> Result<Vec<TelemetrySample>, StorageError> {
        let rows = lock("telemetry", &self.telemetry)?;
        let mut samples: Vec<_> = rows
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id)
            .map(|r| r.sample.clone())
            .collect();
        samples.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        samples.truncate(limit);
        Ok(samples)
    }

    /// Telemetry for a vehicle at or after `since`, oldest first
    pub fn get_telemetry_since(
        &self,
        vehicle_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<TelemetrySample>, StorageError> {
        let rows = lock("telemetry", &self.telemetry)?;
        let mut samples: Vec<_> = rows
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id && r.sample.timestamp >= since)
            .map(|r| r.sample.clone())
            .collect();
        samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(samples)
    }

    /// Events for a vehicle within an inclusive range, newest first
    pub fn get_driving_events(
        &self,
        vehicle_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<DrivingEventRecord>, StorageError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(StorageError::InvalidRange);
            }
        }

        let rows = lock("driving_events", &self.events)?;
        let mut events: Vec<_> = rows
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id)
            .filter(|r| start.map_or(true, |s| r.event.timestamp >= s))
            .filter(|r| end.map_or(true, |e| r.event.timestamp <= e))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.event.timestamp.cmp(&a.event.timestamp));
        Ok(events)
    }

    /// Latest predictions for a vehicle, newest first
    pub fn get_recent_predictions(
        &self,
        vehicle_id: &str,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, StorageError> {
        let rows = lock("predictions", &self.predictions)?;
        let mut predictions: Vec<_> = rows
            .iter()
            .filter(|r| r.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        predictions.sort_by(|a, b| b.prediction.timestamp.cmp(&a.prediction.timestamp));
        predictions.truncate(limit);
        Ok(predictions)
    }

    /// Unread alerts for a customer, newest first
    pub fn get_unread_alerts(&self, customer_id: &str) -> Result<Vec<AlertRecord>, StorageError> {
        let rows = lock("alerts", &self.alerts)?;
        let mut alerts: Vec<_> = rows
            .iter()
            .filter(|r| r.customer_id == customer_id && !r.alert.is_read)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| b.alert.timestamp.cmp(&a.alert.timestamp));
        Ok(alerts)
    }

    pub fn mark_alert_as_read(&self, alert_id: &str) -> Result<(), StorageError> {
        let mut rows = lock("alerts", &self.alerts)?;
        let record = find_alert(&mut rows, alert_id)?;
        record.alert.is_read = true;
        Ok(())
    }

    /// Acknowledge an alert row (also marks it read)
    pub fn acknowledge_alert(&self, alert_id: &str) -> Result<(), StorageError> {
        let mut rows = lock("alerts", &self.alerts)?;
        let record = find_alert(&mut rows, alert_id)?;
        record.alert.is_acknowledged = true;
        record.alert.is_read = true;
        record.acknowledged_at = Some(Utc::now());
        Ok(())
    }

    /// Reports for a customer, newest first
    pub fn get_safety_reports(
        &self,
        customer_id: &str,
        report_type: Option<ReportType>,
    ) -> Result<Vec<SafetyReport>, StorageError> {
        let rows = lock("reports", &self.reports)?;
        let mut reports: Vec<_> = rows
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .filter(|r| report_type.map_or(true, |t| r.report_type == t))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(reports)
    }

    pub fn telemetry_count(&self) -> usize {
        self.telemetry.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn prediction_count(&self) -> usize {
        self.predictions.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut rows) = self.telemetry.lock() {
            rows.clear();
        }
        if let Ok(mut rows) = self.events.lock() {
            rows.clear();
        }
        if let Ok(mut rows) = self.predictions.lock() {
            rows.clear();
        }
        if let Ok(mut rows) = self.alerts.lock() {
            rows.clear();
        }
        if let Ok(mut rows) = self.reports.lock() {
            rows.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(StorageConfig::default())
    }
}

fn find_alert<'a>(
    rows: &'a mut VecDeque<AlertRecord>,
    alert_id: &str,
) -> Result<&'a mut AlertRecord, StorageError> {
    rows.iter_mut()
        .rev()
        .find(|r| r.alert.id == alert_id)
        .ok_or_else(|| StorageError::NotFound {
            table: "alerts",
            id: alert_id.to_string(),
        })
}
