//! Table rows

use alerting::Alert;
use behavior::DrivingEvent;
use chrono::{DateTime, Utc};
use risk_predictor::AccidentPrediction;
use safety_report::SafetyReport;
use serde::{Deserialize, Serialize};
use telemetry::{GeoPoint, TelemetrySample};

/// Telemetry row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    pub vehicle_id: String,
    #[serde(flatten)]
    pub sample: TelemetrySample,
}

/// Driving event row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivingEventRecord {
    /// Assigned on insert
    pub id: u64,
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(flatten)]
    pub event: DrivingEvent,
}

impl DrivingEventRecord {
    pub fn new(vehicle_id: impl Into<String>, event: DrivingEvent) -> Self {
        Self {
            id: 0,
            vehicle_id: vehicle_id.into(),
            trip_id: None,
            event,
        }
    }
}

/// Accident prediction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    /// Assigned on insert
    pub id: u64,
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    /// Where the predicted sample was taken
    pub location: GeoPoint,
    pub speed: f64,
    /// Whether the prediction produced an alert
    pub alert_sent: bool,
    pub prediction: AccidentPrediction,
}

/// Alert row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub vehicle_id: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub alert: Alert,
}

impl AlertRecord {
    pub fn new(vehicle_id: impl Into<String>, customer_id: impl Into<String>, alert: Alert) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            customer_id: customer_id.into(),
            acknowledged_at: None,
            alert,
        }
    }
}

/// Insert notification
#[derive(Debug, Clone)]
pub enum StorageChange {
    Telemetry(TelemetryRecord),
    DrivingEvent(DrivingEventRecord),
    Prediction(PredictionRecord),
    Alert(AlertRecord),
    Report(Box<SafetyReport>),
}

impl StorageChange {
    /// Vehicle the inserted row belongs to
    pub fn vehicle_id(&self) -> &str {
        match self {
            StorageChange::Telemetry(r) => &r.vehicle_id,
            StorageChange::DrivingEvent(r) => &r.vehicle_id,
            StorageChange::Prediction(r) => &r.vehicle_id,
            StorageChange::Alert(r) => &r.vehicle_id,
            StorageChange::Report(r) => &r.vehicle_id,
        }
    }
}
