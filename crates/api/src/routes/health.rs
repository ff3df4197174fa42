//! Health and Metrics Routes

use axum::{extract::State, http::header, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{ApiError, SharedState};

/// Health response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
    pub counts: TableCounts,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    pub simulation_running: bool,
    pub pipeline_running: bool,
    /// None when MQTT forwarding is disabled
    pub mqtt_connected: Option<bool>,
    pub alert_subscribers: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub telemetry: usize,
    pub driving_events: usize,
    pub predictions: usize,
    pub alerts: usize,
    pub unread_alerts: usize,
}

pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let state = state.read().await;

    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus {
            simulation_running: state.simulator.is_running(),
            pipeline_running: state
                .pipeline_task
                .as_ref()
                .is_some_and(|task| !task.is_finished()),
            mqtt_connected: state.cloud.as_ref().map(|c| c.is_connected()),
            alert_subscribers: state.dispatcher.subscriber_count(),
        },
        counts: TableCounts {
            telemetry: state.repository.telemetry_count(),
            driving_events: state.repository.event_count(),
            predictions: state.repository.prediction_count(),
            alerts: state.repository.alert_count(),
            unread_alerts: state.dispatcher.unread_count(),
        },
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let state = state.read().await;
    let handle = state.metrics.as_ref().ok_or(ApiError::MetricsUnavailable)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
