//! Alert Routes

use alerting::{Alert, AlertFilter, AlertSeverity};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use storage::StorageError;

use crate::{ApiError, SharedState};

/// Query parameters for alerts endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    /// Stored unread alerts for this customer instead of the live history
    pub customer_id: Option<String>,
    pub severity: Option<AlertSeverity>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for alerts endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub data: Vec<Alert>,
    pub count: usize,
    /// Counted in the same source as `data`, before filtering
    pub unread_count: usize,
}

/// Alerts, newest first
pub async fn get_alerts(
    State(state): State<SharedState>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<AlertResponse>, ApiError> {
    let state = state.read().await;
    let filter = AlertFilter {
        unread_only: params.unread_only,
        severity: params.severity,
    };

    let (mut data, unread_count): (Vec<Alert>, usize) = match params.customer_id.as_deref() {
        Some(customer_id) => {
            let stored = state.repository.get_unread_alerts(customer_id)?;
            let unread = stored.len();
            let data = stored
                .into_iter()
                .map(|record| record.alert)
                .filter(|alert| filter.matches(alert))
                .collect();
            (data, unread)
        }
        None => (state.dispatcher.alerts(filter), state.dispatcher.unread_count()),
    };
    data.truncate(params.limit.min(500));

    Ok(Json(AlertResponse {
        count: data.len(),
        unread_count,
        data,
    }))
}

/// Critical alerts still waiting for acknowledgement
pub async fn get_critical(State(state): State<SharedState>) -> Json<Vec<Alert>> {
    let state = state.read().await;
    Json(state.dispatcher.critical_alerts())
}

pub async fn mark_read(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state.read().await;
    let in_history = state.dispatcher.mark_as_read(&id);
    let stored = state.repository.mark_alert_as_read(&id);
    settle(id, in_history, stored)
}

pub async fn acknowledge(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state.read().await;
    let in_history = state.dispatcher.acknowledge(&id);
    let stored = state.repository.acknowledge_alert(&id);
    settle(id, in_history, stored)
}

/// An alert may have left the live history but still be stored, or the reverse
fn settle(
    id: String,
    in_history: bool,
    stored: Result<(), StorageError>,
) -> Result<StatusCode, ApiError> {
    match stored {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StorageError::NotFound { .. }) if in_history => Ok(StatusCode::NO_CONTENT),
        Err(StorageError::NotFound { .. }) => Err(ApiError::AlertNotFound(id)),
        Err(err) => Err(err.into()),
    }
}
