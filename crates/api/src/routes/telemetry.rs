//! Telemetry Routes

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use telemetry::TelemetrySample;

use crate::{ApiError, SharedState};

/// Query parameters for the telemetry endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryQuery {
    pub vehicle_id: Option<String>,
    /// Maximum number of records to return
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Return records at or after this time, oldest first
    pub since: Option<DateTime<Utc>>,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Serialize)]
pub struct TelemetryResponse {
    pub data: Vec<TelemetrySample>,
    pub meta: TelemetryMeta,
}

#[derive(Debug, Serialize)]
pub struct TelemetryMeta {
    pub count: usize,
    pub limit: usize,
}

/// Stored telemetry for one vehicle
pub async fn get_telemetry(
    State(state): State<SharedState>,
    Query(params): Query<TelemetryQuery>,
) -> Result<Json<TelemetryResponse>, ApiError> {
    let state = state.read().await;
    let limit = params.limit.min(1000);
    let vehicle_id = params
        .vehicle_id
        .as_deref()
        .unwrap_or(&state.settings.pipeline.vehicle_id);

    let data = match params.since {
        Some(since) => {
            let mut samples = state.repository.get_telemetry_since(vehicle_id, since)?;
            samples.truncate(limit);
            samples
        }
        None => state.repository.get_telemetry(vehicle_id, limit)?,
    };

    Ok(Json(TelemetryResponse {
        meta: TelemetryMeta {
            count: data.len(),
            limit,
        },
        data,
    }))
}
