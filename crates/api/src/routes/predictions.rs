//! Prediction Routes

use alerting::Alert;
use axum::{
    extract::{Query, State},
    Json,
};
use behavior::DrivingEvent;
use pipeline::store_alerts;
use risk_predictor::AccidentPrediction;
use serde::{Deserialize, Serialize};
use storage::PredictionRecord;
use telemetry::TelemetrySample;

use crate::{ApiError, SharedState};

/// Body for a one-off prediction
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    /// Defaults to the configured vehicle
    pub vehicle_id: Option<String>,
    /// Defaults to the configured customer
    pub customer_id: Option<String>,
    pub trip_id: Option<String>,
    pub current: TelemetrySample,
    /// Trailing samples, oldest first
    #[serde(default)]
    pub recent: Vec<TelemetrySample>,
    #[serde(default)]
    pub events: Vec<DrivingEvent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub id: u64,
    pub prediction: AccidentPrediction,
    pub alerts: Vec<Alert>,
}

/// Query parameters for the predictions list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionQuery {
    pub vehicle_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct PredictionList {
    pub data: Vec<PredictionRecord>,
    pub count: usize,
}

/// Predict, alert and persist under the requesting vehicle
pub async fn create_prediction(
    State(state): State<SharedState>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let state = state.read().await;
    state.validator.validate_sample(&request.current)?;
    state.validator.validate_window(&request.recent)?;

    let prediction =
        state
            .predictor
            .predict_accident_risk(&request.current, &request.recent, &request.events);
    let location = request.current.location();
    let alerts = state.dispatcher.process_accident_prediction(&prediction, location);

    let vehicle_id = request
        .vehicle_id
        .unwrap_or_else(|| state.settings.pipeline.vehicle_id.clone());
    let customer_id = request
        .customer_id
        .unwrap_or_else(|| state.settings.pipeline.customer_id.clone());
    if let Some(err) = store_alerts(&state.repository, &vehicle_id, &customer_id, &alerts)
        .into_iter()
        .next()
    {
        return Err(err.into());
    }

    let id = state.repository.insert_prediction(PredictionRecord {
        id: 0,
        vehicle_id,
        trip_id: request.trip_id,
        location,
        speed: request.current.speed,
        alert_sent: !alerts.is_empty(),
        prediction: prediction.clone(),
    })?;

    Ok(Json(PredictionResponse {
        id,
        prediction,
        alerts,
    }))
}

/// Latest stored predictions, newest first
pub async fn get_predictions(
    State(state): State<SharedState>,
    Query(params): Query<PredictionQuery>,
) -> Result<Json<PredictionList>, ApiError> {
    let state = state.read().await;
    let vehicle_id = params
        .vehicle_id
        .as_deref()
        .unwrap_or(&state.settings.pipeline.vehicle_id);

    let data = state
        .repository
        .get_recent_predictions(vehicle_id, params.limit.min(500))?;

    Ok(Json(PredictionList {
        count: data.len(),
        data,
    }))
}
