//! Simulation Routes

use axum::{extract::State, Json};
use pipeline::PipelineStats;
use serde::{Deserialize, Serialize};
use telemetry::Scenario;
use tracing::warn;

use crate::{ApiError, SharedState};

/// Overrides for the configured simulation
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub scenario: Option<Scenario>,
    pub interval_ms: Option<u64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub vehicle_id: String,
    pub scenario: Scenario,
    pub interval_ms: u64,
    pub seed: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub stopped: bool,
    /// Counters from the pipeline run, if it finished cleanly
    pub stats: Option<PipelineStats>,
}

pub async fn start(
    State(state): State<SharedState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let mut state = state.write().await;

    let mut config = state.settings.simulation.clone();
    config.vehicle_id = state.settings.pipeline.vehicle_id.clone();
    if let Some(scenario) = request.scenario {
        config.scenario = scenario;
    }
    if let Some(interval_ms) = request.interval_ms {
        config.interval_ms = interval_ms;
    }
    if let Some(seed) = request.seed {
        config.seed = seed;
    }

    let response = StartResponse {
        vehicle_id: config.vehicle_id.clone(),
        scenario: config.scenario,
        interval_ms: config.interval_ms,
        seed: config.seed,
    };
    state.start_simulation(config)?;
    Ok(Json(response))
}

pub async fn stop(State(state): State<SharedState>) -> Result<Json<StopResponse>, ApiError> {
    // Release the lock before waiting on the pipeline
    let task = state.write().await.stop_simulation()?;

    let stats = match task {
        Some(task) => match task.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Pipeline task ended abnormally: {}", e);
                None
            }
        },
        None => None,
    };

    Ok(Json(StopResponse {
        stopped: true,
        stats,
    }))
}
