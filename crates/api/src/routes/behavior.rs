//! Behavior Routes

use axum::{extract::State, Json};
use behavior::BehaviorAnalysisResult;
use telemetry::TelemetrySample;
use tracing::debug;

use crate::{ApiError, SharedState};

/// Score an ordered telemetry window
pub async fn analyze(
    State(state): State<SharedState>,
    Json(window): Json<Vec<TelemetrySample>>,
) -> Result<Json<BehaviorAnalysisResult>, ApiError> {
    let state = state.read().await;
    state.validator.validate_non_empty(&window)?;

    let result = state.analyzer.analyze_behavior(&window);
    debug!(
        "Analyzed {} samples: score {:.1}, {} events",
        window.len(),
        result.overall_score,
        result.events.len()
    );
    Ok(Json(result))
}
