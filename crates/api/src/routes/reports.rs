//! Report Routes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use safety_report::{ReportRequest, ReportType, SafetyReport};
use serde::Deserialize;
use tracing::info;

use crate::{ApiError, SharedState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// Defaults to the configured customer
    pub customer_id: Option<String>,
    pub report_type: Option<ReportType>,
}

/// Generate and store a report for the given period data
pub async fn create_report(
    State(state): State<SharedState>,
    Json(request): Json<ReportRequest>,
) -> Result<(StatusCode, Json<SafetyReport>), ApiError> {
    let state = state.read().await;
    let report = state.reports.generate_report(&request);
    state.repository.insert_safety_report(report.clone())?;

    info!(
        "Generated {} report {} for {}",
        report.report_type, report.id, report.vehicle_id
    );
    Ok((StatusCode::CREATED, Json(report)))
}

/// Stored reports, newest first
pub async fn get_reports(
    State(state): State<SharedState>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<Vec<SafetyReport>>, ApiError> {
    let state = state.read().await;
    let customer_id = params
        .customer_id
        .as_deref()
        .unwrap_or(&state.settings.pipeline.customer_id);

    Ok(Json(
        state.repository.get_safety_reports(customer_id, params.report_type)?,
    ))
}
