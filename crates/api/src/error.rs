//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use risk_predictor::PredictorError;
use serde::Serialize;
use storage::StorageError;
use telemetry::SimulationError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Predictor(#[from] PredictorError),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("No simulation is running")]
    NotRunning,

    #[error("Metrics recorder is not installed")]
    MetricsUnavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(StorageError::NotFound { .. }) | ApiError::AlertNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Storage(StorageError::InvalidRange) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::LockPoisoned(_)) | ApiError::Predictor(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Simulation(SimulationError::AlreadyRunning) | ApiError::NotRunning => {
                StatusCode::CONFLICT
            }
            ApiError::Simulation(_) => StatusCode::BAD_REQUEST,
            ApiError::MetricsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "invalid_telemetry",
            ApiError::Storage(StorageError::NotFound { .. }) | ApiError::AlertNotFound(_) => "not_found",
            ApiError::Storage(StorageError::InvalidRange) => "invalid_range",
            ApiError::Storage(StorageError::LockPoisoned(_)) => "storage_unavailable",
            ApiError::Predictor(_) => "predictor_error",
            ApiError::Simulation(SimulationError::AlreadyRunning) => "simulation_running",
            ApiError::Simulation(_) => "invalid_simulation",
            ApiError::NotRunning => "simulation_not_running",
            ApiError::MetricsUnavailable => "metrics_unavailable",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ValidationError::EmptyWindow).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(StorageError::InvalidRange).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SimulationError::AlreadyRunning).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(SimulationError::InvalidInterval(0)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::AlertNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_message_carries_source() {
        let err = ApiError::from(ValidationError::OutOfOrder { index: 3 });
        assert_eq!(err.code(), "invalid_telemetry");
        assert!(err.to_string().contains("Sample 3"));
    }
}
