use crate::types::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use picks_engine::{SimulationError, SourceError};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    BadDate(String),

    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Source(SourceError::Config(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_configuration")
            }
            ApiError::Source(_) => (StatusCode::SERVICE_UNAVAILABLE, "data_source_unavailable"),
            ApiError::BadDate(_) => (StatusCode::BAD_REQUEST, "invalid_date"),
            ApiError::Simulation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "simulation_failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        warn!("{} -> {}", self, status);
        let body = ErrorBody {
            error: code.to_string(),
            detail: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(SourceError::MissingApiKey).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(SourceError::Unavailable("HTTP 500".to_string()))
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(SourceError::Config(picks_engine::ConfigError::ConfidenceAbove100(101)))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadDate("17/08/2024".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SimulationError::Worker("panicked".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
