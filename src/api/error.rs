use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::errors::OrchestratorError;

/// Caller-visible failures. All of them render as a plain-text 500.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to fetch metrics")]
    MetricsUnavailable(#[source] OrchestratorError),

    #[error("Failed to encode response")]
    EncodeDashboard(#[source] serde_json::Error),

    #[error("Failed to encode history")]
    EncodeHistory(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Cold metrics failures are already logged by the aggregator.
        if let ApiError::EncodeDashboard(source) | ApiError::EncodeHistory(source) = &self {
            error!(error = %source, "{}", self);
        }

        (self.status(), format!("{}\n", self)).into_response()
    }
}
