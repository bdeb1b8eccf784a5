//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use stovepanel_domain::error::{PanelError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`PanelError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(PanelError);

impl From<PanelError> for ApiError {
    fn from(err: PanelError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(PanelError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PanelError::Validation(err @ ValidationError::ScheduleExists(_)) => {
                (StatusCode::CONFLICT, err.to_string())
            }
            PanelError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            PanelError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            PanelError::ConfigurationMissing(err) => (StatusCode::CONFLICT, err.to_string()),
            PanelError::Upstream(err) => {
                tracing::warn!(error = %err, "upstream error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            PanelError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
