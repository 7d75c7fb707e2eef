//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use hearth_domain::error::HearthError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`HearthError`] to an HTTP response with appropriate status code.
pub struct ApiError(HearthError);

impl From<HearthError> for ApiError {
    fn from(err: HearthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HearthError::UnknownDevice(_) | HearthError::NotFound { .. } => StatusCode::NOT_FOUND,
            HearthError::InvalidAttribute { .. }
            | HearthError::InvalidTime(_)
            | HearthError::EmptyField { .. } => StatusCode::BAD_REQUEST,
            HearthError::DuplicateDevice(_) | HearthError::AlreadyFired(_) => StatusCode::CONFLICT,
            HearthError::RuleCycleExceeded { .. } => {
                tracing::error!(error = %self.0, "runtime error surfaced to the API");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
