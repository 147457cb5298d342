//! Mapping from worker errors to HTTP status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_registry::RegistryError;
use gateway_worker::WorkerError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub WorkerError);

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkerError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            WorkerError::InvalidCommand(_) => StatusCode::BAD_REQUEST,
            WorkerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            WorkerError::NoResponse(_)
            | WorkerError::MalformedResponse { .. }
            | WorkerError::Remote { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
