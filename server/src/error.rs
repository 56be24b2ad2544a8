//! API error type and the JSON error payload.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use recovery_desk_core::DeskError;
use serde::Serialize;

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Failure raised by a service.
    #[error(transparent)]
    Desk(#[from] DeskError),
    /// Body was not valid JSON.
    #[error("{0}")]
    BadRequest(String),
    /// Body exceeded the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),
    /// No route matched.
    #[error("Not found: {0}")]
    RouteNotFound(String),
    /// The blocking worker itself failed.
    #[error("{0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Desk(DeskError::Validation { message }) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            // Duplicate unique keys are reported as a bad request with their
            // own message, separate from field validation.
            ApiError::Desk(DeskError::Conflict { message }) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            ApiError::Desk(DeskError::NotFound { entity }) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, message.clone())
            }
            ApiError::RouteNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Desk(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        if status.is_server_error() {
            log::error!("request failed: {self}");
        }
        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
