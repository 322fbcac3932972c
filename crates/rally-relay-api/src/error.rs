//! API error handling
//!
//! Every error leaves the API as a JSON [`ErrorResponse`]. Storage failures
//! become 500s; malformed request bodies are rejected before handler logic
//! with a 4xx and a machine-readable code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use rally_relay_service::ServiceError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Human-readable message
    pub error: String,

    /// Machine-readable code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// When the error was produced
    pub timestamp: DateTime<Utc>,
}

/// API error
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<String>,
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message).with_code("VALIDATION_ERROR")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Storage(e) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).with_code("DATABASE_ERROR")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_) => Self::validation(message),
            JsonRejection::JsonSyntaxError(_) => Self::new(status, message).with_code("INVALID_JSON"),
            JsonRejection::MissingJsonContentType(_) => {
                Self::new(status, message).with_code("UNSUPPORTED_MEDIA_TYPE")
            }
            _ => Self::new(status, message).with_code("BAD_REQUEST"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        } else {
            warn!(status = self.status.as_u16(), error = %self.message, "Request rejected");
        }

        let body = ErrorResponse {
            status: self.status.as_u16(),
            error: self.message,
            code: self.code,
            timestamp: Utc::now(),
        };
        (self.status, Json(body)).into_response()
    }
}
