//! API error handling.
//!
//! Provides consistent error responses for the API. Raw engine diagnostics
//! are logged for operators and never returned to the caller.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use ytdlp_bridge::ExtractorError;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Create a 403 Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ExtractorError> for ApiError {
    fn from(err: ExtractorError) -> Self {
        match err {
            ExtractorError::InvalidUrl(url) => {
                tracing::debug!(%url, "rejected invalid url");
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "INVALID_URL",
                    "A valid http(s) video URL is required",
                )
            }
            ExtractorError::UnsupportedSource => ApiError::new(
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_SOURCE",
                "This URL is not supported",
            ),
            ExtractorError::RestrictedSource => ApiError::new(
                StatusCode::FORBIDDEN,
                "RESTRICTED_SOURCE",
                "This video is private or unavailable",
            ),
            ExtractorError::EngineInit(e) => {
                tracing::error!(error = %e, "engine provisioning failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ENGINE_INIT_FAILED",
                    "The analysis engine could not be prepared",
                )
            }
            ExtractorError::Timeout(budget) => {
                tracing::error!(budget_secs = budget.as_secs(), "extraction timed out");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXTRACTION_TIMEOUT",
                    "Analyzing the video took too long",
                )
            }
            ExtractorError::MalformedOutput(e) => {
                tracing::error!(error = %e, "engine emitted unparsable output");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MALFORMED_ENGINE_OUTPUT",
                    "The analysis engine returned unreadable data",
                )
            }
            ExtractorError::SpawnFailed(e) => {
                tracing::error!(error = %e, "engine process failed to start");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXTRACTION_FAILED",
                    "Video analysis failed",
                )
            }
            ExtractorError::Other(detail) => {
                tracing::error!(%detail, "extraction failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXTRACTION_FAILED",
                    "Video analysis failed",
                )
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
