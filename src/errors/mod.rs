//! Error handling module for the console gateway.
//!
//! One error type covers both the upstream fetch contracts and the gateway's own
//! HTTP surface. Each variant maps to a stable error code and an HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const SIGN_IN_REQUIRED: &str = "SIGN_IN_REQUIRED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const TRANSIENT_FAILURE: &str = "TRANSIENT_FAILURE";
    pub const MALFORMED_RECORD: &str = "MALFORMED_RECORD";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Console error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Upstream rejected the session credential (401)
    Unauthorized(String),
    /// Upstream has nothing for this request (404)
    NotFound(String),
    /// Any other upstream failure; retryable by the user
    Transient(String),
    /// A record that cannot be identified or decoded
    MalformedRecord(String),
    /// Bad input on the gateway surface
    Validation(String),
    /// Invalid configuration at startup
    Config(String),
}

impl ConsoleError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsoleError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ConsoleError::NotFound(_) => StatusCode::NOT_FOUND,
            ConsoleError::Transient(_) => StatusCode::BAD_GATEWAY,
            ConsoleError::MalformedRecord(_) => StatusCode::BAD_GATEWAY,
            ConsoleError::Validation(_) => StatusCode::BAD_REQUEST,
            ConsoleError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Unauthorized(_) => codes::UNAUTHORIZED,
            ConsoleError::NotFound(_) => codes::NOT_FOUND,
            ConsoleError::Transient(_) => codes::TRANSIENT_FAILURE,
            ConsoleError::MalformedRecord(_) => codes::MALFORMED_RECORD,
            ConsoleError::Validation(_) => codes::VALIDATION_ERROR,
            ConsoleError::Config(_) => codes::CONFIG_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            ConsoleError::Unauthorized(msg)
            | ConsoleError::NotFound(msg)
            | ConsoleError::Transient(msg)
            | ConsoleError::MalformedRecord(msg)
            | ConsoleError::Validation(msg)
            | ConsoleError::Config(msg) => msg,
        }
    }

    /// Whether the user may retry the failed operation by hand.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConsoleError::Transient(_))
    }
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ConsoleError {}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::warn!("Undecodable upstream payload: {:?}", err);
            return ConsoleError::MalformedRecord(format!("Undecodable payload: {}", err));
        }
        tracing::warn!("Upstream transport error: {:?}", err);
        ConsoleError::Transient(format!("Upstream request failed: {}", err))
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        tracing::warn!("JSON error: {:?}", err);
        ConsoleError::MalformedRecord(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &ConsoleError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message().to_string(),
                retryable: error.is_retryable(),
            },
        }
    }

    /// Envelope telling the UI to drop its session and go to sign-in.
    pub fn sign_in_required(message: &str) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: codes::SIGN_IN_REQUIRED.to_string(),
                message: message.to_string(),
                retryable: false,
            },
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ConsoleError::Unauthorized(msg) => ErrorResponse::sign_in_required(msg),
            other => ErrorResponse::new(other),
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
            ConsoleError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ConsoleError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ConsoleError::Transient("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ConsoleError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ConsoleError::Transient("boom".into()).is_retryable());
        assert!(!ConsoleError::Unauthorized("no".into()).is_retryable());
        assert!(!ConsoleError::MalformedRecord("bad".into()).is_retryable());
    }

    #[test]
    fn test_unauthorized_envelope_requests_sign_in() {
        let body = ErrorResponse::sign_in_required("Session expired");
        assert!(!body.success);
        assert_eq!(body.error.code, codes::SIGN_IN_REQUIRED);
    }

    #[test]
    fn test_display_includes_code() {
        let err = ConsoleError::Transient("upstream 503".into());
        assert_eq!(err.to_string(), "TRANSIENT_FAILURE: upstream 503");
    }
}
