//! SDK error types and handling
//!
//! This module provides error handling for the HTTP clients and sorts every
//! error into a [`FailureKind`] so callers can decide whether to retry.

use dispatcher_core::{Classify, FailureKind};
use thiserror::Error;

/// The main error type for the SDK
#[derive(Error, Debug)]
pub enum SdkError {
    /// API returned an error response not covered by a more specific variant
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Network error that is neither a timeout nor a connection failure
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The remote host could not be reached
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    /// Request timed out
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// The service reported it is temporarily overloaded
    #[error("Service overloaded: {0}")]
    Overloaded(String),

    /// Server error
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Authorization failed
    #[error("Access denied: {0}")]
    AuthorizationError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The request was rejected as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// The response parsed but did not contain what was expected
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type alias for SDK operations
pub type SdkResult<T> = Result<T, SdkError>;

/// Error payloads seen in the wild: `{"error": {"type", "message"}}` from the
/// completion service and `{"message": ...}` / `{"error": "..."}` elsewhere.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Nested { error: ErrorDetail },
    Flat { message: String },
    Plain { error: String },
}

#[derive(Debug, serde::Deserialize)]
struct ErrorDetail {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    message: String,
}

impl SdkError {
    /// Create an error from a non-success response
    pub fn from_response(status: u16, body: &str, retry_after: Option<u64>) -> Self {
        let (kind, message) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody::Nested { error }) => (error.kind, error.message),
            Ok(ErrorBody::Flat { message }) => (None, message),
            Ok(ErrorBody::Plain { error }) => (None, error),
            Err(_) => (None, body.to_string()),
        };

        match status {
            400 | 413 | 422 => SdkError::InvalidRequest(message),
            401 => SdkError::AuthenticationError(message),
            403 => SdkError::AuthorizationError(message),
            404 => SdkError::NotFound(message),
            408 => SdkError::Timeout(0),
            429 => SdkError::RateLimited {
                retry_after: retry_after.unwrap_or(60),
            },
            529 => SdkError::Overloaded(message),
            500..=599 if kind.as_deref() == Some("overloaded_error") => {
                SdkError::Overloaded(message)
            }
            500..=599 => SdkError::ServerError { status, message },
            _ => SdkError::ApiError { status, message },
        }
    }

    /// Sort a transport-level failure into the right variant
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            SdkError::Timeout(timeout_secs)
        } else if err.is_connect() {
            SdkError::ConnectionError(err.to_string())
        } else {
            SdkError::NetworkError(err)
        }
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SdkError::ApiError { status, .. } | SdkError::ServerError { status, .. } => {
                Some(*status)
            }
            SdkError::RateLimited { .. } => Some(429),
            SdkError::Overloaded(_) => Some(529),
            SdkError::AuthenticationError(_) => Some(401),
            SdkError::AuthorizationError(_) => Some(403),
            SdkError::NotFound(_) => Some(404),
            SdkError::InvalidRequest(_) => Some(400),
            _ => None,
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        self.failure_kind().is_retryable()
    }
}

impl Classify for SdkError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            SdkError::Timeout(_)
            | SdkError::ConnectionError(_)
            | SdkError::RateLimited { .. }
            | SdkError::Overloaded(_)
            | SdkError::ServerError { .. } => FailureKind::Transient,
            SdkError::ApiError { .. }
            | SdkError::AuthenticationError(_)
            | SdkError::AuthorizationError(_)
            | SdkError::NotFound(_)
            | SdkError::InvalidRequest(_)
            | SdkError::ConfigurationError(_) => FailureKind::Permanent,
            SdkError::NetworkError(_)
            | SdkError::SerializationError(_)
            | SdkError::UrlError(_)
            | SdkError::UnexpectedResponse(_) => FailureKind::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_nested_json_response() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens: required"}}"#;
        let error = SdkError::from_response(400, body, None);

        match error {
            SdkError::InvalidRequest(message) => assert_eq!(message, "max_tokens: required"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_overloaded_error_type_maps_to_overloaded() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert!(matches!(
            SdkError::from_response(503, body, None),
            SdkError::Overloaded(_)
        ));
        assert!(matches!(
            SdkError::from_response(529, "busy", None),
            SdkError::Overloaded(_)
        ));
    }

    #[test]
    fn test_rate_limit_uses_retry_after() {
        match SdkError::from_response(429, "", Some(12)) {
            SdkError::RateLimited { retry_after } => assert_eq!(retry_after, 12),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(SdkError::Timeout(30).failure_kind(), FailureKind::Transient);
        assert_eq!(
            SdkError::ServerError { status: 502, message: String::new() }.failure_kind(),
            FailureKind::Transient
        );
        assert_eq!(
            SdkError::AuthenticationError("bad key".to_string()).failure_kind(),
            FailureKind::Permanent
        );
        assert_eq!(
            SdkError::UnexpectedResponse("no text".to_string()).failure_kind(),
            FailureKind::Unexpected
        );
    }

    #[test]
    fn test_timeouts_rate_limits_and_connection_failures_are_transient() {
        for err in [
            SdkError::from_response(408, "", None),
            SdkError::from_response(429, "", None),
            SdkError::from_response(529, "", None),
            SdkError::ConnectionError("connection refused".to_string()),
        ] {
            assert_eq!(err.failure_kind(), FailureKind::Transient, "{:?}", err);
        }
        assert_eq!(
            SdkError::from_response(400, "", None).failure_kind(),
            FailureKind::Permanent
        );
    }

    #[test]
    fn test_error_status_code() {
        let api_error = SdkError::ApiError {
            status: 418,
            message: "teapot".to_string(),
        };
        assert_eq!(api_error.status_code(), Some(418));

        let auth_error = SdkError::AuthenticationError("Invalid token".to_string());
        assert_eq!(auth_error.status_code(), Some(401));
        assert_eq!(SdkError::Timeout(1).status_code(), None);
    }
}
