use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dispatcher_core::CoreError;
use dispatcher_sdk::SdkError;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::extract::ExtractError;
use crate::resilience::RetryError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The completion came back but held no usable answer
    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),

    /// The completion service rejected the call
    #[error("Completion rejected: {0}")]
    CompletionRejected(String),

    /// The completion service stayed unavailable through every retry
    #[error("Completion service unavailable after {attempts} attempts: {message}")]
    CompletionUnavailable { attempts: u32, message: String },

    #[error("Request cancelled: {0}")]
    Cancelled(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(format!("Validation failed: {}", errors))
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ApiError::Validation(msg),
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            err @ CoreError::LimitReached { .. } => ApiError::Conflict(err.to_string()),
            CoreError::Database(msg) => ApiError::Storage(msg),
            CoreError::Serialization(msg) | CoreError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        ApiError::MalformedCompletion(err.to_string())
    }
}

/// Failures of the data source are not retried; they surface as a bad gateway.
impl From<SdkError> for ApiError {
    fn from(err: SdkError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<RetryError<SdkError>> for ApiError {
    fn from(err: RetryError<SdkError>) -> Self {
        match err {
            RetryError::Exhausted {
                attempts,
                last_error,
            } => ApiError::CompletionUnavailable {
                attempts,
                message: last_error.to_string(),
            },
            RetryError::Cancelled { attempts } => ApiError::Cancelled(format!(
                "server shutting down, gave up after {} attempts",
                attempts
            )),
            RetryError::Permanent(err) => ApiError::CompletionRejected(err.to_string()),
            RetryError::Unexpected(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "Validation error", Some(msg.clone())),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Resource not found", Some(msg.clone())),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            ApiError::MalformedCompletion(msg) => {
                tracing::warn!("Malformed completion: {}", msg);
                (StatusCode::BAD_GATEWAY, "Malformed completion", Some(msg.clone()))
            }
            ApiError::CompletionRejected(msg) => {
                (StatusCode::BAD_GATEWAY, "Completion rejected", Some(msg.clone()))
            }
            ApiError::CompletionUnavailable { message, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Completion service unavailable",
                Some(message.clone()),
            ),
            ApiError::Cancelled(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Request cancelled", Some(msg.clone()))
            }
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "Upstream error", Some(msg.clone())),
            ApiError::Storage(err) => {
                tracing::error!("Storage error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error", None)
            }
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", Some(err.clone()))
            }
        };

        let mut response_json = json!({
            "error": message,
        });

        if let Some(details_msg) = details {
            response_json["details"] = json!(details_msg);
        }

        (status, Json(response_json)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
