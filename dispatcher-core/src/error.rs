use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Message limit reached: {received} of {limit} messages already received")]
    LimitReached { received: i32, limit: i32 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

// Implement From for common error types
#[cfg(feature = "database")]
impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

/// How a failed remote call should be treated by a retrying caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Temporary unavailability or a timeout; the same call may succeed later.
    Transient,
    /// Malformed request or a definitive rejection; retrying cannot help.
    Permanent,
    /// Anything the caller did not anticipate.
    Unexpected,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Transient)
    }
}

/// Errors that know which [`FailureKind`] they belong to.
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(FailureKind::Transient.is_retryable());
        assert!(!FailureKind::Permanent.is_retryable());
        assert!(!FailureKind::Unexpected.is_retryable());
    }

    #[test]
    fn test_limit_reached_display() {
        let err = CoreError::LimitReached { received: 5, limit: 5 };
        assert_eq!(
            err.to_string(),
            "Message limit reached: 5 of 5 messages already received"
        );
    }
}
