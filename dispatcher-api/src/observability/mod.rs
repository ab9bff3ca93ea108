//! Observability for the dispatcher API
//!
//! Structured logging with request correlation IDs. Every handler and the
//! retry executor log through `tracing`.

pub mod logging;

pub use logging::{
    duration_millis, init_logging, redact_headers, request_logging_middleware, LogConfig, LogFormat,
    REQUEST_ID_HEADER, SENSITIVE_HEADERS,
};
