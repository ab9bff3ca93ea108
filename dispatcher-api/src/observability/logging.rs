//! Structured logging and request correlation
//!
//! - `tracing-subscriber` setup with JSON, pretty or compact output
//! - `X-Request-ID` propagation and per-request log lines
//! - Header redaction for anything carrying credentials
//!
//! # Examples
//!
//! ```rust,no_run
//! use dispatcher_api::observability::logging::{init_logging, LogConfig};
//!
//! init_logging(LogConfig::default()).expect("Failed to initialize logging");
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tracing::{info, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};
use uuid::Uuid;

/// HTTP header for request correlation ID
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Headers whose values never reach the logs
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "proxy-authorization",
];

const REDACTED: &str = "[REDACTED]";

/// Log format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format for production (machine-readable)
    Json,
    /// Pretty format for development (human-readable)
    Pretty,
    /// Compact format for minimal output
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Main logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log format
    #[serde(default)]
    pub format: LogFormat,
    /// Default log level, used when `RUST_LOG` is unset
    pub level: String,
    /// Full filter directive (e.g. "dispatcher_api=debug,sqlx=warn"); wins over `level`
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            filter: None,
        }
    }
}

/// Whole milliseconds in `duration` for log fields, saturating at `u64::MAX`
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Copy of `headers` with credential-bearing values replaced
pub fn redact_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let name = name.as_str().to_lowercase();
            let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name, value)
        })
        .collect()
}

/// Extract or generate request ID from headers
fn extract_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware for request/response logging with correlation IDs.
///
/// Every log line emitted while handling the request carries `request_id`,
/// including the executor's retry warnings.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = extract_request_id(request.headers());

    let method = request.method().to_string();
    let uri = request.uri().to_string();
    tracing::debug!(headers = ?redact_headers(request.headers()), "Request headers");

    let span = tracing::info_span!("request", request_id = %request_id);

    let response = async move {
        info!(request.method = %method, request.uri = %uri, "Incoming request");

        let response = next.run(request).await;
        let status = response.status();
        let duration_ms = duration_millis(start.elapsed());

        if status.is_server_error() {
            tracing::error!(
                response.status = status.as_u16(),
                response.duration_ms = duration_ms,
                "Request completed with server error"
            );
        } else if status.is_client_error() {
            tracing::warn!(
                response.status = status.as_u16(),
                response.duration_ms = duration_ms,
                "Request completed with client error"
            );
        } else {
            info!(
                response.status = status.as_u16(),
                response.duration_ms = duration_ms,
                "Request completed successfully"
            );
        }

        response
    }
    .instrument(span)
    .await;

    let (mut parts, body) = response.into_parts();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, value);
    }

    Response::from_parts(parts, body)
}

/// Initialize the logging system with the given configuration
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Build the environment filter
    let env_filter = if let Some(ref filter) = config.filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
    };

    match config.format {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_thread_ids(true)
                .with_filter(env_filter);

            tracing_subscriber::registry().with(json_layer).try_init()?;
        }
        LogFormat::Pretty => {
            let pretty_layer = fmt::layer()
                .pretty()
                .with_thread_ids(true)
                .with_filter(env_filter);

            tracing_subscriber::registry().with(pretty_layer).try_init()?;
        }
        LogFormat::Compact => {
            let compact_layer = fmt::layer().compact().with_filter(env_filter);

            tracing_subscriber::registry().with(compact_layer).try_init()?;
        }
    }

    info!("Logging system initialized with format: {:?}", config.format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(request_logging_middleware))
    }

    #[test]
    fn test_log_format_deserializes_lowercase() {
        let format: LogFormat = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(format, LogFormat::Compact);
    }

    #[test]
    fn test_duration_millis_saturates() {
        assert_eq!(duration_millis(Duration::from_micros(1_500_900)), 1500);
        assert_eq!(duration_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_redact_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("sk-secret"));
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted["x-api-key"], REDACTED);
        assert_eq!(redacted["authorization"], REDACTED);
        assert_eq!(redacted["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_middleware_generates_request_id() {
        let response = app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_middleware_echoes_incoming_request_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
    }
}
