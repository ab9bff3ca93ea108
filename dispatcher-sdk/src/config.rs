//! SDK configuration
//!
//! This module provides configuration options for the HTTP clients.

use crate::error::{SdkError, SdkResult};
use std::fmt;
use std::time::Duration;

/// Configuration for an HTTP client
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Base URL for the API
    pub base_url: String,

    /// Authentication method
    pub auth: AuthConfig,

    /// Request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Enable request/response logging
    pub enable_logging: bool,

    /// Custom headers to add to all requests
    pub custom_headers: Vec<(String, String)>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth: AuthConfig::None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("dispatcher-sdk/{}", env!("CARGO_PKG_VERSION")),
            enable_logging: false,
            custom_headers: Vec::new(),
        }
    }
}

impl SdkConfig {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the authentication method
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Enable request/response logging
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Add a custom header to all requests
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> SdkResult<()> {
        if self.base_url.is_empty() {
            return Err(SdkError::ConfigurationError(
                "Base URL cannot be empty".to_string(),
            ));
        }

        // Validate URL format
        url::Url::parse(&self.base_url)?;

        if self.timeout.is_zero() {
            return Err(SdkError::ConfigurationError(
                "Timeout cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Authentication configuration
#[derive(Clone)]
pub enum AuthConfig {
    /// No authentication
    None,

    /// API key sent in the `x-api-key` header
    ApiKey(String),

    /// Bearer token sent in the `Authorization` header
    BearerToken(String),
}

impl AuthConfig {
    /// Check if authentication is configured
    pub fn is_configured(&self) -> bool {
        !matches!(self, AuthConfig::None)
    }
}

// Secrets must never reach the logs through `{:?}`.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::None => write!(f, "None"),
            AuthConfig::ApiKey(_) => write!(f, "ApiKey([REDACTED])"),
            AuthConfig::BearerToken(_) => write!(f, "BearerToken([REDACTED])"),
        }
    }
}
