//! HTTP client implementation
//!
//! This module provides the core HTTP client shared by the resource clients.
//! Each call is exactly one attempt: retrying is the caller's decision, made
//! from the [`FailureKind`](dispatcher_core::FailureKind) of the returned error.

use crate::config::{AuthConfig, SdkConfig};
use crate::error::{SdkError, SdkResult};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// The HTTP client for making API requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: Arc<SdkConfig>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: SdkConfig) -> SdkResult<Self> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Add custom headers
        for (name, value) in &config.custom_headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::try_from(name.as_str()),
                header::HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(SdkError::NetworkError)?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    /// Build the full URL for an endpoint
    pub fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> SdkResult<T> {
        self.request(Method::GET, path, Option::<()>::None).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: B,
    ) -> SdkResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Make a request with optional body
    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> SdkResult<T> {
        let response = self.send(method, path, body).await?;

        let status = response.status();
        let retry_after = retry_after_secs(&response);
        let text = response
            .text()
            .await
            .map_err(|e| SdkError::from_transport(e, self.config.timeout.as_secs()))?;

        if self.config.enable_logging {
            debug!(status = status.as_u16(), "Response body: {}", text);
        }

        if status.is_success() {
            serde_json::from_str(&text).map_err(SdkError::SerializationError)
        } else {
            let error = SdkError::from_response(status.as_u16(), &text, retry_after);
            warn!(status = status.as_u16(), error = %error, "Request returned an error status");
            Err(error)
        }
    }

    /// Send a single request
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> SdkResult<Response> {
        let url = self.url(path);

        let mut request = self.client.request(method.clone(), &url);

        // Add authentication
        request = self.add_auth(request);

        // Add body
        if let Some(ref body) = body {
            let body_json = serde_json::to_string(body)?;
            if self.config.enable_logging {
                debug!("Request body: {}", body_json);
            }
            request = request.body(body_json);
        }

        if self.config.enable_logging {
            debug!("Request: {} {}", method, url);
        }

        request
            .send()
            .await
            .map_err(|e| SdkError::from_transport(e, self.config.timeout.as_secs()))
    }

    /// Add authentication to a request
    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth {
            AuthConfig::None => request,
            AuthConfig::ApiKey(key) => request.header("x-api-key", key.as_str()),
            AuthConfig::BearerToken(token) => {
                request.header(header::AUTHORIZATION, format!("Bearer {}", token))
            }
        }
    }
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}
