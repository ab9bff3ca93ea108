//! Dispatcher SDK
//!
//! HTTP clients for the services the dispatcher bot depends on:
//!
//! - **Logistics data source**: partners, transport history and cities
//!   ([`LogisticsClient`], behind the [`LogisticsDataSource`] trait)
//! - **Completion service**: the Anthropic Messages API
//!   ([`AnthropicClient`], behind the [`CompletionService`] trait)
//!
//! Clients make exactly one attempt per call. Every [`SdkError`] implements
//! [`Classify`](dispatcher_core::Classify), so callers can wrap calls in a
//! retrying executor that only retries transient failures.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dispatcher_sdk::{
//!     AnthropicClient, CompletionRequest, CompletionService, CompletionSettings, HttpClient,
//!     DEFAULT_API_VERSION,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnthropicClient::sdk_config(
//!     "https://api.anthropic.com",
//!     std::env::var("DISPATCHER_COMPLETION__API_KEY")?,
//!     DEFAULT_API_VERSION,
//! );
//! let client = AnthropicClient::new(Arc::new(HttpClient::new(config)?), CompletionSettings::default());
//!
//! let answer = client.complete(&CompletionRequest::prompt("Hello")).await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod resources;

// Re-export main types for convenience
pub use client::HttpClient;
pub use config::{AuthConfig, SdkConfig};
pub use error::{SdkError, SdkResult};

// Re-export resource clients
pub use resources::completion::{
    AnthropicClient, CompletionRequest, CompletionResponse, CompletionService,
    CompletionSettings, DEFAULT_API_VERSION,
};
pub use resources::logistics::{LogisticsClient, LogisticsDataSource};
