//! SDK resource modules
//!
//! This module contains resource-specific clients for the two upstream
//! services the dispatcher depends on.

pub mod completion;
pub mod logistics;

pub use completion::{AnthropicClient, CompletionService};
pub use logistics::{LogisticsClient, LogisticsDataSource};
