//! Resilience patterns for the dispatcher API.
//!
//! - **Retry**: runs calls to the completion service under exponential
//!   backoff with jitter, retrying only transient failures
//! - **Graceful Shutdown**: turns termination signals into a cancellation
//!   token that aborts pending backoff waits

pub mod retry;
pub mod shutdown;

// Re-export commonly used types
pub use retry::{PolicyError, ResilientExecutor, RetryConfig, RetryError, RetryPolicy};
pub use shutdown::ShutdownSignal;
