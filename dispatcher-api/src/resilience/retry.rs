//! Retrying executor with exponential backoff and jitter.
//!
//! Wraps a single remote call and retries it while it fails with a
//! [`FailureKind::Transient`] error. Permanent and unexpected failures are
//! returned on the spot, carrying the original error.
//!
//! # Example
//!
//! ```no_run
//! use dispatcher_api::resilience::retry::{ResilientExecutor, RetryConfig, RetryPolicy};
//! use dispatcher_sdk::{CompletionRequest, CompletionService};
//!
//! # async fn example(service: &dyn CompletionService) -> Result<(), Box<dyn std::error::Error>> {
//! let executor = ResilientExecutor::new(RetryPolicy::new(RetryConfig::default())?);
//! let request = CompletionRequest::prompt("Which partner should carry this load?");
//!
//! let response = executor.execute(|| service.complete(&request)).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

use crate::observability::duration_millis;
use dispatcher_core::{Classify, FailureKind};
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Raw retry settings, validated into a [`RetryPolicy`]
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of invocations allowed, the first one included
    pub max_attempts: u32,
    /// Delay unit the backoff grows from
    pub base_delay: Duration,
    /// Upper bound for the backoff before jitter
    pub max_delay: Duration,
    /// Growth factor per attempt
    pub backoff_multiplier: f64,
    /// Whether to scale each delay by a random factor in `[0.5, 1.5]`
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Rejected retry settings
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("base_delay must be positive")]
    ZeroBaseDelay,

    #[error("max_delay ({max_delay:?}) must not be below base_delay ({base_delay:?})")]
    MaxBelowBase {
        base_delay: Duration,
        max_delay: Duration,
    },

    #[error("backoff_multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),
}

/// Immutable, validated retry policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Validate the settings and freeze them into a policy
    pub fn new(config: RetryConfig) -> Result<Self, PolicyError> {
        if config.max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        if config.base_delay.is_zero() {
            return Err(PolicyError::ZeroBaseDelay);
        }
        if config.max_delay < config.base_delay {
            return Err(PolicyError::MaxBelowBase {
                base_delay: config.base_delay,
                max_delay: config.max_delay,
            });
        }
        if !config.backoff_multiplier.is_finite() || config.backoff_multiplier < 1.0 {
            return Err(PolicyError::InvalidMultiplier(config.backoff_multiplier));
        }

        Ok(Self { config })
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.config.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.config.max_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.config.backoff_multiplier
    }

    pub fn jitter(&self) -> bool {
        self.config.jitter
    }

    /// `min(base_delay * multiplier^attempt, max_delay)`
    pub fn raw_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay =
            self.config.base_delay.as_secs_f64() * self.config.backoff_multiplier.powi(exponent);
        let max = self.config.max_delay.as_secs_f64();

        if delay.is_finite() && delay < max {
            Duration::from_secs_f64(delay).min(self.config.max_delay)
        } else {
            self.config.max_delay
        }
    }

    /// Raw delay with jitter applied when enabled
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.raw_delay(attempt);
        if self.config.jitter {
            let factor = rand::thread_rng().gen_range(0.5..=1.5);
            raw.mul_f64(factor)
        } else {
            raw
        }
    }
}

/// Terminal failure of an [`ResilientExecutor`] call
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed transiently
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    /// The caller cancelled while the executor was waiting to retry
    #[error("Cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// The remote side rejected the call for good
    #[error("{0}")]
    Permanent(E),

    /// A failure nobody anticipated
    #[error("{0}")]
    Unexpected(E),
}

impl<E> RetryError<E> {
    /// Attempts made before giving up, when known
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts } => {
                Some(*attempts)
            }
            RetryError::Permanent(_) | RetryError::Unexpected(_) => None,
        }
    }

    /// The underlying error, if the call produced one
    pub fn source_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { last_error, .. } => Some(last_error),
            RetryError::Permanent(e) | RetryError::Unexpected(e) => Some(e),
            RetryError::Cancelled { .. } => None,
        }
    }
}

/// Per-call bookkeeping, dropped when the call returns
struct AttemptState<E> {
    attempt_number: u32,
    last_error: Option<E>,
}

/// Runs remote calls under a [`RetryPolicy`].
///
/// Cheap to clone; concurrent calls share only the immutable policy.
#[derive(Debug, Clone)]
pub struct ResilientExecutor {
    policy: RetryPolicy,
}

impl ResilientExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying transient failures
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        self.run(operation, None).await
    }

    /// Like [`execute`](Self::execute), but gives up with
    /// [`RetryError::Cancelled`] once `token` is cancelled
    pub async fn execute_with_cancellation<F, Fut, T, E>(
        &self,
        operation: F,
        token: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        self.run(operation, Some(token)).await
    }

    async fn run<F, Fut, T, E>(
        &self,
        mut operation: F,
        token: Option<&CancellationToken>,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let max_attempts = self.policy.max_attempts();
        let mut state = AttemptState {
            attempt_number: 0,
            last_error: None,
        };

        loop {
            if token.is_some_and(CancellationToken::is_cancelled) {
                warn!(attempts = state.attempt_number, "Call cancelled before attempt");
                return Err(RetryError::Cancelled {
                    attempts: state.attempt_number,
                });
            }

            debug!("Attempt {}/{}", state.attempt_number + 1, max_attempts);

            let err = match operation().await {
                Ok(value) => {
                    if state.attempt_number > 0 {
                        debug!("Call succeeded after {} retries", state.attempt_number);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            match err.failure_kind() {
                FailureKind::Transient => {}
                FailureKind::Permanent => {
                    warn!(error = %err, "Permanent failure, not retrying");
                    return Err(RetryError::Permanent(err));
                }
                FailureKind::Unexpected => {
                    error!(error = %err, "Unexpected failure, not retrying");
                    return Err(RetryError::Unexpected(err));
                }
            }

            state.attempt_number += 1;
            if state.attempt_number >= max_attempts {
                error!(
                    attempts = state.attempt_number,
                    error = %err,
                    "Retries exhausted"
                );
                return Err(RetryError::Exhausted {
                    attempts: state.attempt_number,
                    last_error: err,
                });
            }

            let delay = self.policy.delay_for(state.attempt_number);
            warn!(
                attempt = state.attempt_number,
                max_attempts,
                delay_ms = duration_millis(delay),
                error = %err,
                "Transient failure, retrying after backoff"
            );
            state.last_error = Some(err);

            match token {
                Some(token) => {
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = token.cancelled() => {
                            warn!(
                                attempts = state.attempt_number,
                                last_error = ?state.last_error.as_ref().map(ToString::to_string),
                                "Call cancelled during backoff"
                            );
                            return Err(RetryError::Cancelled {
                                attempts: state.attempt_number,
                            });
                        }
                    }
                }
                None => sleep(delay).await,
            }
        }
    }
}
