//! Graceful shutdown signalling.
//!
//! [`ShutdownSignal`] turns SIGINT / SIGTERM into a cancelled
//! [`CancellationToken`]. The same token is handed to the retry executor, so
//! requests waiting out a backoff give up instead of holding the server open.
//!
//! # Example
//!
//! ```no_run
//! use dispatcher_api::resilience::shutdown::ShutdownSignal;
//!
//! # async fn example() {
//! let signal = ShutdownSignal::new();
//! let token = signal.token();
//!
//! tokio::spawn(async move { signal.wait().await });
//! token.cancelled().await;
//! # }
//! ```

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Shutdown signal handler
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Create a new shutdown signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled once shutdown starts
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for SIGINT or SIGTERM, or for a manual [`trigger`](Self::trigger),
    /// then cancel the token
    pub async fn wait(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C)");
            }
            _ = terminate => {
                info!("Received SIGTERM");
            }
            _ = self.token.cancelled() => {
                info!("Shutdown triggered");
            }
        }

        self.token.cancel();
    }

    /// Check if shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Manually trigger shutdown
    pub fn trigger(&self) {
        info!("Manually triggering shutdown");
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_shutdown_signal_new() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());
        assert!(!signal.token().is_cancelled());
    }

    #[test]
    fn test_manual_trigger_cancels_token() {
        let signal = ShutdownSignal::new();
        let token = signal.token();

        signal.trigger();

        assert!(signal.is_triggered());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_returns_after_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.wait().await });

        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("wait did not return")
            .unwrap();
    }
}
