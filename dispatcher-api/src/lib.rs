//! HTTP surface of the dispatcher bot.
//!
//! Routes dispatch requests and partner messages to the completion service
//! through a [`ResilientExecutor`], and keeps negotiations in a
//! [`ConversationStore`].

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod observability;
pub mod prompt;
pub mod resilience;

pub use dto::*;
pub use error::{ApiError, ApiResult};
pub use resilience::{ResilientExecutor, RetryConfig, RetryError, RetryPolicy};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use dispatcher_core::ConversationStore;
use dispatcher_sdk::{CompletionService, LogisticsDataSource};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Received-message cap per conversation unless configured otherwise
pub const DEFAULT_MAX_RECEIVED_MESSAGES: i32 = 5;

#[derive(Clone)]
pub struct AppState {
    pub data_source: Arc<dyn LogisticsDataSource>,
    pub completion: Arc<dyn CompletionService>,
    pub conversations: Arc<dyn ConversationStore>,
    pub executor: ResilientExecutor,
    pub max_received_messages: i32,
    /// Cancelled on shutdown; aborts in-flight retries
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        data_source: Arc<dyn LogisticsDataSource>,
        completion: Arc<dyn CompletionService>,
        conversations: Arc<dyn ConversationStore>,
        executor: ResilientExecutor,
    ) -> Self {
        Self {
            data_source,
            completion,
            conversations,
            executor,
            max_received_messages: DEFAULT_MAX_RECEIVED_MESSAGES,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_max_received_messages(mut self, limit: i32) -> Self {
        self.max_received_messages = limit;
        self
    }

    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/dispatcher", post(handlers::dispatcher::dispatch))
        .route("/dispatcher/cities", get(handlers::dispatcher::cities))
        .route("/dispatcher/conversations", get(handlers::conversations::list))
        .route(
            "/dispatcher/conversations/:id",
            get(handlers::conversations::get).delete(handlers::conversations::delete),
        )
        .route(
            "/dispatcher/conversations/:id/messages",
            post(handlers::conversations::send_message),
        )
        .route(
            "/dispatcher/conversations/:id/knowledge",
            post(handlers::conversations::add_knowledge),
        )
        .with_state(state)
}

/// Wraps `router` in request logging and HTTP tracing layers
pub fn with_observability(router: Router) -> Router {
    router
        .layer(middleware::from_fn(
            observability::logging::request_logging_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
