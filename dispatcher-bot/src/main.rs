use anyhow::{anyhow, Result};
use axum::{routing::get, Router};
use dispatcher_api::{
    observability::init_logging, resilience::ShutdownSignal, AppState, ResilientExecutor,
};
use dispatcher_core::ConversationStore;
use dispatcher_sdk::{
    AnthropicClient, CompletionSettings, HttpClient, LogisticsClient, SdkConfig,
};
use dispatcher_storage::{
    postgres::{create_pool_with_config, run_migrations, PostgresConfig},
    InMemoryConversationStore, PgConversationRepository,
};
use std::sync::Arc;
use std::time::Duration;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    init_logging(config.log.clone()).map_err(|e| anyhow!("failed to initialize logging: {}", e))?;
    tracing::info!("Starting dispatcher bot");
    tracing::debug!(?config, "Configuration loaded");

    let data_source = LogisticsClient::new(Arc::new(HttpClient::new(
        SdkConfig::new(&config.data_source.base_url)
            .with_timeout(Duration::from_secs(config.data_source.timeout_secs)),
    )?));

    let completion = AnthropicClient::new(
        Arc::new(HttpClient::new(
            AnthropicClient::sdk_config(
                &config.completion.base_url,
                &config.completion.api_key,
                &config.completion.anthropic_version,
            )
            .with_timeout(Duration::from_secs(config.completion.timeout_secs)),
        )?),
        CompletionSettings {
            model: config.completion.model.clone(),
            max_tokens: config.completion.max_tokens,
            temperature: config.completion.temperature,
        },
    );

    let conversations = conversation_store(&config).await?;

    let policy = config.retry_policy()?;
    tracing::info!(
        max_attempts = policy.max_attempts(),
        base_delay = ?policy.base_delay(),
        max_delay = ?policy.max_delay(),
        jitter = policy.jitter(),
        "Retry policy configured"
    );

    let shutdown = ShutdownSignal::new();
    let token = shutdown.token();

    // Build application state
    let api_state = AppState::new(
        Arc::new(data_source),
        Arc::new(completion),
        conversations,
        ResilientExecutor::new(policy),
    )
    .with_max_received_messages(config.conversation.max_received_messages)
    .with_shutdown_token(token.clone());

    let app = dispatcher_api::with_observability(
        Router::new()
            .route("/health", get(health_check))
            .merge(dispatcher_api::routes(api_state)),
    );

    // Start server
    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = token.cancelled() => {}
    }

    let grace = Duration::from_secs(config.server.shutdown_grace_secs);
    tracing::info!("Draining in-flight requests for up to {:?}", grace);
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!("Grace period elapsed with requests still in flight"),
    }

    tracing::info!("Dispatcher bot stopped");
    Ok(())
}

async fn conversation_store(config: &Config) -> Result<Arc<dyn ConversationStore>> {
    match &config.database.url {
        Some(url) => {
            let pool = create_pool_with_config(
                &PostgresConfig::new(url.clone())
                    .with_max_connections(config.database.max_connections),
            )
            .await?;
            run_migrations(&pool).await?;
            tracing::info!("Conversations stored in PostgreSQL");
            Ok(Arc::new(PgConversationRepository::new(pool)))
        }
        None => {
            tracing::warn!("No database configured, conversations are kept in memory");
            Ok(Arc::new(InMemoryConversationStore::new()))
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
