use anyhow::{bail, Result};
use config::{builder::DefaultState, Config as ConfigLoader, ConfigBuilder, Environment, File};
use dispatcher_api::observability::LogConfig;
use dispatcher_api::resilience::{PolicyError, RetryConfig, RetryPolicy};
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub data_source: DataSourceConfig,
    pub completion: CompletionConfig,
    pub retry: RetrySettings,
    pub conversation: ConversationConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Deserialize)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub anthropic_version: String,
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("anthropic_version", &self.anthropic_version)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    pub max_received_messages: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Conversations are kept in memory when unset
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Config {
    /// Defaults, then `config/default` and `config/local`, then
    /// `DISPATCHER_*` environment variables (`__` separates sections)
    pub fn load() -> Result<Self> {
        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("DISPATCHER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(ConfigLoader::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.shutdown_grace_secs", 30)?
            .set_default("log.level", "info")?
            .set_default("data_source.timeout_secs", 30)?
            .set_default("completion.base_url", "https://api.anthropic.com")?
            .set_default("completion.api_key", "")?
            .set_default("completion.model", "claude-3-5-sonnet-20241022")?
            .set_default("completion.max_tokens", 1024)?
            .set_default("completion.temperature", 0.0)?
            .set_default("completion.timeout_secs", 60)?
            .set_default("completion.anthropic_version", "2023-06-01")?
            .set_default("retry.max_attempts", 5)?
            .set_default("retry.base_delay_ms", 1000)?
            .set_default("retry.max_delay_ms", 30_000)?
            .set_default("retry.backoff_multiplier", 2.0)?
            .set_default("retry.jitter", true)?
            .set_default("conversation.max_received_messages", 5)?
            .set_default("database.max_connections", 10)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.completion.api_key.trim().is_empty() {
            bail!("completion.api_key is required (DISPATCHER_COMPLETION__API_KEY)");
        }
        if self.data_source.base_url.trim().is_empty() {
            bail!("data_source.base_url is required (DISPATCHER_DATA_SOURCE__BASE_URL)");
        }
        if self.conversation.max_received_messages < 1 {
            bail!("conversation.max_received_messages must be at least 1");
        }
        self.retry_policy()?;
        Ok(())
    }

    pub fn retry_policy(&self) -> std::result::Result<RetryPolicy, PolicyError> {
        RetryPolicy::new(RetryConfig {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            backoff_multiplier: self.retry.backoff_multiplier,
            jitter: self.retry.jitter,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }
}
