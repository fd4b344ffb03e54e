//! Redis connection pool backing the event publisher

use deadpool_redis::{Config, Pool, Runtime};
use tracing::info;

/// Pool settings derived from `REDIS_URL` / `REDIS_MAX_CONNECTIONS`
#[derive(Debug, Clone)]
pub struct RedisPoolConfig {
    pub url: String,
    pub max_connections: usize,
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 16,
        }
    }
}

impl From<&chan_common::RedisConfig> for RedisPoolConfig {
    fn from(config: &chan_common::RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections as usize,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("Failed to get connection from pool: {0}")]
    GetConnection(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RedisResult<T> = Result<T, RedisPoolError>;

impl From<RedisPoolError> for chan_common::AppError {
    fn from(err: RedisPoolError) -> Self {
        Self::Cache(err.to_string())
    }
}

/// Pooled Redis connections; cheap to clone
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
    endpoint: String,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("endpoint", &self.endpoint)
            .field("status", &self.pool.status())
            .finish()
    }
}

impl RedisPool {
    /// Build the pool; no connection is opened until first use
    pub fn new(config: RedisPoolConfig) -> RedisResult<Self> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        let endpoint = endpoint(&config.url).to_string();
        info!(%endpoint, max_connections = config.max_connections, "Redis pool created");

        Ok(Self { pool, endpoint })
    }

    pub fn from_config(config: &chan_common::RedisConfig) -> RedisResult<Self> {
        Self::new(RedisPoolConfig::from(config))
    }

    /// Host part of the URL, safe to log
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn get(&self) -> RedisResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(RedisPoolError::GetConnection)
    }

    #[must_use]
    pub fn status(&self) -> deadpool_redis::Status {
        self.pool.status()
    }

    /// Round-trip a PING
    pub async fn health_check(&self) -> RedisResult<()> {
        let mut conn = self.get().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

/// Strip credentials: everything up to the last `@`, then the scheme
fn endpoint(url: &str) -> &str {
    let rest = url.rsplit('@').next().unwrap_or(url);
    rest.split_once("://").map_or(rest, |(_, host)| host)
}
