//! Service context - dependency container for services
//!
//! Holds the channel store, overlay repositories, event sink and id generator.

use std::sync::Arc;

use chan_cache::{Publisher, RedisEventSink, RedisPool};
use chan_common::{AppConfig, AppError};
use chan_core::traits::{
    ChannelEventSink, ChannelStore, MembershipRepository, MessageLocator, NoopEventSink,
};
use chan_core::{Snowflake, SnowflakeGenerator};
use chan_db::{
    create_pool, DatabaseConfig, MemoryChannelStore, PgChannelStore, PgMembershipRepository,
    PgMessageLocator, PgPool,
};
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use super::transaction::TransactionConfig;

/// Service context containing all dependencies
///
/// Cheap to clone; every dependency sits behind an `Arc`.
#[derive(Clone)]
pub struct ServiceContext {
    channel_store: Arc<dyn ChannelStore>,
    membership_repo: Arc<dyn MembershipRepository>,
    message_locator: Arc<dyn MessageLocator>,
    event_sink: Arc<dyn ChannelEventSink>,
    snowflake_generator: Arc<SnowflakeGenerator>,
    tx_config: TransactionConfig,
}

impl ServiceContext {
    pub fn new(
        channel_store: Arc<dyn ChannelStore>,
        membership_repo: Arc<dyn MembershipRepository>,
        message_locator: Arc<dyn MessageLocator>,
        event_sink: Arc<dyn ChannelEventSink>,
        snowflake_generator: Arc<SnowflakeGenerator>,
        tx_config: TransactionConfig,
    ) -> Self {
        Self {
            channel_store,
            membership_repo,
            message_locator,
            event_sink,
            snowflake_generator,
            tx_config,
        }
    }

    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Wire Postgres stores, and a Redis event sink when Redis is configured
    pub async fn from_config(config: &AppConfig) -> ServiceResult<Self> {
        let pool = create_pool(&DatabaseConfig::from(&config.database))
            .await
            .map_err(|e| ServiceError::internal(format!("database pool: {e}")))?;

        let mut builder = Self::builder()
            .postgres(pool)
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id)))
            .tx_config(TransactionConfig {
                max_retries: config.hierarchy.tx_max_retries,
            });

        if let Some(redis) = &config.redis {
            let redis_pool = RedisPool::from_config(redis).map_err(AppError::from)?;
            // Startup goes on without Redis; failed publishes are logged per event
            if let Err(e) = redis_pool.health_check().await {
                warn!(
                    endpoint = redis_pool.endpoint(),
                    error = %e,
                    "Redis not reachable at startup"
                );
            }
            builder = builder.event_sink(Arc::new(RedisEventSink::new(Publisher::new(redis_pool))));
        } else {
            info!("REDIS_URL not set; channel events are discarded");
        }

        builder.build()
    }

    /// Get the channel store
    pub fn channel_store(&self) -> &dyn ChannelStore {
        self.channel_store.as_ref()
    }

    /// Get the membership and subscription repository
    pub fn membership_repo(&self) -> &dyn MembershipRepository {
        self.membership_repo.as_ref()
    }

    pub fn message_locator(&self) -> &dyn MessageLocator {
        self.message_locator.as_ref()
    }

    pub fn event_sink(&self) -> &dyn ChannelEventSink {
        self.event_sink.as_ref()
    }

    pub fn tx_config(&self) -> &TransactionConfig {
        &self.tx_config
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("stores", &"...")
            .field("worker_id", &self.snowflake_generator.worker_id())
            .field("tx_config", &self.tx_config)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    channel_store: Option<Arc<dyn ChannelStore>>,
    membership_repo: Option<Arc<dyn MembershipRepository>>,
    message_locator: Option<Arc<dyn MessageLocator>>,
    event_sink: Option<Arc<dyn ChannelEventSink>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
    tx_config: TransactionConfig,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one in-memory store for channels, overlays and message lookup
    pub fn memory_store(self, store: MemoryChannelStore) -> Self {
        let store = Arc::new(store);
        self.channel_store(store.clone())
            .membership_repo(store.clone())
            .message_locator(store)
    }

    /// Use the Postgres stores over one pool
    pub fn postgres(self, pool: PgPool) -> Self {
        self.channel_store(Arc::new(PgChannelStore::new(pool.clone())))
            .membership_repo(Arc::new(PgMembershipRepository::new(pool.clone())))
            .message_locator(Arc::new(PgMessageLocator::new(pool)))
    }

    pub fn channel_store(mut self, store: Arc<dyn ChannelStore>) -> Self {
        self.channel_store = Some(store);
        self
    }

    pub fn membership_repo(mut self, repo: Arc<dyn MembershipRepository>) -> Self {
        self.membership_repo = Some(repo);
        self
    }

    pub fn message_locator(mut self, locator: Arc<dyn MessageLocator>) -> Self {
        self.message_locator = Some(locator);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn ChannelEventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    pub fn tx_config(mut self, config: TransactionConfig) -> Self {
        self.tx_config = config;
        self
    }

    /// Build the ServiceContext
    ///
    /// The event sink defaults to [`NoopEventSink`] and the id generator to
    /// worker 0.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a store is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.channel_store
                .ok_or_else(|| ServiceError::validation("channel_store is required"))?,
            self.membership_repo
                .ok_or_else(|| ServiceError::validation("membership_repo is required"))?,
            self.message_locator
                .ok_or_else(|| ServiceError::validation("message_locator is required"))?,
            self.event_sink.unwrap_or_else(|| Arc::new(NoopEventSink)),
            self.snowflake_generator
                .unwrap_or_else(|| Arc::new(SnowflakeGenerator::default())),
            self.tx_config,
        ))
    }
}
