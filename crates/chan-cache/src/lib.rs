//! # chan-cache
//!
//! Redis delivery of committed channel events.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: Channel events fanned out to `channel:{id}` and `broadcast`
//!
//! ## Example
//!
//! ```ignore
//! use chan_cache::{Publisher, RedisEventSink, RedisPool, RedisPoolConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let sink = RedisEventSink::new(Publisher::new(pool));
//!
//! // Hand the sink to the service context
//! let context = ServiceContext::builder().event_sink(Arc::new(sink))...;
//! ```

pub mod pool;
pub mod pubsub;

pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

pub use pubsub::{
    EventTarget, PubSubChannel, PubSubEvent, Publisher, RedisEventSink, BROADCAST_CHANNEL,
    CHANNEL_PREFIX,
};
