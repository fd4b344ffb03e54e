//! Redis Pub/Sub publisher.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;
use serde::{Deserialize, Serialize};

/// Event wrapper for Pub/Sub messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Event type name (e.g., "CHANNEL_CREATED")
    pub event_type: String,
    /// Event payload
    pub data: serde_json::Value,
    /// Optional routing hints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<EventTarget>,
}

/// Routing hints for subscribers that fan events out further
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTarget {
    /// Channel the event is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Other channels affected by the same event (archived descendants)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub affected_channels: Vec<String>,
}

impl PubSubEvent {
    /// Create a new event
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            target: None,
        }
    }

    /// Add target information
    #[must_use]
    pub fn with_target(mut self, target: EventTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl EventTarget {
    #[must_use]
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    #[must_use]
    pub fn affecting(mut self, channel_id: impl Into<String>) -> Self {
        self.affected_channels.push(channel_id.into());
        self
    }
}

/// Publishes channel events over Redis pub/sub
#[derive(Debug, Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Send `event` to every channel in `routes` in one pipelined round trip;
    /// returns the total number of receivers
    pub async fn publish(&self, routes: &[PubSubChannel], event: &PubSubEvent) -> RedisResult<u32> {
        if routes.is_empty() {
            return Ok(0);
        }
        let payload = event.to_json()?;

        let mut pipe = redis::pipe();
        for route in routes {
            pipe.cmd("PUBLISH").arg(route.name()).arg(&payload);
        }
        let mut conn = self.pool.get().await?;
        let receivers: Vec<u32> = pipe.query_async(&mut conn).await?;
        let total = receivers.iter().sum();

        tracing::debug!(
            routes = routes.len(),
            event_type = %event.event_type,
            receivers = total,
            "Published channel event"
        );

        Ok(total)
    }
}
