//! Redis-backed [`ChannelEventSink`]

use async_trait::async_trait;
use chan_core::entities::ChannelType;
use chan_core::events::ChannelEvent;
use chan_core::traits::{ChannelEventSink, RepoResult};
use chan_core::DomainError;

use crate::pool::RedisPoolError;
use crate::pubsub::{EventTarget, PubSubChannel, PubSubEvent, Publisher};

/// Publishes committed channel events to Redis
///
/// Every event goes to `channel:{id}`. Archival also reaches each archived
/// descendant, and events about public channels go to `broadcast`.
#[derive(Clone)]
pub struct RedisEventSink {
    publisher: Publisher,
}

impl RedisEventSink {
    #[must_use]
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }
}

/// Redis channels an event is delivered to
fn routes(event: &ChannelEvent) -> Vec<PubSubChannel> {
    let root = event.channel_id();
    let mut channels = vec![PubSubChannel::channel(root)];

    if let ChannelEvent::ChannelArchived(archived) = event {
        channels.extend(
            archived
                .archived_ids
                .iter()
                .filter(|id| **id != root)
                .map(|id| PubSubChannel::channel(*id)),
        );
    }

    if event.channel_type() == ChannelType::Public {
        channels.push(PubSubChannel::broadcast());
    }
    channels
}

fn envelope(event: &ChannelEvent) -> Result<PubSubEvent, serde_json::Error> {
    let root = event.channel_id();
    let mut target = EventTarget::default().with_channel(root.to_string());
    if let ChannelEvent::ChannelArchived(archived) = event {
        for id in archived.archived_ids.iter().filter(|id| **id != root) {
            target = target.affecting(id.to_string());
        }
    }

    Ok(PubSubEvent::new(event.event_type(), serde_json::to_value(event)?).with_target(target))
}

fn to_domain(err: RedisPoolError) -> DomainError {
    DomainError::InternalError(format!("event delivery failed: {err}"))
}

#[async_trait]
impl ChannelEventSink for RedisEventSink {
    async fn publish(&self, event: &ChannelEvent) -> RepoResult<()> {
        let message = envelope(event).map_err(|e| to_domain(e.into()))?;
        self.publisher
            .publish(&routes(event), &message)
            .await
            .map_err(to_domain)?;
        Ok(())
    }
}
