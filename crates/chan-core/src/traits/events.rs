//! Event sink port

use async_trait::async_trait;

use crate::events::ChannelEvent;
use crate::traits::RepoResult;

/// Receives channel events after the mutation that produced them committed
#[async_trait]
pub trait ChannelEventSink: Send + Sync {
    async fn publish(&self, event: &ChannelEvent) -> RepoResult<()>;
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl ChannelEventSink for NoopEventSink {
    async fn publish(&self, _event: &ChannelEvent) -> RepoResult<()> {
        Ok(())
    }
}
