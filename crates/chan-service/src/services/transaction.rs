//! Transaction scope and conflict retry for mutating operations

use std::future::Future;

use chan_core::events::ChannelEvent;
use chan_core::traits::{ChannelTransaction, RepoResult};
use tracing::{debug, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Retry policy for mutations that hit a serialization conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// What a committed attempt produced
pub(crate) struct Committed<T> {
    pub value: T,
    pub event: Option<ChannelEvent>,
}

impl<T> Committed<T> {
    pub fn with_event(value: T, event: ChannelEvent) -> Self {
        Self {
            value,
            event: Some(event),
        }
    }

    pub fn silent(value: T) -> Self {
        Self { value, event: None }
    }
}

/// Commit on success, roll back on failure
pub(crate) async fn settle<T>(
    tx: Box<dyn ChannelTransaction>,
    result: RepoResult<T>,
) -> RepoResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            tx.rollback().await.ok(); // Best effort rollback
            Err(e)
        }
    }
}

/// Run `attempt` until it commits, retrying transient conflicts
///
/// Each attempt opens its own transaction, so every check is re-run against
/// fresh data. The event of the committed attempt is published afterwards;
/// sink failures are logged and swallowed.
pub(crate) async fn run_with_retry<T, F, Fut>(
    ctx: &ServiceContext,
    operation: &'static str,
    attempt: F,
) -> ServiceResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = RepoResult<Committed<T>>>,
{
    let max_attempts = ctx.tx_config().max_retries + 1;
    let mut attempts = 0;

    loop {
        attempts += 1;
        debug!(operation, attempt = attempts, max_attempts, "Starting transaction");

        match attempt().await {
            Ok(committed) => {
                if let Some(event) = &committed.event {
                    publish(ctx, event).await;
                }
                return Ok(committed.value);
            }
            Err(e) if e.is_retryable() && attempts < max_attempts => {
                warn!(operation, attempt = attempts, error = %e, "Transaction conflict, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn publish(ctx: &ServiceContext, event: &ChannelEvent) {
    if let Err(e) = ctx.event_sink().publish(event).await {
        warn!(
            event_type = event.event_type(),
            channel_id = %event.channel_id(),
            error = %e,
            "Failed to publish channel event"
        );
    }
}
