//! Test fixtures and data generators

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chan_core::{Channel, Snowflake};
use chan_service::ChannelFacade;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Counter for synthetic user ids
static USER_COUNTER: AtomicI64 = AtomicI64::new(1_000);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A valid channel name that no other fixture uses
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}{}", unique_suffix())
}

/// A fresh non-nil user id
pub fn user() -> Snowflake {
    Snowflake::new(USER_COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// The tree `c1 -> c2 -> {c3, c4}`, `c3 -> c5`
#[derive(Debug, Clone)]
pub struct Tree {
    pub c1: Channel,
    pub c2: Channel,
    pub c3: Channel,
    pub c4: Channel,
    pub c5: Channel,
}

impl Tree {
    pub async fn create(facade: &ChannelFacade, creator: Snowflake) -> anyhow::Result<Self> {
        let c1 = facade.create_public_channel("c1", None, creator).await?;
        let c2 = facade.create_child_channel("c2", c1.id, creator).await?;
        let c3 = facade.create_child_channel("c3", c2.id, creator).await?;
        let c4 = facade.create_child_channel("c4", c2.id, creator).await?;
        let c5 = facade.create_child_channel("c5", c3.id, creator).await?;
        Ok(Self { c1, c2, c3, c4, c5 })
    }

    pub fn ids(&self) -> [Snowflake; 5] {
        [self.c1.id, self.c2.id, self.c3.id, self.c4.id, self.c5.id]
    }
}

/// Build a chain of `len` public channels, top-level first
pub async fn chain(
    facade: &ChannelFacade,
    creator: Snowflake,
    len: usize,
) -> anyhow::Result<Vec<Channel>> {
    let mut channels: Vec<Channel> = Vec::with_capacity(len);
    for level in 0..len {
        let parent = channels.last().map(|c| c.id);
        let name = format!("level{}", level + 1);
        channels.push(facade.create_public_channel(&name, parent, creator).await?);
    }
    Ok(channels)
}
