//! Redis channel names used to fan out hierarchy events

use chan_core::Snowflake;

/// Prefix of per-channel topics
pub const CHANNEL_PREFIX: &str = "channel:";
/// Topic for public structure changes
pub const BROADCAST_CHANNEL: &str = "broadcast";

/// A Redis pub/sub topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PubSubChannel {
    /// Events about one chat channel
    Channel(Snowflake),
    /// Every connected client
    Broadcast,
}

impl PubSubChannel {
    #[must_use]
    pub fn channel(channel_id: Snowflake) -> Self {
        Self::Channel(channel_id)
    }

    #[must_use]
    pub fn broadcast() -> Self {
        Self::Broadcast
    }

    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Channel(id) => format!("{CHANNEL_PREFIX}{id}"),
            Self::Broadcast => BROADCAST_CHANNEL.to_string(),
        }
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}
