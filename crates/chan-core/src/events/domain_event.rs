//! Channel events - emitted after a structural mutation commits
//!
//! Consumed by the notification collaborator through a
//! [`ChannelEventSink`](crate::traits::ChannelEventSink).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Channel, ChannelType};
use crate::value_objects::Snowflake;

/// All channel events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelEvent {
    ChannelCreated(ChannelCreatedEvent),
    ChannelRenamed(ChannelRenamedEvent),
    ChannelReparented(ChannelReparentedEvent),
    ChannelUpdated(ChannelUpdatedEvent),
    ChannelArchived(ChannelArchivedEvent),
}

impl ChannelEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ChannelCreated(_) => "CHANNEL_CREATED",
            Self::ChannelRenamed(_) => "CHANNEL_RENAMED",
            Self::ChannelReparented(_) => "CHANNEL_REPARENTED",
            Self::ChannelUpdated(_) => "CHANNEL_UPDATED",
            Self::ChannelArchived(_) => "CHANNEL_ARCHIVED",
        }
    }

    /// The channel the event is about (the subtree root for archival)
    pub fn channel_id(&self) -> Snowflake {
        match self {
            Self::ChannelCreated(e) => e.channel_id,
            Self::ChannelRenamed(e) => e.channel_id,
            Self::ChannelReparented(e) => e.channel_id,
            Self::ChannelUpdated(e) => e.channel_id,
            Self::ChannelArchived(e) => e.channel_id,
        }
    }

    /// Channel type of the subject, used to pick broadcast targets
    pub fn channel_type(&self) -> ChannelType {
        match self {
            Self::ChannelCreated(e) => e.channel_type,
            Self::ChannelRenamed(_) | Self::ChannelReparented(_) => ChannelType::Public,
            Self::ChannelUpdated(e) => e.channel_type,
            Self::ChannelArchived(e) => e.channel_type,
        }
    }

    /// Get the event timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ChannelCreated(e) => e.timestamp,
            Self::ChannelRenamed(e) => e.timestamp,
            Self::ChannelReparented(e) => e.timestamp,
            Self::ChannelUpdated(e) => e.timestamp,
            Self::ChannelArchived(e) => e.timestamp,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelCreatedEvent {
    pub channel_id: Snowflake,
    pub parent_id: Option<Snowflake>,
    pub channel_type: ChannelType,
    pub creator_id: Snowflake,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRenamedEvent {
    pub channel_id: Snowflake,
    pub old_name: String,
    pub new_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReparentedEvent {
    pub channel_id: Snowflake,
    pub old_parent_id: Option<Snowflake>,
    pub new_parent_id: Option<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

/// Topic or attribute change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelUpdatedEvent {
    pub channel_id: Snowflake,
    pub channel_type: ChannelType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelArchivedEvent {
    pub channel_id: Snowflake,
    pub channel_type: ChannelType,
    /// Every channel archived by the cascade, root included
    pub archived_ids: Vec<Snowflake>,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Event Creation Helpers
// ============================================================================

impl ChannelCreatedEvent {
    pub fn new(channel: &Channel) -> Self {
        Self {
            channel_id: channel.id,
            parent_id: channel.parent_id,
            channel_type: channel.channel_type,
            creator_id: channel.creator_id,
            timestamp: Utc::now(),
        }
    }
}

impl ChannelRenamedEvent {
    pub fn new(channel_id: Snowflake, old_name: String, new_name: String) -> Self {
        Self {
            channel_id,
            old_name,
            new_name,
            timestamp: Utc::now(),
        }
    }
}

impl ChannelReparentedEvent {
    pub fn new(
        channel_id: Snowflake,
        old_parent_id: Option<Snowflake>,
        new_parent_id: Option<Snowflake>,
    ) -> Self {
        Self {
            channel_id,
            old_parent_id,
            new_parent_id,
            timestamp: Utc::now(),
        }
    }
}

impl ChannelUpdatedEvent {
    pub fn new(channel: &Channel) -> Self {
        Self {
            channel_id: channel.id,
            channel_type: channel.channel_type,
            timestamp: Utc::now(),
        }
    }
}

impl ChannelArchivedEvent {
    pub fn new(channel: &Channel, archived_ids: Vec<Snowflake>, at: DateTime<Utc>) -> Self {
        Self {
            channel_id: channel.id,
            channel_type: channel.channel_type,
            archived_ids,
            timestamp: at,
        }
    }
}
