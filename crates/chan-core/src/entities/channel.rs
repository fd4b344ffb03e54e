//! Channel entity - a node of the public tree, a private room, or a DM

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ChannelName, Snowflake};

/// Prefix of synthetic DM channel names
pub const DM_NAME_PREFIX: &str = "dm_";

/// Channel kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Tree-addressable channel visible to everyone
    #[default]
    Public,
    /// Invite-only channel at the root, visible to its members
    Private,
    /// Two-party private channel with fixed members
    Dm,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Dm => "dm",
        }
    }
}

/// Lifecycle state; `Archived` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    #[default]
    Active,
    Archived,
}

impl ChannelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    pub name: String,
    /// `None` means top-level
    pub parent_id: Option<Snowflake>,
    pub creator_id: Snowflake,
    pub updater_id: Snowflake,
    pub topic: String,
    pub channel_type: ChannelType,
    /// UI hint only
    pub is_visible: bool,
    /// Administrative flag forcing every user into the channel
    pub is_forced: bool,
    pub status: ChannelStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    fn base(
        id: Snowflake,
        name: String,
        parent_id: Option<Snowflake>,
        creator_id: Snowflake,
        channel_type: ChannelType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            parent_id,
            creator_id,
            updater_id: creator_id,
            topic: String::new(),
            channel_type,
            is_visible: true,
            is_forced: false,
            status: ChannelStatus::Active,
            archived_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a public channel under `parent_id` (or at the root)
    #[must_use]
    pub fn new_public(
        id: Snowflake,
        name: ChannelName,
        parent_id: Option<Snowflake>,
        creator_id: Snowflake,
    ) -> Self {
        Self::base(id, name.into_inner(), parent_id, creator_id, ChannelType::Public)
    }

    /// Create a root-level private channel
    #[must_use]
    pub fn new_private(id: Snowflake, name: ChannelName, creator_id: Snowflake) -> Self {
        Self::base(id, name.into_inner(), None, creator_id, ChannelType::Private)
    }

    /// Create a DM channel with a synthetic name
    #[must_use]
    pub fn new_dm(id: Snowflake, creator_id: Snowflake) -> Self {
        Self::base(id, generate_dm_name(), None, creator_id, ChannelType::Dm)
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.channel_type == ChannelType::Public
    }

    #[inline]
    pub fn is_dm(&self) -> bool {
        self.channel_type == ChannelType::Dm
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ChannelStatus::Active
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn rename(&mut self, name: ChannelName) {
        self.name = name.into_inner();
        self.updated_at = Utc::now();
    }

    pub fn set_parent(&mut self, parent_id: Option<Snowflake>) {
        self.parent_id = parent_id;
        self.updated_at = Utc::now();
    }

    pub fn set_topic(&mut self, topic: String, updater_id: Snowflake) {
        self.topic = topic;
        self.updater_id = updater_id;
        self.updated_at = Utc::now();
    }

    /// Partial update; `None` leaves the flag untouched
    pub fn set_attributes(&mut self, visible: Option<bool>, forced: Option<bool>) {
        if let Some(visible) = visible {
            self.is_visible = visible;
        }
        if let Some(forced) = forced {
            self.is_forced = forced;
        }
        self.updated_at = Utc::now();
    }

    /// Move to `Archived`. Returns false if already archived.
    pub fn archive(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = ChannelStatus::Archived;
        self.archived_at = Some(at);
        self.updated_at = at;
        true
    }
}

/// Lightweight row used by hierarchy queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNode {
    pub id: Snowflake,
    pub parent_id: Option<Snowflake>,
    pub name: String,
    pub channel_type: ChannelType,
    pub status: ChannelStatus,
}

impl ChannelNode {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ChannelStatus::Active
    }
}

impl From<&Channel> for ChannelNode {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id,
            parent_id: channel.parent_id,
            name: channel.name.clone(),
            channel_type: channel.channel_type,
            status: channel.status,
        }
    }
}

/// Generate a DM channel name: `dm_` plus 17 random alphanumerics
pub fn generate_dm_name() -> String {
    use rand::Rng;

    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let suffix_len = ChannelName::MAX_LEN - DM_NAME_PREFIX.len();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..suffix_len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{DM_NAME_PREFIX}{suffix}")
}
