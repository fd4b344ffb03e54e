//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Every structural mutation goes through a
//! [`ChannelTransaction`]; reads outside a mutation use a [`ChannelReader`]
//! over a consistent snapshot.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Channel, ChannelNode};
use crate::error::DomainError;
use crate::value_objects::{ChannelName, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Channel Store
// ============================================================================

/// Read access to channel rows
///
/// Methods take `&mut self` because a reader owns a connection (or a
/// transaction) and records what it read.
#[async_trait]
pub trait ChannelReader: Send {
    /// Find a channel by id, archived rows included
    async fn find_channel(&mut self, id: Snowflake) -> RepoResult<Option<Channel>>;

    /// The node followed by its ancestors, nearest first
    ///
    /// Empty when `id` is unknown. At most `MAX_DEPTH + 1` rows are returned
    /// so a corrupted parent chain cannot loop.
    async fn fetch_lineage(&mut self, id: Snowflake) -> RepoResult<Vec<ChannelNode>>;

    /// The Active subtree rooted at `id` (root included), at most
    /// `MAX_DEPTH` levels deep
    async fn fetch_subtree(&mut self, id: Snowflake) -> RepoResult<Vec<ChannelNode>>;

    /// Ids of the Active public children of `parent_id` (`None` = root level)
    async fn find_child_ids(&mut self, parent_id: Option<Snowflake>)
        -> RepoResult<Vec<Snowflake>>;

    /// Whether an Active public sibling under `parent_id` already uses `name`
    /// (ASCII case-insensitive), ignoring `exclude`
    async fn public_name_taken(
        &mut self,
        name: &ChannelName,
        parent_id: Option<Snowflake>,
        exclude: Option<Snowflake>,
    ) -> RepoResult<bool>;

    /// Find the Active DM channel shared by two users
    async fn find_dm(&mut self, user_a: Snowflake, user_b: Snowflake)
        -> RepoResult<Option<Channel>>;
}

/// A scoped transaction. Dropping it without `commit` rolls back.
#[async_trait]
pub trait ChannelTransaction: ChannelReader {
    /// Insert a new channel row
    async fn insert_channel(&mut self, channel: &Channel) -> RepoResult<()>;

    /// Overwrite the mutable fields of an existing row
    async fn update_channel(&mut self, channel: &Channel) -> RepoResult<()>;

    /// Mark every listed Active channel Archived. Returns the number of rows changed.
    async fn archive_channels(&mut self, ids: &[Snowflake], at: DateTime<Utc>)
        -> RepoResult<u64>;

    /// Add membership rows; existing rows are left alone
    async fn add_private_members(
        &mut self,
        channel_id: Snowflake,
        user_ids: &[Snowflake],
    ) -> RepoResult<()>;

    /// Commit; fails with `Conflict` if a concurrent commit invalidated what was read
    async fn commit(self: Box<Self>) -> RepoResult<()>;

    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}

/// Transactional channel persistence
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Open a serializable transaction
    async fn begin(&self) -> RepoResult<Box<dyn ChannelTransaction>>;

    /// Open a reader over a consistent snapshot
    async fn reader(&self) -> RepoResult<Box<dyn ChannelReader>>;

    /// Every channel row, archived included
    async fn list_nodes(&self) -> RepoResult<Vec<ChannelNode>>;
}

// ============================================================================
// Membership Repository
// ============================================================================

/// Private-member and subscription overlays
///
/// Lookups hide rows that belong to Archived channels.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Insert a subscription row. Returns false if it already existed.
    async fn subscribe(&self, user_id: Snowflake, channel_id: Snowflake) -> RepoResult<bool>;

    /// Delete a subscription row. Returns false if there was none.
    async fn unsubscribe(&self, user_id: Snowflake, channel_id: Snowflake) -> RepoResult<bool>;

    async fn subscriber_ids(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    async fn subscribed_channel_ids(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    /// Members of an Active non-public channel
    async fn private_member_ids(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>>;

    async fn is_private_member(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<bool>;

    /// Active public channels plus Active non-public channels `user_id` belongs to
    async fn accessible_channels(&self, user_id: Snowflake) -> RepoResult<Vec<Channel>>;
}

// ============================================================================
// Message Locator
// ============================================================================

/// Resolves the container channel of a message owned by the message store
#[async_trait]
pub trait MessageLocator: Send + Sync {
    async fn channel_id_of(&self, message_id: Snowflake) -> RepoResult<Option<Snowflake>>;
}
