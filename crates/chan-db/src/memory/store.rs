//! In-memory ChannelStore with optimistic, first-committer-wins transactions

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, instrument};

use chan_core::entities::{Channel, ChannelNode};
use chan_core::hierarchy::MAX_DEPTH;
use chan_core::traits::{
    ChannelReader, ChannelStore, ChannelTransaction, MembershipRepository, MessageLocator,
    RepoResult,
};
use chan_core::value_objects::{ChannelName, Snowflake};
use chan_core::DomainError;

use super::state::State;

type Shared = Arc<RwLock<Arc<State>>>;

/// Channel store, membership overlay and message index held in process memory
///
/// Readers share an immutable snapshot. A transaction works on its own
/// copy of the snapshot and remembers the version of every row and child
/// set it looked at; commit fails with `Conflict` if any of them moved.
#[derive(Clone, Default)]
pub struct MemoryChannelStore {
    shared: Shared,
}

impl MemoryChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Arc<State> {
        Arc::clone(&self.shared.read())
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut guard = self.shared.write();
        f(Arc::make_mut(&mut guard))
    }

    fn session(&self) -> MemorySession {
        MemorySession {
            shared: Arc::clone(&self.shared),
            view: self.snapshot(),
            reads: ReadSet::default(),
            writes: Vec::new(),
        }
    }

    /// Record which channel a message lives in, standing in for the message store
    pub fn register_message(&self, message_id: Snowflake, channel_id: Snowflake) {
        self.mutate(|state| {
            state.messages.insert(message_id, channel_id);
        });
    }
}

#[async_trait]
impl ChannelStore for MemoryChannelStore {
    async fn begin(&self) -> RepoResult<Box<dyn ChannelTransaction>> {
        Ok(Box::new(self.session()))
    }

    async fn reader(&self) -> RepoResult<Box<dyn ChannelReader>> {
        Ok(Box::new(self.session()))
    }

    async fn list_nodes(&self) -> RepoResult<Vec<ChannelNode>> {
        let state = self.snapshot();
        let mut nodes: Vec<_> = state
            .rows
            .values()
            .map(|row| ChannelNode::from(&row.channel))
            .collect();
        nodes.sort_unstable_by_key(|n| n.id);
        Ok(nodes)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Versions observed by a session
#[derive(Debug, Default)]
struct ReadSet {
    rows: HashMap<Snowflake, u64>,
    child_sets: HashMap<Option<Snowflake>, u64>,
    dms: Option<u64>,
}

impl ReadSet {
    fn validate(&self, current: &State) -> RepoResult<()> {
        if let Some((id, _)) = self
            .rows
            .iter()
            .find(|(id, version)| current.row_version(**id) != **version)
        {
            return Err(DomainError::conflict(format!("channel {id} changed concurrently")));
        }
        if let Some((parent, _)) = self
            .child_sets
            .iter()
            .find(|(parent, version)| current.child_set_version(**parent) != **version)
        {
            return Err(DomainError::conflict(format!(
                "children of {parent:?} changed concurrently"
            )));
        }
        if self.dms.is_some_and(|version| current.dm_version != version) {
            return Err(DomainError::conflict("dm channels changed concurrently"));
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Write {
    Upsert(Channel),
    AddMembers(Snowflake, Vec<Snowflake>),
}

/// Reader or transaction over one snapshot
pub struct MemorySession {
    shared: Shared,
    /// Snapshot plus this session's own writes
    view: Arc<State>,
    reads: ReadSet,
    writes: Vec<Write>,
}

impl MemorySession {
    fn record_row(&mut self, id: Snowflake) {
        let version = self.view.row_version(id);
        self.reads.rows.entry(id).or_insert(version);
    }

    fn record_children(&mut self, parent_id: Option<Snowflake>) {
        let version = self.view.child_set_version(parent_id);
        self.reads.child_sets.entry(parent_id).or_insert(version);
    }

    fn write(&mut self, write: Write) {
        let view = Arc::make_mut(&mut self.view);
        match &write {
            Write::Upsert(channel) => view.upsert(channel.clone(), None),
            Write::AddMembers(channel_id, user_ids) => view.add_members(*channel_id, user_ids),
        }
        self.writes.push(write);
    }

    /// Backstop for the sibling-name rule, mirroring the unique index
    fn ensure_name_free(&mut self, channel: &Channel) -> RepoResult<()> {
        if !channel.is_public() || !channel.is_active() {
            return Ok(());
        }
        self.record_children(channel.parent_id);
        if self
            .view
            .public_name_taken(&channel.name, channel.parent_id, Some(channel.id))
        {
            return Err(DomainError::AlreadyExists(channel.name.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelReader for MemorySession {
    async fn find_channel(&mut self, id: Snowflake) -> RepoResult<Option<Channel>> {
        self.record_row(id);
        Ok(self.view.channel(id).cloned())
    }

    async fn fetch_lineage(&mut self, id: Snowflake) -> RepoResult<Vec<ChannelNode>> {
        let mut nodes = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            if nodes.len() > MAX_DEPTH {
                break;
            }
            self.record_row(id);
            let Some(channel) = self.view.channel(id) else {
                break;
            };
            nodes.push(ChannelNode::from(channel));
            current = channel.parent_id;
        }
        Ok(nodes)
    }

    async fn fetch_subtree(&mut self, id: Snowflake) -> RepoResult<Vec<ChannelNode>> {
        self.record_row(id);
        let Some(root) = self.view.active_channel(id).map(ChannelNode::from) else {
            return Ok(Vec::new());
        };

        let mut nodes = vec![root];
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([(id, 1usize)]);
        while let Some((parent, level)) = queue.pop_front() {
            if level == MAX_DEPTH {
                continue;
            }
            self.record_children(Some(parent));
            let children: Vec<_> = self
                .view
                .children_of(Some(parent))
                .filter(|c| c.is_active())
                .map(ChannelNode::from)
                .collect();
            for child in children {
                if seen.insert(child.id) {
                    queue.push_back((child.id, level + 1));
                    nodes.push(child);
                }
            }
        }
        Ok(nodes)
    }

    async fn find_child_ids(&mut self, parent_id: Option<Snowflake>) -> RepoResult<Vec<Snowflake>> {
        self.record_children(parent_id);
        Ok(self
            .view
            .children_of(parent_id)
            .filter(|c| c.is_active() && c.is_public())
            .map(|c| c.id)
            .collect())
    }

    async fn public_name_taken(
        &mut self,
        name: &ChannelName,
        parent_id: Option<Snowflake>,
        exclude: Option<Snowflake>,
    ) -> RepoResult<bool> {
        self.record_children(parent_id);
        Ok(self.view.public_name_taken(name.as_str(), parent_id, exclude))
    }

    async fn find_dm(
        &mut self,
        user_a: Snowflake,
        user_b: Snowflake,
    ) -> RepoResult<Option<Channel>> {
        self.reads.dms.get_or_insert(self.view.dm_version);
        let pair = HashSet::from([user_a, user_b]);
        let mut dms: Vec<_> = self
            .view
            .rows
            .values()
            .map(|row| &row.channel)
            .filter(|c| c.is_dm() && c.is_active())
            .filter(|c| self.view.members_of(c.id).collect::<HashSet<_>>() == pair)
            .cloned()
            .collect();
        dms.sort_unstable_by_key(|c| c.id);
        Ok(dms.into_iter().next())
    }
}

#[async_trait]
impl ChannelTransaction for MemorySession {
    async fn insert_channel(&mut self, channel: &Channel) -> RepoResult<()> {
        self.record_row(channel.id);
        if self.view.channel(channel.id).is_some() {
            return Err(DomainError::AlreadyExists(channel.name.clone()));
        }
        self.ensure_name_free(channel)?;
        self.write(Write::Upsert(channel.clone()));
        Ok(())
    }

    async fn update_channel(&mut self, channel: &Channel) -> RepoResult<()> {
        self.record_row(channel.id);
        if self.view.active_channel(channel.id).is_none() {
            return Err(DomainError::ChannelNotFound(channel.id));
        }
        self.ensure_name_free(channel)?;
        self.write(Write::Upsert(channel.clone()));
        Ok(())
    }

    async fn archive_channels(&mut self, ids: &[Snowflake], at: DateTime<Utc>) -> RepoResult<u64> {
        let mut archived = 0;
        for id in ids {
            self.record_row(*id);
            let Some(mut channel) = self.view.channel(*id).cloned() else {
                continue;
            };
            if channel.archive(at) {
                self.write(Write::Upsert(channel));
                archived += 1;
            }
        }
        Ok(archived)
    }

    async fn add_private_members(
        &mut self,
        channel_id: Snowflake,
        user_ids: &[Snowflake],
    ) -> RepoResult<()> {
        self.record_row(channel_id);
        if self.view.channel(channel_id).is_none() {
            return Err(DomainError::ChannelNotFound(channel_id));
        }
        self.write(Write::AddMembers(channel_id, user_ids.to_vec()));
        Ok(())
    }

    #[instrument(skip(self), fields(reads = self.reads.rows.len(), writes = self.writes.len()))]
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let session = *self;
        let mut guard = session.shared.write();
        session.reads.validate(&guard)?;
        if session.writes.is_empty() {
            return Ok(());
        }

        let state = Arc::make_mut(&mut guard);
        state.version += 1;
        let stamp = state.version;
        for write in session.writes {
            match write {
                Write::Upsert(channel) => state.upsert(channel, Some(stamp)),
                Write::AddMembers(channel_id, user_ids) => state.add_members(channel_id, &user_ids),
            }
        }
        debug!(stamp, "Committed memory transaction");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(())
    }
}

// ============================================================================
// Membership and messages
// ============================================================================

#[async_trait]
impl MembershipRepository for MemoryChannelStore {
    async fn subscribe(&self, user_id: Snowflake, channel_id: Snowflake) -> RepoResult<bool> {
        Ok(self.mutate(|state| state.subscriptions.insert((user_id, channel_id))))
    }

    async fn unsubscribe(&self, user_id: Snowflake, channel_id: Snowflake) -> RepoResult<bool> {
        Ok(self.mutate(|state| state.subscriptions.remove(&(user_id, channel_id))))
    }

    async fn subscriber_ids(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let state = self.snapshot();
        if state.active_channel(channel_id).is_none() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<_> = state
            .subscriptions
            .iter()
            .filter(|(_, channel)| *channel == channel_id)
            .map(|(user, _)| *user)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn subscribed_channel_ids(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let state = self.snapshot();
        Ok(state
            .subscriptions
            .range((user_id, Snowflake::new(i64::MIN))..=(user_id, Snowflake::new(i64::MAX)))
            .map(|(_, channel)| *channel)
            .filter(|channel| state.active_channel(*channel).is_some())
            .collect())
    }

    async fn private_member_ids(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let state = self.snapshot();
        match state.active_channel(channel_id) {
            Some(channel) if !channel.is_public() => Ok(state.members_of(channel_id).collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn is_private_member(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<bool> {
        let state = self.snapshot();
        Ok(state.active_channel(channel_id).is_some()
            && state.members_of(channel_id).any(|member| member == user_id))
    }

    async fn accessible_channels(&self, user_id: Snowflake) -> RepoResult<Vec<Channel>> {
        let state = self.snapshot();
        let mut channels: Vec<_> = state
            .rows
            .values()
            .map(|row| &row.channel)
            .filter(|c| c.is_active())
            .filter(|c| c.is_public() || state.members_of(c.id).any(|m| m == user_id))
            .cloned()
            .collect();
        channels.sort_unstable_by_key(|c| c.id);
        Ok(channels)
    }
}

#[async_trait]
impl MessageLocator for MemoryChannelStore {
    async fn channel_id_of(&self, message_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        Ok(self.snapshot().messages.get(&message_id).copied())
    }
}
