//! Channel lifecycle manager
//!
//! The only component that changes tree shape. Every operation runs inside
//! one store transaction, re-checks its invariants against that transaction's
//! snapshot, and is retried from scratch on a serialization conflict.

use std::collections::BTreeSet;

use chan_core::entities::{Channel, ChannelType};
use chan_core::events::{
    ChannelArchivedEvent, ChannelCreatedEvent, ChannelEvent, ChannelRenamedEvent,
    ChannelReparentedEvent, ChannelUpdatedEvent,
};
use chan_core::hierarchy::{leaf_depth_under, reparented_depth, Lineage, MAX_DEPTH};
use chan_core::traits::{ChannelReader, ChannelTransaction, RepoResult};
use chan_core::{ChannelName, DomainError, Snowflake};
use chrono::Utc;
use tracing::{info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::hierarchy::{active_channel, active_lineage, active_subtree, require_id};
use super::transaction::{run_with_retry, settle, Committed};

fn check_depth(depth: usize) -> RepoResult<()> {
    if depth > MAX_DEPTH {
        return Err(DomainError::ChannelDepthLimitation {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(())
}

/// Lineage of a channel that may take a new child
async fn parent_lineage<R>(reader: &mut R, parent_id: Snowflake) -> RepoResult<Lineage>
where
    R: ChannelReader + ?Sized,
{
    let lineage = active_lineage(reader, parent_id).await.map_err(|_| {
        DomainError::forbidden(format!("parent {parent_id} is not an active channel"))
    })?;
    match lineage.node() {
        Some(node) if node.channel_type == ChannelType::Public => Ok(lineage),
        _ => Err(DomainError::forbidden(format!(
            "parent {parent_id} is not a public channel"
        ))),
    }
}

async fn ensure_name_free<R>(
    reader: &mut R,
    name: &ChannelName,
    parent_id: Option<Snowflake>,
    exclude: Option<Snowflake>,
) -> RepoResult<()>
where
    R: ChannelReader + ?Sized,
{
    if reader.public_name_taken(name, parent_id, exclude).await? {
        return Err(DomainError::AlreadyExists(name.to_string()));
    }
    Ok(())
}

/// Structural mutations
pub struct ChannelLifecycleManager<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChannelLifecycleManager<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    async fn begin(&self) -> RepoResult<Box<dyn ChannelTransaction>> {
        self.ctx.channel_store().begin().await
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a public channel at the top level or under `parent_id`
    #[instrument(skip(self))]
    pub async fn create_public_channel(
        &self,
        name: &str,
        parent_id: Option<Snowflake>,
        creator_id: Snowflake,
    ) -> ServiceResult<Channel> {
        require_id(creator_id, "creator_id")?;
        let parent_id = parent_id.and_then(Snowflake::non_zero);
        let name = ChannelName::parse(name)?;

        let channel = run_with_retry(self.ctx, "create_public_channel", || {
            self.try_create_public(&name, parent_id, creator_id)
        })
        .await?;

        info!(channel_id = %channel.id, parent_id = ?parent_id, "Public channel created");
        Ok(channel)
    }

    /// Create a public channel under an existing parent
    #[instrument(skip(self))]
    pub async fn create_child_channel(
        &self,
        name: &str,
        parent_id: Snowflake,
        creator_id: Snowflake,
    ) -> ServiceResult<Channel> {
        require_id(parent_id, "parent_id")?;
        self.create_public_channel(name, Some(parent_id), creator_id)
            .await
    }

    async fn try_create_public(
        &self,
        name: &ChannelName,
        parent_id: Option<Snowflake>,
        creator_id: Snowflake,
    ) -> RepoResult<Committed<Channel>> {
        let mut tx = self.begin().await?;
        let result: RepoResult<Channel> = async {
            if let Some(parent_id) = parent_id {
                let lineage = parent_lineage(&mut *tx, parent_id).await?;
                check_depth(leaf_depth_under(lineage.ascendant_count()))?;
            }
            ensure_name_free(&mut *tx, name, parent_id, None).await?;

            let channel =
                Channel::new_public(self.ctx.generate_id(), name.clone(), parent_id, creator_id);
            tx.insert_channel(&channel).await?;
            Ok(channel)
        }
        .await;

        let channel = settle(tx, result).await?;
        let event = ChannelEvent::ChannelCreated(ChannelCreatedEvent::new(&channel));
        Ok(Committed::with_event(channel, event))
    }

    /// Create a top-level private channel; the creator is always a member
    #[instrument(skip(self, member_ids), fields(members = member_ids.len()))]
    pub async fn create_private_channel(
        &self,
        name: &str,
        creator_id: Snowflake,
        member_ids: &[Snowflake],
    ) -> ServiceResult<Channel> {
        require_id(creator_id, "creator_id")?;
        for member_id in member_ids {
            require_id(*member_id, "member_id")?;
        }
        let name = ChannelName::parse(name)?;
        let members: Vec<Snowflake> = std::iter::once(creator_id)
            .chain(member_ids.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let channel = run_with_retry(self.ctx, "create_private_channel", || {
            self.try_create_private(&name, creator_id, &members)
        })
        .await?;

        info!(channel_id = %channel.id, members = members.len(), "Private channel created");
        Ok(channel)
    }

    async fn try_create_private(
        &self,
        name: &ChannelName,
        creator_id: Snowflake,
        members: &[Snowflake],
    ) -> RepoResult<Committed<Channel>> {
        let mut tx = self.begin().await?;
        let result: RepoResult<Channel> = async {
            let channel = Channel::new_private(self.ctx.generate_id(), name.clone(), creator_id);
            tx.insert_channel(&channel).await?;
            tx.add_private_members(channel.id, members).await?;
            Ok(channel)
        }
        .await;

        let channel = settle(tx, result).await?;
        let event = ChannelEvent::ChannelCreated(ChannelCreatedEvent::new(&channel));
        Ok(Committed::with_event(channel, event))
    }

    /// Get or create the DM channel shared by two users
    #[instrument(skip(self))]
    pub async fn create_dm_channel(
        &self,
        user_a: Snowflake,
        user_b: Snowflake,
    ) -> ServiceResult<Channel> {
        require_id(user_a, "user_id")?;
        require_id(user_b, "user_id")?;
        if user_a == user_b {
            return Err(DomainError::ArgumentInvalid(
                "a DM channel needs two distinct users".to_string(),
            )
            .into());
        }

        run_with_retry(self.ctx, "create_dm_channel", || {
            self.try_create_dm(user_a, user_b)
        })
        .await
    }

    async fn try_create_dm(
        &self,
        user_a: Snowflake,
        user_b: Snowflake,
    ) -> RepoResult<Committed<Channel>> {
        let mut tx = self.begin().await?;
        let result: RepoResult<(Channel, bool)> = async {
            if let Some(existing) = tx.find_dm(user_a, user_b).await? {
                return Ok((existing, false));
            }
            let channel = Channel::new_dm(self.ctx.generate_id(), user_a);
            tx.insert_channel(&channel).await?;
            tx.add_private_members(channel.id, &[user_a, user_b]).await?;
            Ok((channel, true))
        }
        .await;

        let (channel, created) = settle(tx, result).await?;
        if !created {
            return Ok(Committed::silent(channel));
        }
        info!(channel_id = %channel.id, "DM channel created");
        let event = ChannelEvent::ChannelCreated(ChannelCreatedEvent::new(&channel));
        Ok(Committed::with_event(channel, event))
    }

    // ========================================================================
    // Structural changes
    // ========================================================================

    /// Rename a channel; DM channels keep their synthetic name
    #[instrument(skip(self))]
    pub async fn change_channel_name(
        &self,
        id: Snowflake,
        new_name: &str,
    ) -> ServiceResult<Channel> {
        require_id(id, "channel_id")?;
        let name = ChannelName::parse(new_name)?;

        let channel = run_with_retry(self.ctx, "change_channel_name", || {
            self.try_rename(id, &name)
        })
        .await?;

        info!(channel_id = %id, name = %channel.name, "Channel renamed");
        Ok(channel)
    }

    async fn try_rename(
        &self,
        id: Snowflake,
        name: &ChannelName,
    ) -> RepoResult<Committed<Channel>> {
        let mut tx = self.begin().await?;
        let result: RepoResult<(Channel, String)> = async {
            let mut channel = active_channel(&mut *tx, id).await?;
            if channel.is_dm() {
                return Err(DomainError::forbidden("DM channels cannot be renamed"));
            }
            if channel.is_public() {
                ensure_name_free(&mut *tx, name, channel.parent_id, Some(id)).await?;
            }

            let old_name = std::mem::take(&mut channel.name);
            channel.rename(name.clone());
            tx.update_channel(&channel).await?;
            Ok((channel, old_name))
        }
        .await;

        let (channel, old_name) = settle(tx, result).await?;
        let event = ChannelEvent::ChannelRenamed(ChannelRenamedEvent::new(
            id,
            old_name,
            channel.name.clone(),
        ));
        Ok(Committed::with_event(channel, event))
    }

    /// Move a public channel (and its subtree) under `new_parent_id`, or to the
    /// top level when it is `None`
    #[instrument(skip(self))]
    pub async fn change_channel_parent(
        &self,
        id: Snowflake,
        new_parent_id: Option<Snowflake>,
    ) -> ServiceResult<Channel> {
        require_id(id, "channel_id")?;
        let new_parent_id = new_parent_id.and_then(Snowflake::non_zero);

        let channel = run_with_retry(self.ctx, "change_channel_parent", || {
            self.try_reparent(id, new_parent_id)
        })
        .await?;

        info!(channel_id = %id, parent_id = ?new_parent_id, "Channel reparented");
        Ok(channel)
    }

    async fn try_reparent(
        &self,
        id: Snowflake,
        new_parent_id: Option<Snowflake>,
    ) -> RepoResult<Committed<Channel>> {
        let mut tx = self.begin().await?;
        let result: RepoResult<(Channel, Option<Snowflake>)> = async {
            let mut channel = active_channel(&mut *tx, id).await?;
            if !channel.is_public() {
                return Err(DomainError::forbidden(
                    "private and DM channels cannot be reparented",
                ));
            }

            let subtree = active_subtree(&mut *tx, id).await?;
            let new_parent_ascendants = match new_parent_id {
                Some(parent_id) => {
                    if subtree.contains(parent_id) {
                        return Err(DomainError::forbidden(
                            "a channel cannot move under itself or its descendants",
                        ));
                    }
                    let lineage = parent_lineage(&mut *tx, parent_id).await?;
                    if lineage.contains(id) {
                        return Err(DomainError::forbidden(
                            "parent chain already contains the channel",
                        ));
                    }
                    Some(lineage.ascendant_count())
                }
                None => None,
            };
            check_depth(reparented_depth(subtree.depth(), new_parent_ascendants))?;

            let name = ChannelName::parse(&channel.name)?;
            ensure_name_free(&mut *tx, &name, new_parent_id, Some(id)).await?;

            let old_parent_id = channel.parent_id;
            if old_parent_id != new_parent_id {
                channel.set_parent(new_parent_id);
                tx.update_channel(&channel).await?;
            }
            Ok((channel, old_parent_id))
        }
        .await;

        let (channel, old_parent_id) = settle(tx, result).await?;
        if old_parent_id == new_parent_id {
            return Ok(Committed::silent(channel));
        }
        let event = ChannelEvent::ChannelReparented(ChannelReparentedEvent::new(
            id,
            old_parent_id,
            new_parent_id,
        ));
        Ok(Committed::with_event(channel, event))
    }

    // ========================================================================
    // Field updates
    // ========================================================================

    #[instrument(skip(self, topic))]
    pub async fn update_channel_topic(
        &self,
        id: Snowflake,
        topic: &str,
        updater_id: Snowflake,
    ) -> ServiceResult<Channel> {
        require_id(id, "channel_id")?;
        require_id(updater_id, "updater_id")?;

        let channel = run_with_retry(self.ctx, "update_channel_topic", || {
            self.try_update(id, move |channel| channel.set_topic(topic.to_string(), updater_id))
        })
        .await?;

        info!(channel_id = %id, updater_id = %updater_id, "Channel topic updated");
        Ok(channel)
    }

    /// Partial flag update; `None` leaves a flag unchanged
    #[instrument(skip(self))]
    pub async fn update_channel_attributes(
        &self,
        id: Snowflake,
        visible: Option<bool>,
        forced: Option<bool>,
    ) -> ServiceResult<Channel> {
        require_id(id, "channel_id")?;

        let channel = run_with_retry(self.ctx, "update_channel_attributes", || {
            self.try_update(id, move |channel| channel.set_attributes(visible, forced))
        })
        .await?;

        info!(
            channel_id = %id,
            is_visible = channel.is_visible,
            is_forced = channel.is_forced,
            "Channel attributes updated"
        );
        Ok(channel)
    }

    async fn try_update(
        &self,
        id: Snowflake,
        apply: impl FnOnce(&mut Channel),
    ) -> RepoResult<Committed<Channel>> {
        let mut tx = self.begin().await?;
        let result: RepoResult<Channel> = async {
            let mut channel = active_channel(&mut *tx, id).await?;
            apply(&mut channel);
            tx.update_channel(&channel).await?;
            Ok(channel)
        }
        .await;

        let channel = settle(tx, result).await?;
        let event = ChannelEvent::ChannelUpdated(ChannelUpdatedEvent::new(&channel));
        Ok(Committed::with_event(channel, event))
    }

    // ========================================================================
    // Archival
    // ========================================================================

    /// Archive a channel and its whole Active subtree. Returns the archived ids,
    /// the channel itself first.
    #[instrument(skip(self))]
    pub async fn delete_channel(&self, id: Snowflake) -> ServiceResult<Vec<Snowflake>> {
        require_id(id, "channel_id")?;

        let archived = run_with_retry(self.ctx, "delete_channel", || self.try_archive(id)).await?;

        info!(channel_id = %id, archived = archived.len(), "Channel archived");
        Ok(archived)
    }

    async fn try_archive(&self, id: Snowflake) -> RepoResult<Committed<Vec<Snowflake>>> {
        let at = Utc::now();
        let mut tx = self.begin().await?;
        let result: RepoResult<(Channel, Vec<Snowflake>)> = async {
            let mut channel = active_channel(&mut *tx, id).await?;
            let subtree = active_subtree(&mut *tx, id).await?;

            let mut ids = vec![id];
            ids.extend(subtree.descendant_ids());
            tx.archive_channels(&ids, at).await?;
            channel.archive(at);
            Ok((channel, ids))
        }
        .await;

        let (channel, ids) = settle(tx, result).await?;
        let event =
            ChannelEvent::ChannelArchived(ChannelArchivedEvent::new(&channel, ids.clone(), at));
        Ok(Committed::with_event(ids, event))
    }
}
