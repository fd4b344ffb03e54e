//! Channel facade
//!
//! The operation set external callers (HTTP handlers, bots) use. Stateless:
//! every call builds the manager it needs over the shared context.

use chan_core::hierarchy::{verify_forest, ForestViolation};
use chan_core::{Channel, DomainError, Snowflake};
use tracing::{instrument, warn};
use validator::Validate;

use crate::dto::CreateChannelRequest;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::hierarchy::{active_channel, require_id, HierarchyResolver};
use super::lifecycle::ChannelLifecycleManager;
use super::membership::MembershipManager;

#[derive(Debug, Clone)]
pub struct ChannelFacade {
    ctx: ServiceContext,
}

impl ChannelFacade {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    fn lifecycle(&self) -> ChannelLifecycleManager<'_> {
        ChannelLifecycleManager::new(&self.ctx)
    }

    fn resolver(&self) -> HierarchyResolver<'_> {
        HierarchyResolver::new(&self.ctx)
    }

    fn membership(&self) -> MembershipManager<'_> {
        MembershipManager::new(&self.ctx)
    }

    // ========================================================================
    // Creation
    // ========================================================================

    pub async fn create_public_channel(
        &self,
        name: &str,
        parent_id: Option<Snowflake>,
        creator_id: Snowflake,
    ) -> ServiceResult<Channel> {
        self.lifecycle()
            .create_public_channel(name, parent_id, creator_id)
            .await
    }

    pub async fn create_child_channel(
        &self,
        name: &str,
        parent_id: Snowflake,
        creator_id: Snowflake,
    ) -> ServiceResult<Channel> {
        self.lifecycle()
            .create_child_channel(name, parent_id, creator_id)
            .await
    }

    pub async fn create_private_channel(
        &self,
        name: &str,
        creator_id: Snowflake,
        member_ids: &[Snowflake],
    ) -> ServiceResult<Channel> {
        self.lifecycle()
            .create_private_channel(name, creator_id, member_ids)
            .await
    }

    pub async fn create_dm_channel(
        &self,
        user_a: Snowflake,
        user_b: Snowflake,
    ) -> ServiceResult<Channel> {
        self.lifecycle().create_dm_channel(user_a, user_b).await
    }

    /// Request-shaped creation: validates the DTO, then dispatches to the
    /// public or private constructor
    #[instrument(skip(self, request), fields(name = %request.name, private = request.private))]
    pub async fn create_channel(
        &self,
        creator_id: Snowflake,
        request: CreateChannelRequest,
    ) -> ServiceResult<Channel> {
        request.validate()?;

        if request.private {
            let members = request.member_ids()?;
            self.create_private_channel(&request.name, creator_id, &members)
                .await
        } else {
            let parent_id = request.parent()?;
            self.create_public_channel(&request.name, parent_id, creator_id)
                .await
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// An Active channel by id
    #[instrument(skip(self))]
    pub async fn get_channel(&self, id: Snowflake) -> ServiceResult<Channel> {
        require_id(id, "channel_id")?;
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(active_channel(&mut *reader, id).await?)
    }

    /// The Active channel a message was posted in
    #[instrument(skip(self))]
    pub async fn get_channel_by_message_id(&self, message_id: Snowflake) -> ServiceResult<Channel> {
        require_id(message_id, "message_id")?;
        let channel_id = self
            .ctx
            .message_locator()
            .channel_id_of(message_id)
            .await?
            .ok_or(DomainError::MessageNotFound(message_id))?;
        self.get_channel(channel_id).await
    }

    pub async fn get_channel_path(&self, id: Snowflake) -> ServiceResult<String> {
        self.resolver().path(id).await
    }

    /// Active public children; `None` lists the top level
    pub async fn get_children_channel_ids(
        &self,
        parent_id: Option<Snowflake>,
    ) -> ServiceResult<Vec<Snowflake>> {
        self.resolver().child_ids(parent_id).await
    }

    pub async fn get_ascendant_ids(&self, id: Snowflake) -> ServiceResult<Vec<Snowflake>> {
        self.resolver().ascendants(id).await
    }

    pub async fn get_descendant_ids(&self, id: Snowflake) -> ServiceResult<Vec<Snowflake>> {
        self.resolver().descendants(id).await
    }

    pub async fn get_channel_depth(&self, id: Snowflake) -> ServiceResult<usize> {
        self.resolver().depth(id).await
    }

    // ========================================================================
    // Structural changes
    // ========================================================================

    pub async fn change_channel_name(
        &self,
        id: Snowflake,
        new_name: &str,
    ) -> ServiceResult<Channel> {
        self.lifecycle().change_channel_name(id, new_name).await
    }

    /// `None` (or a nil id) moves the channel to the top level
    pub async fn change_channel_parent(
        &self,
        id: Snowflake,
        new_parent_id: Option<Snowflake>,
    ) -> ServiceResult<Channel> {
        self.lifecycle().change_channel_parent(id, new_parent_id).await
    }

    pub async fn update_channel_topic(
        &self,
        id: Snowflake,
        topic: &str,
        updater_id: Snowflake,
    ) -> ServiceResult<Channel> {
        self.lifecycle()
            .update_channel_topic(id, topic, updater_id)
            .await
    }

    pub async fn update_channel_attributes(
        &self,
        id: Snowflake,
        visible: Option<bool>,
        forced: Option<bool>,
    ) -> ServiceResult<Channel> {
        self.lifecycle()
            .update_channel_attributes(id, visible, forced)
            .await
    }

    /// Archive a channel and its subtree; returns every archived id
    pub async fn delete_channel(&self, id: Snowflake) -> ServiceResult<Vec<Snowflake>> {
        self.lifecycle().delete_channel(id).await
    }

    // ========================================================================
    // Membership
    // ========================================================================

    pub async fn add_private_members(
        &self,
        channel_id: Snowflake,
        user_ids: &[Snowflake],
    ) -> ServiceResult<()> {
        self.membership()
            .add_private_members(channel_id, user_ids)
            .await
    }

    pub async fn get_private_channel_member_ids(
        &self,
        channel_id: Snowflake,
    ) -> ServiceResult<Vec<Snowflake>> {
        self.membership().private_member_ids(channel_id).await
    }

    pub async fn subscribe_channel(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<()> {
        self.membership().subscribe(user_id, channel_id).await
    }

    pub async fn unsubscribe_channel(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<()> {
        self.membership().unsubscribe(user_id, channel_id).await
    }

    pub async fn get_subscribing_user_ids(
        &self,
        channel_id: Snowflake,
    ) -> ServiceResult<Vec<Snowflake>> {
        self.membership().subscribing_user_ids(channel_id).await
    }

    pub async fn get_subscribed_channel_ids(
        &self,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<Snowflake>> {
        self.membership().subscribed_channel_ids(user_id).await
    }

    pub async fn is_channel_accessible_to_user(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<bool> {
        self.membership()
            .is_channel_accessible_to_user(user_id, channel_id)
            .await
    }

    pub async fn get_accessible_channels(&self, user_id: Snowflake) -> ServiceResult<Vec<Channel>> {
        self.membership().accessible_channels(user_id).await
    }

    // ========================================================================
    // Integrity
    // ========================================================================

    /// Check every stored row against the forest invariants
    #[instrument(skip(self))]
    pub async fn verify_forest(&self) -> ServiceResult<Vec<ForestViolation>> {
        let nodes = self.ctx.channel_store().list_nodes().await?;
        let violations = verify_forest(&nodes);
        for violation in &violations {
            warn!(%violation, "Channel forest violation");
        }
        Ok(violations)
    }
}
