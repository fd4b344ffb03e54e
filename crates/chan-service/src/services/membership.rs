//! Membership manager
//!
//! Private-member and subscription overlays. Independent of tree shape.

use chan_core::traits::RepoResult;
use chan_core::{Channel, DomainError, Snowflake};
use tracing::{debug, info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::hierarchy::{active_channel, require_id};
use super::transaction::{run_with_retry, settle, Committed};

pub struct MembershipManager<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MembershipManager<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Subscribe a user to an Active channel; re-subscribing is a no-op
    #[instrument(skip(self))]
    pub async fn subscribe(&self, user_id: Snowflake, channel_id: Snowflake) -> ServiceResult<()> {
        require_id(user_id, "user_id")?;
        require_id(channel_id, "channel_id")?;

        let mut reader = self.ctx.channel_store().reader().await?;
        active_channel(&mut *reader, channel_id).await?;
        drop(reader);

        let inserted = self.ctx.membership_repo().subscribe(user_id, channel_id).await?;
        if inserted {
            info!(user_id = %user_id, channel_id = %channel_id, "Channel subscribed");
        } else {
            debug!(user_id = %user_id, channel_id = %channel_id, "Already subscribed");
        }
        Ok(())
    }

    /// Remove a subscription if there is one
    #[instrument(skip(self))]
    pub async fn unsubscribe(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<()> {
        require_id(user_id, "user_id")?;
        require_id(channel_id, "channel_id")?;

        if self.ctx.membership_repo().unsubscribe(user_id, channel_id).await? {
            info!(user_id = %user_id, channel_id = %channel_id, "Channel unsubscribed");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn subscribing_user_ids(
        &self,
        channel_id: Snowflake,
    ) -> ServiceResult<Vec<Snowflake>> {
        if channel_id.is_zero() {
            return Ok(Vec::new());
        }
        Ok(self.ctx.membership_repo().subscriber_ids(channel_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn subscribed_channel_ids(
        &self,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<Snowflake>> {
        if user_id.is_zero() {
            return Ok(Vec::new());
        }
        Ok(self.ctx.membership_repo().subscribed_channel_ids(user_id).await?)
    }

    // ========================================================================
    // Private members
    // ========================================================================

    /// Add members to a private channel; existing members are left alone
    #[instrument(skip(self, user_ids), fields(users = user_ids.len()))]
    pub async fn add_private_members(
        &self,
        channel_id: Snowflake,
        user_ids: &[Snowflake],
    ) -> ServiceResult<()> {
        require_id(channel_id, "channel_id")?;
        for user_id in user_ids {
            require_id(*user_id, "user_id")?;
        }

        run_with_retry(self.ctx, "add_private_members", || {
            self.try_add_members(channel_id, user_ids)
        })
        .await?;

        info!(channel_id = %channel_id, users = user_ids.len(), "Private members added");
        Ok(())
    }

    async fn try_add_members(
        &self,
        channel_id: Snowflake,
        user_ids: &[Snowflake],
    ) -> RepoResult<Committed<()>> {
        let mut tx = self.ctx.channel_store().begin().await?;
        let result: RepoResult<()> = async {
            let channel = active_channel(&mut *tx, channel_id).await?;
            if channel.is_public() {
                return Err(DomainError::forbidden("public channels have no member list"));
            }
            if channel.is_dm() {
                return Err(DomainError::forbidden("DM members are fixed at creation"));
            }
            tx.add_private_members(channel_id, user_ids).await
        }
        .await;

        settle(tx, result).await?;
        Ok(Committed::silent(()))
    }

    #[instrument(skip(self))]
    pub async fn private_member_ids(&self, channel_id: Snowflake) -> ServiceResult<Vec<Snowflake>> {
        if channel_id.is_zero() {
            return Ok(Vec::new());
        }
        Ok(self.ctx.membership_repo().private_member_ids(channel_id).await?)
    }

    // ========================================================================
    // Accessibility
    // ========================================================================

    /// Whether `user_id` may see `channel_id`
    ///
    /// Public Active channels are open to everyone; private and DM channels
    /// only to their members; Archived or unknown channels to nobody.
    #[instrument(skip(self))]
    pub async fn is_channel_accessible_to_user(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<bool> {
        if channel_id.is_zero() {
            return Ok(false);
        }

        let mut reader = self.ctx.channel_store().reader().await?;
        let Some(channel) = reader.find_channel(channel_id).await? else {
            return Ok(false);
        };
        drop(reader);

        if !channel.is_active() {
            return Ok(false);
        }
        if channel.is_public() {
            return Ok(true);
        }
        if user_id.is_zero() {
            return Ok(false);
        }
        Ok(self
            .ctx
            .membership_repo()
            .is_private_member(channel_id, user_id)
            .await?)
    }

    /// Every Active channel `user_id` may see
    #[instrument(skip(self))]
    pub async fn accessible_channels(
        &self,
        user_id: Snowflake,
    ) -> ServiceResult<Vec<Channel>> {
        Ok(self.ctx.membership_repo().accessible_channels(user_id).await?)
    }
}
