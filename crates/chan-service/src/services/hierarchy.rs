//! Hierarchy resolver
//!
//! Read-side tree queries. Each public method opens one reader, so all rows
//! it looks at come from the same snapshot. The free functions are shared
//! with the lifecycle manager, which runs them inside its write transaction.

use chan_core::entities::Channel;
use chan_core::hierarchy::{Lineage, Subtree};
use chan_core::traits::{ChannelReader, RepoResult};
use chan_core::{ChannelName, DomainError, Snowflake};
use tracing::instrument;

use super::context::ServiceContext;
use super::error::ServiceResult;

pub(crate) fn require_id(id: Snowflake, what: &'static str) -> RepoResult<Snowflake> {
    if id.is_zero() {
        Err(DomainError::NilId(what))
    } else {
        Ok(id)
    }
}

/// The channel if it exists and is Active
pub(crate) async fn active_channel<R>(reader: &mut R, id: Snowflake) -> RepoResult<Channel>
where
    R: ChannelReader + ?Sized,
{
    reader
        .find_channel(id)
        .await?
        .filter(Channel::is_active)
        .ok_or(DomainError::ChannelNotFound(id))
}

/// Lineage of an Active channel
pub(crate) async fn active_lineage<R>(reader: &mut R, id: Snowflake) -> RepoResult<Lineage>
where
    R: ChannelReader + ?Sized,
{
    let lineage = Lineage::new(reader.fetch_lineage(id).await?);
    match lineage.node() {
        Some(node) if node.is_active() => Ok(lineage),
        _ => Err(DomainError::ChannelNotFound(id)),
    }
}

/// Active subtree rooted at an Active channel
pub(crate) async fn active_subtree<R>(reader: &mut R, id: Snowflake) -> RepoResult<Subtree>
where
    R: ChannelReader + ?Sized,
{
    let rows = reader.fetch_subtree(id).await?;
    if !rows.iter().any(|n| n.id == id) {
        return Err(DomainError::ChannelNotFound(id));
    }
    Ok(Subtree::new(id, &rows))
}

/// Read-only tree queries
pub struct HierarchyResolver<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Immediate parent; `None` for a top-level channel
    #[instrument(skip(self))]
    pub async fn parent(&self, id: Snowflake) -> ServiceResult<Option<Snowflake>> {
        require_id(id, "channel_id")?;
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(active_channel(&mut *reader, id).await?.parent_id)
    }

    /// Ancestor ids, immediate parent first
    #[instrument(skip(self))]
    pub async fn ascendants(&self, id: Snowflake) -> ServiceResult<Vec<Snowflake>> {
        require_id(id, "channel_id")?;
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(active_lineage(&mut *reader, id).await?.ascendant_ids())
    }

    /// Every Active channel below `id`, breadth-first
    #[instrument(skip(self))]
    pub async fn descendants(&self, id: Snowflake) -> ServiceResult<Vec<Snowflake>> {
        require_id(id, "channel_id")?;
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(active_subtree(&mut *reader, id).await?.descendant_ids())
    }

    /// Nodes on the longest downward path starting at `id`
    #[instrument(skip(self))]
    pub async fn depth(&self, id: Snowflake) -> ServiceResult<usize> {
        require_id(id, "channel_id")?;
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(active_subtree(&mut *reader, id).await?.depth())
    }

    /// Root-first names joined with `/`
    #[instrument(skip(self))]
    pub async fn path(&self, id: Snowflake) -> ServiceResult<String> {
        require_id(id, "channel_id")?;
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(active_lineage(&mut *reader, id).await?.path())
    }

    #[instrument(skip(self))]
    pub async fn name_taken_under_parent(
        &self,
        name: &str,
        parent_id: Option<Snowflake>,
    ) -> ServiceResult<bool> {
        let name = ChannelName::parse(name)?;
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(reader
            .public_name_taken(&name, parent_id.and_then(Snowflake::non_zero), None)
            .await?)
    }

    /// Active public children of `parent_id` (`None` = top level)
    #[instrument(skip(self))]
    pub async fn child_ids(&self, parent_id: Option<Snowflake>) -> ServiceResult<Vec<Snowflake>> {
        let mut reader = self.ctx.channel_store().reader().await?;
        Ok(reader.find_child_ids(parent_id.and_then(Snowflake::non_zero)).await?)
    }
}
