//! PostgreSQL implementation of ChannelStore
//!
//! Reads and writes run through [`PgChannelSession`], which wraps either a
//! pooled connection (plain reads) or a SERIALIZABLE transaction (mutations).
//! Hierarchy reads are single recursive CTEs.

use std::ops::DerefMut;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use chan_core::entities::{Channel, ChannelNode};
use chan_core::hierarchy::MAX_DEPTH;
use chan_core::traits::{ChannelReader, ChannelStore, ChannelTransaction, RepoResult};
use chan_core::value_objects::{ChannelName, Snowflake};
use chan_core::DomainError;

use crate::mappers::ChannelRow;
use crate::models::{ChannelModel, ChannelNodeModel};

use super::error::{map_db_error, map_unique_violation};

/// Select list for full channel rows, aliased as `c`
pub(crate) const CHANNEL_COLUMNS: &str = r"
    c.id, c.name, c.parent_id, c.creator_id, c.updater_id, c.topic, c.type::TEXT AS type,
    c.is_visible, c.is_forced, c.status::TEXT AS status, c.archived_at, c.created_at, c.updated_at
";

/// PostgreSQL implementation of ChannelStore
#[derive(Clone)]
pub struct PgChannelStore {
    pool: PgPool,
}

impl PgChannelStore {
    /// Create a new PgChannelStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelStore for PgChannelStore {
    #[instrument(skip(self))]
    async fn begin(&self) -> RepoResult<Box<dyn ChannelTransaction>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        Ok(Box::new(PgChannelSession { conn: tx }))
    }

    #[instrument(skip(self))]
    async fn reader(&self) -> RepoResult<Box<dyn ChannelReader>> {
        let conn = self.pool.acquire().await.map_err(map_db_error)?;
        Ok(Box::new(PgChannelSession { conn }))
    }

    #[instrument(skip(self))]
    async fn list_nodes(&self) -> RepoResult<Vec<ChannelNode>> {
        let rows = sqlx::query_as::<_, ChannelNodeModel>(
            r"
            SELECT id, parent_id, name, type::TEXT AS type, status::TEXT AS status
            FROM channels
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(ChannelNode::from).collect())
    }
}

/// A connection or transaction used for channel reads and writes
pub struct PgChannelSession<C> {
    conn: C,
}

/// Plain pooled reader
pub type PgChannelReader = PgChannelSession<PoolConnection<Postgres>>;

/// SERIALIZABLE transaction
pub type PgChannelTx = PgChannelSession<Transaction<'static, Postgres>>;

#[async_trait]
impl<C> ChannelReader for PgChannelSession<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    #[instrument(skip(self))]
    async fn find_channel(&mut self, id: Snowflake) -> RepoResult<Option<Channel>> {
        select_channel(&mut *self.conn, id).await
    }

    #[instrument(skip(self))]
    async fn fetch_lineage(&mut self, id: Snowflake) -> RepoResult<Vec<ChannelNode>> {
        let rows = sqlx::query_as::<_, ChannelNodeModel>(
            r"
            WITH RECURSIVE lineage AS (
                SELECT id, parent_id, name, type, status, 0 AS hops
                FROM channels
                WHERE id = $1
                UNION ALL
                SELECT c.id, c.parent_id, c.name, c.type, c.status, l.hops + 1
                FROM channels c
                JOIN lineage l ON c.id = l.parent_id
                WHERE l.hops < $2
            )
            SELECT id, parent_id, name, type::TEXT AS type, status::TEXT AS status
            FROM lineage
            ORDER BY hops
            ",
        )
        .bind(id.into_inner())
        .bind(MAX_DEPTH as i32)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(map_db_error)?;

        debug!(rows = rows.len(), "Fetched lineage");
        Ok(rows.into_iter().map(ChannelNode::from).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_subtree(&mut self, id: Snowflake) -> RepoResult<Vec<ChannelNode>> {
        let rows = sqlx::query_as::<_, ChannelNodeModel>(
            r"
            WITH RECURSIVE subtree AS (
                SELECT id, parent_id, name, type, status, 1 AS level
                FROM channels
                WHERE id = $1 AND status = 'active'
                UNION ALL
                SELECT c.id, c.parent_id, c.name, c.type, c.status, s.level + 1
                FROM channels c
                JOIN subtree s ON c.parent_id = s.id
                WHERE c.status = 'active' AND s.level < $2
            )
            SELECT id, parent_id, name, type::TEXT AS type, status::TEXT AS status
            FROM subtree
            ORDER BY level, id
            ",
        )
        .bind(id.into_inner())
        .bind(MAX_DEPTH as i32)
        .fetch_all(&mut *self.conn)
        .await
        .map_err(map_db_error)?;

        debug!(rows = rows.len(), "Fetched subtree");
        Ok(rows.into_iter().map(ChannelNode::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_child_ids(&mut self, parent_id: Option<Snowflake>) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r"
            SELECT id FROM channels
            WHERE parent_id IS NOT DISTINCT FROM $1
              AND status = 'active'
              AND type = 'public'
            ORDER BY id
            ",
        )
        .bind(parent_id.map(Snowflake::into_inner))
        .fetch_all(&mut *self.conn)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn public_name_taken(
        &mut self,
        name: &ChannelName,
        parent_id: Option<Snowflake>,
        exclude: Option<Snowflake>,
    ) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM channels
                WHERE parent_id IS NOT DISTINCT FROM $1
                  AND LOWER(name) = LOWER($2)
                  AND status = 'active'
                  AND type = 'public'
                  AND ($3::BIGINT IS NULL OR id <> $3)
            )
            ",
        )
        .bind(parent_id.map(Snowflake::into_inner))
        .bind(name.as_str())
        .bind(exclude.map(Snowflake::into_inner))
        .fetch_one(&mut *self.conn)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn find_dm(
        &mut self,
        user_a: Snowflake,
        user_b: Snowflake,
    ) -> RepoResult<Option<Channel>> {
        let sql = format!(
            r"
            SELECT {CHANNEL_COLUMNS}
            FROM channels c
            JOIN private_channel_members m1 ON m1.channel_id = c.id AND m1.user_id = $1
            JOIN private_channel_members m2 ON m2.channel_id = c.id AND m2.user_id = $2
            WHERE c.type = 'dm'
              AND c.status = 'active'
              AND (SELECT COUNT(*) FROM private_channel_members WHERE channel_id = c.id) = 2
            ORDER BY c.id
            LIMIT 1
            "
        );
        let result = sqlx::query_as::<_, ChannelModel>(&sql)
            .bind(user_a.into_inner())
            .bind(user_b.into_inner())
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Channel::from))
    }
}

#[async_trait]
impl ChannelTransaction for PgChannelTx {
    #[instrument(skip(self, channel), fields(channel_id = %channel.id))]
    async fn insert_channel(&mut self, channel: &Channel) -> RepoResult<()> {
        let row = ChannelRow::new(channel);
        sqlx::query(
            r"
            INSERT INTO channels (id, name, parent_id, creator_id, updater_id, topic, type,
                                  is_visible, is_forced, status, archived_at,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7::channel_type, $8, $9,
                    $10::channel_status, $11, $12, $13)
            ",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.parent_id)
        .bind(row.creator_id)
        .bind(row.updater_id)
        .bind(row.topic)
        .bind(row.channel_type)
        .bind(row.is_visible)
        .bind(row.is_forced)
        .bind(row.status)
        .bind(channel.archived_at)
        .bind(channel.created_at)
        .bind(channel.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::AlreadyExists(channel.name.clone())))?;

        Ok(())
    }

    #[instrument(skip(self, channel), fields(channel_id = %channel.id))]
    async fn update_channel(&mut self, channel: &Channel) -> RepoResult<()> {
        let row = ChannelRow::new(channel);
        let result = sqlx::query(
            r"
            UPDATE channels
            SET name = $2, parent_id = $3, updater_id = $4, topic = $5,
                is_visible = $6, is_forced = $7, updated_at = $8
            WHERE id = $1 AND status = 'active'
            ",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.parent_id)
        .bind(row.updater_id)
        .bind(row.topic)
        .bind(row.is_visible)
        .bind(row.is_forced)
        .bind(channel.updated_at)
        .execute(&mut *self.conn)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::AlreadyExists(channel.name.clone())))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ChannelNotFound(channel.id));
        }

        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn archive_channels(&mut self, ids: &[Snowflake], at: DateTime<Utc>) -> RepoResult<u64> {
        let ids: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
        let result = sqlx::query(
            r"
            UPDATE channels
            SET status = 'archived', archived_at = $2, updated_at = $2
            WHERE id = ANY($1) AND status = 'active'
            ",
        )
        .bind(&ids)
        .bind(at)
        .execute(&mut *self.conn)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, user_ids), fields(count = user_ids.len()))]
    async fn add_private_members(
        &mut self,
        channel_id: Snowflake,
        user_ids: &[Snowflake],
    ) -> RepoResult<()> {
        let user_ids: Vec<i64> = user_ids.iter().map(|id| id.into_inner()).collect();
        sqlx::query(
            r"
            INSERT INTO private_channel_members (channel_id, user_id)
            SELECT $1, user_id FROM UNNEST($2::BIGINT[]) AS user_id
            ON CONFLICT (channel_id, user_id) DO NOTHING
            ",
        )
        .bind(channel_id.into_inner())
        .bind(&user_ids)
        .execute(&mut *self.conn)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let session = *self;
        session.conn.commit().await.map_err(map_db_error)
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        let session = *self;
        session.conn.rollback().await.map_err(map_db_error)
    }
}

async fn select_channel(conn: &mut PgConnection, id: Snowflake) -> RepoResult<Option<Channel>> {
    let sql = format!("SELECT {CHANNEL_COLUMNS} FROM channels c WHERE c.id = $1");
    let result = sqlx::query_as::<_, ChannelModel>(&sql)
        .bind(id.into_inner())
        .fetch_optional(conn)
        .await
        .map_err(map_db_error)?;

    Ok(result.map(Channel::from))
}
