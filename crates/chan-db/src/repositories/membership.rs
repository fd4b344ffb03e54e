//! PostgreSQL implementation of MembershipRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use chan_core::entities::Channel;
use chan_core::traits::{MembershipRepository, RepoResult};
use chan_core::value_objects::Snowflake;

use crate::models::ChannelModel;

use super::channel::CHANNEL_COLUMNS;
use super::error::map_db_error;

/// PostgreSQL implementation of MembershipRepository
#[derive(Clone)]
pub struct PgMembershipRepository {
    pool: PgPool,
}

impl PgMembershipRepository {
    /// Create a new PgMembershipRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PgMembershipRepository {
    #[instrument(skip(self))]
    async fn subscribe(&self, user_id: Snowflake, channel_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO user_subscribe_channels (user_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, channel_id) DO NOTHING
            ",
        )
        .bind(user_id.into_inner())
        .bind(channel_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn unsubscribe(&self, user_id: Snowflake, channel_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM user_subscribe_channels
            WHERE user_id = $1 AND channel_id = $2
            ",
        )
        .bind(user_id.into_inner())
        .bind(channel_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn subscriber_ids(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r"
            SELECT s.user_id
            FROM user_subscribe_channels s
            JOIN channels c ON c.id = s.channel_id
            WHERE s.channel_id = $1 AND c.status = 'active'
            ORDER BY s.user_id
            ",
        )
        .bind(channel_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn subscribed_channel_ids(&self, user_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r"
            SELECT s.channel_id
            FROM user_subscribe_channels s
            JOIN channels c ON c.id = s.channel_id
            WHERE s.user_id = $1 AND c.status = 'active'
            ORDER BY s.channel_id
            ",
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn private_member_ids(&self, channel_id: Snowflake) -> RepoResult<Vec<Snowflake>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r"
            SELECT m.user_id
            FROM private_channel_members m
            JOIN channels c ON c.id = m.channel_id
            WHERE m.channel_id = $1 AND c.status = 'active' AND c.type <> 'public'
            ORDER BY m.user_id
            ",
        )
        .bind(channel_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(ids.into_iter().map(Snowflake::new).collect())
    }

    #[instrument(skip(self))]
    async fn is_private_member(
        &self,
        channel_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM private_channel_members m
                JOIN channels c ON c.id = m.channel_id
                WHERE m.channel_id = $1 AND m.user_id = $2 AND c.status = 'active'
            )
            ",
        )
        .bind(channel_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    #[instrument(skip(self))]
    async fn accessible_channels(&self, user_id: Snowflake) -> RepoResult<Vec<Channel>> {
        let sql = format!(
            r"
            SELECT {CHANNEL_COLUMNS}
            FROM channels c
            WHERE c.status = 'active'
              AND (
                c.type = 'public'
                OR EXISTS (
                    SELECT 1 FROM private_channel_members m
                    WHERE m.channel_id = c.id AND m.user_id = $1
                )
              )
            ORDER BY c.id
            "
        );
        let results = sqlx::query_as::<_, ChannelModel>(&sql)
            .bind(user_id.into_inner())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(results.into_iter().map(Channel::from).collect())
    }
}
