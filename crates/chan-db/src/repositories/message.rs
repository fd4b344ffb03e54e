//! PostgreSQL implementation of MessageLocator

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use chan_core::traits::{MessageLocator, RepoResult};
use chan_core::value_objects::Snowflake;

use super::error::map_db_error;

/// Reads the container channel from the message store's `messages` table
#[derive(Clone)]
pub struct PgMessageLocator {
    pool: PgPool,
}

impl PgMessageLocator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageLocator for PgMessageLocator {
    #[instrument(skip(self))]
    async fn channel_id_of(&self, message_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        let channel_id =
            sqlx::query_scalar::<_, i64>("SELECT channel_id FROM messages WHERE id = $1")
                .bind(message_id.into_inner())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(channel_id.map(Snowflake::new))
    }
}
