//! Channel database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for channels table
#[derive(Debug, Clone, FromRow)]
pub struct ChannelModel {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub creator_id: i64,
    pub updater_id: i64,
    pub topic: String,
    /// 'public', 'private' or 'dm' (stored as PostgreSQL enum)
    #[sqlx(rename = "type")]
    pub channel_type: String,
    pub is_visible: bool,
    pub is_forced: bool,
    /// 'active' or 'archived' (stored as PostgreSQL enum)
    pub status: String,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChannelModel {
    #[inline]
    pub fn is_archived(&self) -> bool {
        self.status == "archived"
    }
}

/// Narrow row returned by the recursive hierarchy queries
#[derive(Debug, Clone, FromRow)]
pub struct ChannelNodeModel {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    #[sqlx(rename = "type")]
    pub channel_type: String,
    pub status: String,
}
