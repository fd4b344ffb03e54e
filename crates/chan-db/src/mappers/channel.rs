//! Channel entity <-> model mapper

use chan_core::entities::{Channel, ChannelNode, ChannelStatus, ChannelType};
use chan_core::value_objects::Snowflake;

use crate::models::{ChannelModel, ChannelNodeModel};

/// Convert database channel type string to ChannelType enum
fn parse_channel_type(type_str: &str) -> ChannelType {
    match type_str {
        "private" => ChannelType::Private,
        "dm" => ChannelType::Dm,
        _ => ChannelType::Public,
    }
}

/// Convert database status string to ChannelStatus enum
fn parse_channel_status(status: &str) -> ChannelStatus {
    match status {
        "archived" => ChannelStatus::Archived,
        _ => ChannelStatus::Active,
    }
}

/// Convert ChannelModel to Channel entity
impl From<ChannelModel> for Channel {
    fn from(model: ChannelModel) -> Self {
        Channel {
            id: Snowflake::new(model.id),
            name: model.name,
            parent_id: model.parent_id.map(Snowflake::new),
            creator_id: Snowflake::new(model.creator_id),
            updater_id: Snowflake::new(model.updater_id),
            topic: model.topic,
            channel_type: parse_channel_type(&model.channel_type),
            is_visible: model.is_visible,
            is_forced: model.is_forced,
            status: parse_channel_status(&model.status),
            archived_at: model.archived_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<ChannelNodeModel> for ChannelNode {
    fn from(model: ChannelNodeModel) -> Self {
        ChannelNode {
            id: Snowflake::new(model.id),
            parent_id: model.parent_id.map(Snowflake::new),
            name: model.name,
            channel_type: parse_channel_type(&model.channel_type),
            status: parse_channel_status(&model.status),
        }
    }
}

/// Channel entity flattened to bind values
pub struct ChannelRow<'a> {
    pub id: i64,
    pub name: &'a str,
    pub parent_id: Option<i64>,
    pub creator_id: i64,
    pub updater_id: i64,
    pub topic: &'a str,
    pub channel_type: &'static str,
    pub is_visible: bool,
    pub is_forced: bool,
    pub status: &'static str,
}

impl<'a> ChannelRow<'a> {
    pub fn new(channel: &'a Channel) -> Self {
        Self {
            id: channel.id.into_inner(),
            name: &channel.name,
            parent_id: channel.parent_id.map(Snowflake::into_inner),
            creator_id: channel.creator_id.into_inner(),
            updater_id: channel.updater_id.into_inner(),
            topic: &channel.topic,
            channel_type: channel.channel_type.as_str(),
            is_visible: channel.is_visible,
            is_forced: channel.is_forced,
            status: channel.status.as_str(),
        }
    }
}
