//! Domain entities - core business objects

mod channel;

pub use channel::{
    generate_dm_name, Channel, ChannelNode, ChannelStatus, ChannelType, DM_NAME_PREFIX,
};
