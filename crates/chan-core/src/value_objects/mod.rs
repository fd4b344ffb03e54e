//! Value objects - immutable types that represent domain concepts

mod channel_name;
mod snowflake;

pub use channel_name::ChannelName;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
