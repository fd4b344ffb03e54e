//! # chan-core
//!
//! Domain layer containing the channel entity, value objects, hierarchy rules,
//! store traits, and channel events.
//! This crate has zero dependencies on infrastructure (database, cache, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{Channel, ChannelNode, ChannelStatus, ChannelType};
pub use error::{DomainError, ErrorKind};
pub use events::ChannelEvent;
pub use hierarchy::{verify_forest, ForestViolation, Lineage, Subtree, MAX_DEPTH};
pub use traits::{
    ChannelEventSink, ChannelReader, ChannelStore, ChannelTransaction, MembershipRepository,
    MessageLocator, NoopEventSink, RepoResult,
};
pub use value_objects::{ChannelName, Snowflake, SnowflakeGenerator, SnowflakeParseError};
