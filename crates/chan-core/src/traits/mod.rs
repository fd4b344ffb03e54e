//! Ports implemented by the infrastructure crates

mod events;
mod repositories;

pub use events::{ChannelEventSink, NoopEventSink};
pub use repositories::{
    ChannelReader, ChannelStore, ChannelTransaction, MembershipRepository, MessageLocator,
    RepoResult,
};
