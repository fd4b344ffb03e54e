//! Channel events published after commit

mod domain_event;

pub use domain_event::{
    ChannelArchivedEvent, ChannelCreatedEvent, ChannelEvent, ChannelRenamedEvent,
    ChannelReparentedEvent, ChannelUpdatedEvent,
};
