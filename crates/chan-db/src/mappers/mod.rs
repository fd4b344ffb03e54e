//! Entity to model mappers
//!
//! - `From<Model> for Entity`: Convert database rows to domain objects
//! - `ChannelRow`: Prepare entity data for inserts and updates

mod channel;

pub use channel::ChannelRow;
