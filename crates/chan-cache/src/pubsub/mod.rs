//! Redis Pub/Sub module.

mod channels;
mod publisher;
mod sink;

pub use channels::{PubSubChannel, BROADCAST_CHANNEL, CHANNEL_PREFIX};
pub use publisher::{EventTarget, PubSubEvent, Publisher};
pub use sink::RedisEventSink;
