//! Repository implementations
//!
//! PostgreSQL implementations of the store traits defined in chan-core.

mod channel;
mod error;
mod membership;
mod message;

pub use channel::{PgChannelReader, PgChannelSession, PgChannelStore, PgChannelTx};
pub use error::is_serialization_failure;
pub use membership::PgMembershipRepository;
pub use message::PgMessageLocator;
