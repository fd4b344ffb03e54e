//! In-process channel store
//!
//! Same contract as the PostgreSQL store; used by tests and single-node
//! deployments that do not need durability.

mod state;
mod store;

pub use store::{MemoryChannelStore, MemorySession};
