//! # chan-service
//!
//! Application layer: the channel hierarchy engine and the facade callers use.
//!
//! ```ignore
//! use chan_db::MemoryChannelStore;
//! use chan_service::{ChannelFacade, ServiceContext};
//!
//! let ctx = ServiceContext::builder().memory_store(MemoryChannelStore::new()).build()?;
//! let facade = ChannelFacade::new(ctx);
//! let general = facade.create_public_channel("general", None, user_id).await?;
//! ```

pub mod dto;
pub mod services;

pub use dto::CreateChannelRequest;
pub use services::{
    ChannelFacade, ChannelLifecycleManager, HierarchyResolver, MembershipManager, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, TransactionConfig,
};
