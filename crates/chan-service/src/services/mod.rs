//! Channel hierarchy services
//!
//! The resolver answers tree queries, the lifecycle manager performs every
//! structural mutation, the membership manager owns the member and
//! subscription overlays, and the facade composes them for callers.

pub mod context;
pub mod error;
pub mod facade;
pub mod hierarchy;
pub mod lifecycle;
pub mod membership;
pub mod transaction;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use facade::ChannelFacade;
pub use hierarchy::HierarchyResolver;
pub use lifecycle::ChannelLifecycleManager;
pub use membership::MembershipManager;
pub use transaction::TransactionConfig;
