//! # chan-db
//!
//! Persistence layer implementing the chan-core store traits.
//!
//! ## Overview
//!
//! - Connection pool management and migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity <-> model mappers
//! - PostgreSQL stores (SERIALIZABLE transactions, recursive CTEs)
//! - An in-memory store with the same transactional contract
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chan_db::{create_pool, run_migrations, DatabaseConfig, PgChannelStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool, "./crates/chan-db/migrations").await?;
//!     let store = PgChannelStore::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::MemoryChannelStore;
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgChannelStore, PgMembershipRepository, PgMessageLocator};
