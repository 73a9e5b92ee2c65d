//! # culina-db
//!
//! PostgreSQL persistence layer for the culina re-embedding service.
//!
//! This crate provides:
//! - Connection pool management
//! - The checkpoint repository (one upserted row per job)
//! - An in-memory store for tests and local development
//!
//! ## Example
//!
//! ```rust,ignore
//! use culina_db::{create_pool, ensure_schema, PgCheckpointStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool("postgres://localhost/culina").await?;
//!     ensure_schema(&pool).await?;
//!     let checkpoints = PgCheckpointStore::new(pool);
//!     let job = checkpoints.get("recipes-1759912345000000000").await?;
//!     println!("{:?}", job);
//!     Ok(())
//! }
//! ```

pub mod checkpoints;
pub mod memory;
pub mod pool;

// Re-export core types
pub use culina_core::*;

pub use checkpoints::{ensure_schema, PgCheckpointStore};
pub use memory::MemoryCheckpointStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
