//! # culina-core
//!
//! Core types, traits, and abstractions for the culina re-embedding service.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other culina crates depend on: the job checkpoint model, the
//! embedding-service wire contract, the error taxonomy, shared defaults, and
//! the structured logging schema.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    percentage_for, BatchEmbedRequest, BatchEmbedResponse, JobCheckpoint, JobStatus, LaunchParams,
    TargetTable,
};
pub use traits::{BatchEmbedBackend, CheckpointRepository};
