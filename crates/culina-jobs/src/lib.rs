//! # culina-jobs
//!
//! Resumable batch re-embedding jobs for the culina catalog tables.
//!
//! This crate provides:
//! - The batch runner (`ReembedWorker`): a sequential RUNNING → COMPLETED
//!   state machine that survives downstream failures indefinitely
//! - The retry policy: fixed-delay, retry-everything, with failure
//!   classification for operator-facing logs
//! - Best-effort checkpoint persistence that never aborts a running job
//! - The job launcher: validation, job-id minting, initial checkpoint,
//!   detached worker start
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use culina_jobs::{JobLauncher, WorkerConfig};
//! use culina_db::PgCheckpointStore;
//! use culina_inference::HttpEmbedBackend;
//! use culina_core::{LaunchParams, TargetTable};
//!
//! let launcher = JobLauncher::new(
//!     Arc::new(HttpEmbedBackend::from_env()),
//!     Arc::new(PgCheckpointStore::new(pool)),
//!     WorkerConfig::from_env(),
//! );
//!
//! // Fire-and-forget: returns the job id, work continues detached.
//! let job_id = launcher.launch(LaunchParams {
//!     table: TargetTable::Recipes,
//!     model: "large".to_string(),
//!     dimensions: 1024,
//!     start_offset: 0,
//!     only_missing: true,
//! }).await?;
//!
//! // Progress is visible by polling the checkpoint store under `job_id`.
//! ```

pub mod checkpoint_writer;
pub mod launcher;
pub mod retry;
pub mod worker;

// Re-export core types
pub use culina_core::*;

pub use checkpoint_writer::CheckpointWriter;
pub use launcher::JobLauncher;
pub use retry::{classify, truncate_error, ErrorClass, RETRYABLE_PATTERNS};
pub use worker::{JobHandle, ReembedWorker, RunState, WorkerConfig};
