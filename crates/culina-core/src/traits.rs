//! Repository and backend trait definitions.
//!
//! The worker and launcher depend only on these traits, so a mock backend and
//! an in-memory store can drive them deterministically in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BatchEmbedRequest, BatchEmbedResponse, JobCheckpoint};

/// Persistence for re-embedding job checkpoints.
///
/// One row per job, keyed by `job_id`. `upsert` has insert-or-update
/// semantics: repeated writes for one job replace the row in place with the
/// full snapshot.
#[async_trait]
pub trait CheckpointRepository: Send + Sync {
    /// Insert or fully replace the checkpoint row for `checkpoint.job_id`.
    async fn upsert(&self, checkpoint: &JobCheckpoint) -> Result<()>;

    /// Fetch a checkpoint by job ID.
    async fn get(&self, job_id: &str) -> Result<Option<JobCheckpoint>>;

    /// List the most recently started checkpoints (dashboards).
    async fn list_recent(&self, limit: i64) -> Result<Vec<JobCheckpoint>>;

    /// Count jobs currently in the running state.
    async fn running_count(&self) -> Result<i64>;
}

/// Client contract for the external embedding-computation service.
///
/// The service is a black-box batch processor: it selects the rows for one
/// batch, computes and stores their embeddings, and reports how far the
/// traversal advanced. Implementations must not invent offsets; the response's
/// `next_offset` is the only source of forward progress.
#[async_trait]
pub trait BatchEmbedBackend: Send + Sync {
    /// Process one batch of at most `req.limit` rows starting at `req.offset`.
    async fn process_batch(&self, req: &BatchEmbedRequest) -> Result<BatchEmbedResponse>;

    /// Human-readable identifier of the backend (endpoint URL or "mock"),
    /// used in logs only.
    fn describe(&self) -> String;
}
