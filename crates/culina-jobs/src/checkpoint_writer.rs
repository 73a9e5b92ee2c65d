//! Best-effort checkpoint persistence.
//!
//! Progress *reporting* is best-effort; progress *execution* depends only on
//! the backend's offset contract. A checkpoint store outage therefore must
//! never abort a running job. This wrapper gives the swallowed write errors
//! their own observable channel: a warn-level log line and a failure counter,
//! instead of the worker's control flow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::warn;

use culina_core::{CheckpointRepository, JobCheckpoint};

/// Wraps a checkpoint repository with swallow-and-count write semantics.
pub struct CheckpointWriter {
    store: Arc<dyn CheckpointRepository>,
    failed_writes: AtomicU64,
}

impl CheckpointWriter {
    pub fn new(store: Arc<dyn CheckpointRepository>) -> Self {
        Self {
            store,
            failed_writes: AtomicU64::new(0),
        }
    }

    /// Write the full snapshot. Failures are logged and counted, never
    /// returned.
    pub async fn write(&self, checkpoint: &JobCheckpoint) {
        if let Err(e) = self.store.upsert(checkpoint).await {
            let failed = self.failed_writes.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                subsystem = "jobs",
                component = "checkpoint_writer",
                job_id = %checkpoint.job_id,
                error = %e,
                failed_writes = failed,
                "Checkpoint write failed; progress reporting degraded, job continues"
            );
        }
    }

    /// Number of writes that failed since construction.
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use culina_core::{JobCheckpoint, LaunchParams, TargetTable};
    use culina_db::MemoryCheckpointStore;

    fn checkpoint() -> JobCheckpoint {
        let params = LaunchParams {
            table: TargetTable::Ingredients,
            model: "small".to_string(),
            dimensions: 1536,
            start_offset: 0,
            only_missing: true,
        };
        JobCheckpoint::initial("ingredients-1".to_string(), &params, Utc::now())
    }

    #[tokio::test]
    async fn test_failures_counted_not_returned() {
        let store = Arc::new(MemoryCheckpointStore::new());
        store.fail_next_writes(2);
        let writer = CheckpointWriter::new(store.clone());

        let cp = checkpoint();
        writer.write(&cp).await;
        writer.write(&cp).await;
        writer.write(&cp).await;

        assert_eq!(writer.failed_writes(), 2);
        assert!(store.get("ingredients-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_no_failures_counter_zero() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let writer = CheckpointWriter::new(store);
        writer.write(&checkpoint()).await;
        assert_eq!(writer.failed_writes(), 0);
    }
}
