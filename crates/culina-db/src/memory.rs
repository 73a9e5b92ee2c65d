//! In-memory checkpoint store.
//!
//! Used by worker and API tests, and usable for local development without a
//! database. Always compiled so integration tests in dependent crates can use
//! it.
//!
//! Beyond the repository contract it records every write in order (so tests
//! can assert offset monotonicity across checkpoint writes) and supports
//! injecting write failures (so tests can verify that a checkpoint outage
//! never aborts a running job).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use culina_core::{CheckpointRepository, Error, JobCheckpoint, JobStatus, Result};

/// In-memory implementation of CheckpointRepository.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    rows: Mutex<HashMap<String, JobCheckpoint>>,
    writes: Mutex<Vec<JobCheckpoint>>,
    fail_next: AtomicUsize,
}

impl MemoryCheckpointStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` upserts fail with an internal error.
    pub fn fail_next_writes(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// All successful writes, in order.
    pub fn write_log(&self) -> Vec<JobCheckpoint> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// Number of stored rows.
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckpointRepository for MemoryCheckpointStore {
    async fn upsert(&self, checkpoint: &JobCheckpoint) -> Result<()> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Internal("injected checkpoint write failure".into()));
        }

        self.rows
            .lock()
            .unwrap()
            .insert(checkpoint.job_id.clone(), checkpoint.clone());
        self.writes.lock().unwrap().push(checkpoint.clone());
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobCheckpoint>> {
        Ok(self.rows.lock().unwrap().get(job_id).cloned())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<JobCheckpoint>> {
        let mut all: Vec<JobCheckpoint> = self.rows.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }

    async fn running_count(&self) -> Result<i64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.status == JobStatus::Running)
            .count() as i64)
    }
}
