//! Resumable batch re-embedding worker.
//!
//! One worker owns one job. The loop is strictly sequential: request one
//! batch at `current_offset`, persist the updated snapshot, pause, repeat.
//! The downstream service owns offset computation — the worker only ever
//! advances to the `next_offset` it is handed back, so repeating a request at
//! the same offset after a failure is always safe.
//!
//! Failures never terminate the loop. They are logged with a classification,
//! written into the checkpoint's `error_message` while the job stays
//! `running`, and retried at the same offset after a fixed delay, for as long
//! as it takes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use culina_core::{
    defaults, BatchEmbedBackend, BatchEmbedRequest, BatchEmbedResponse, CheckpointRepository,
    Error, JobCheckpoint, Result,
};

use crate::checkpoint_writer::CheckpointWriter;
use crate::retry::{classify, truncate_error};

/// Configuration for the re-embedding worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum rows requested per batch.
    pub batch_limit: i64,
    /// Pause between successful batches (the only downstream throttle).
    pub batch_delay: Duration,
    /// Pause before retrying a failed batch. Fixed, never grows.
    pub retry_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_limit: defaults::BATCH_LIMIT,
            batch_delay: Duration::from_millis(defaults::BATCH_DELAY_MS),
            retry_delay: Duration::from_millis(defaults::RETRY_DELAY_MS),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CULINA_BATCH_LIMIT` | `100` | Max rows per batch |
    /// | `CULINA_BATCH_DELAY_MS` | `500` | Pause between batches |
    /// | `CULINA_RETRY_DELAY_MS` | `5000` | Pause before a retry |
    pub fn from_env() -> Self {
        let batch_limit = std::env::var("CULINA_BATCH_LIMIT")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(defaults::BATCH_LIMIT)
            .max(1);

        let batch_delay_ms = std::env::var("CULINA_BATCH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::BATCH_DELAY_MS);

        let retry_delay_ms = std::env::var("CULINA_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::RETRY_DELAY_MS);

        Self {
            batch_limit,
            batch_delay: Duration::from_millis(batch_delay_ms),
            retry_delay: Duration::from_millis(retry_delay_ms),
        }
    }

    /// Set the per-batch row limit.
    pub fn with_batch_limit(mut self, limit: i64) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Set the pause between successful batches.
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Set the pause before retrying a failed batch.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Worker loop state. There is deliberately no failed state: failures are
/// annotations on a running job, not a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Completed,
}

/// Handle for a launched job's worker task.
pub struct JobHandle {
    job_id: String,
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<JobCheckpoint>,
}

impl JobHandle {
    /// The job this handle controls.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Signal the worker to stop between suspension points.
    ///
    /// Process-local and operator-only; there is no cancel operation in the
    /// external API. A stopped job stays `running` in the checkpoint store
    /// and can be resumed by relaunching from its last `current_offset`.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))
    }

    /// Whether the worker task has finished.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Worker that drives one re-embedding job to completion.
pub struct ReembedWorker {
    backend: Arc<dyn BatchEmbedBackend>,
    checkpoints: CheckpointWriter,
    config: WorkerConfig,
    checkpoint: JobCheckpoint,
    only_missing: bool,
    /// Consecutive failures at the current offset. Lives only in memory, only
    /// feeds log messages, and never ends the loop.
    retries: u32,
}

impl ReembedWorker {
    pub fn new(
        backend: Arc<dyn BatchEmbedBackend>,
        store: Arc<dyn CheckpointRepository>,
        config: WorkerConfig,
        checkpoint: JobCheckpoint,
        only_missing: bool,
    ) -> Self {
        Self {
            backend,
            checkpoints: CheckpointWriter::new(store),
            config,
            checkpoint,
            only_missing,
            retries: 0,
        }
    }

    /// Spawn the worker as a detached task and return its control handle.
    ///
    /// The task's lifetime is independent of the caller: the launching
    /// request finishing or timing out does not touch in-flight work.
    pub fn start(self) -> JobHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let job_id = self.checkpoint.job_id.clone();

        let join = tokio::spawn(async move { self.run(&mut shutdown_rx).await });

        JobHandle {
            job_id,
            shutdown_tx,
            join,
        }
    }

    /// Drive the job until the dataset is exhausted (or shutdown is
    /// signaled). Never returns an error: every runtime failure is handled
    /// inside the loop, because an exception escaping it would silently halt
    /// progress on an unattended job.
    #[instrument(
        skip(self, shutdown_rx),
        fields(
            subsystem = "jobs",
            component = "worker",
            op = "run",
            job_id = %self.checkpoint.job_id,
            db_table = %self.checkpoint.table_name,
            model = %self.checkpoint.model,
        )
    )]
    pub async fn run(mut self, shutdown_rx: &mut mpsc::Receiver<()>) -> JobCheckpoint {
        info!(
            offset = self.checkpoint.current_offset,
            batch_limit = self.config.batch_limit,
            only_missing = self.only_missing,
            backend = %self.backend.describe(),
            "Re-embedding worker started"
        );

        let mut state = RunState::Running;
        while state == RunState::Running {
            if shutdown_rx.try_recv().is_ok() {
                info!("Re-embedding worker received shutdown signal");
                break;
            }

            let request = BatchEmbedRequest {
                table: self.checkpoint.table_name,
                offset: self.checkpoint.current_offset,
                limit: self.config.batch_limit,
                model: self.checkpoint.model.clone(),
                dimensions: self.checkpoint.dimensions,
                only_missing: self.only_missing,
            };

            match self.backend.process_batch(&request).await {
                Ok(response) => {
                    state = self.apply_batch(request.offset, response).await;
                    if state == RunState::Running
                        && !pause(self.config.batch_delay, shutdown_rx).await
                    {
                        info!("Re-embedding worker received shutdown signal");
                        break;
                    }
                }
                Err(e) => {
                    self.record_failure(request.offset, &e).await;
                    if !pause(self.config.retry_delay, shutdown_rx).await {
                        info!("Re-embedding worker received shutdown signal");
                        break;
                    }
                }
            }
        }

        self.checkpoint
    }

    /// Fold one successful batch into the checkpoint and persist the
    /// snapshot. Returns the next loop state.
    async fn apply_batch(&mut self, offset: i64, response: BatchEmbedResponse) -> RunState {
        self.retries = 0;
        self.checkpoint.error_message = None;
        self.checkpoint.total_processed += response.processed;
        self.checkpoint.total_count = response.total_count;

        if !response.has_more {
            self.checkpoint.current_offset = response.next_offset;
            self.checkpoint.mark_completed(Utc::now());
            self.checkpoints.write(&self.checkpoint).await;
            info!(
                total_processed = self.checkpoint.total_processed,
                total_count = self.checkpoint.total_count,
                elapsed_minutes = self.checkpoint.elapsed_minutes,
                "Re-embedding job completed"
            );
            return RunState::Completed;
        }

        if response.is_sweep_reset() {
            // Only-missing mode: rows gained null embeddings since the pass
            // began, so the traversal restarts from 0. The one sanctioned
            // non-monotonic offset transition.
            info!(
                previous_offset = offset,
                "More rows still missing embeddings, sweeping again from offset 0"
            );
            self.checkpoint.current_offset = 0;
        } else {
            self.checkpoint.current_offset = response.next_offset;
        }

        self.checkpoint.refresh_derived(Utc::now());
        self.checkpoints.write(&self.checkpoint).await;
        debug!(
            offset = self.checkpoint.current_offset,
            processed = response.processed,
            percentage = self.checkpoint.percentage,
            "Batch applied"
        );
        RunState::Running
    }

    /// Record a failed batch: log with classification, annotate the
    /// still-running checkpoint. The offset is not touched — the same batch
    /// is retried.
    async fn record_failure(&mut self, offset: i64, error: &Error) {
        self.retries += 1;
        let class = classify(error);
        let message = error.to_string();
        warn!(
            offset,
            retry = self.retries,
            class = class.as_str(),
            error = %message,
            "Batch failed, retrying at the same offset"
        );

        self.checkpoint.error_message = Some(truncate_error(&message));
        self.checkpoint.refresh_derived(Utc::now());
        self.checkpoints.write(&self.checkpoint).await;
    }
}

/// Sleep, unless shutdown arrives first. Returns false on shutdown.
async fn pause(delay: Duration, shutdown_rx: &mut mpsc::Receiver<()>) -> bool {
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        _ = shutdown_rx.recv() => false,
        _ = sleep(delay) => true,
    }
}
