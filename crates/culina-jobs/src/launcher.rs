//! Job launcher: validation, job-id minting, initial checkpoint, detached
//! worker start.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use culina_core::{
    BatchEmbedBackend, CheckpointRepository, Error, JobCheckpoint, LaunchParams, Result,
    TargetTable,
};
use culina_inference::EmbeddingModelRegistry;

use crate::worker::{JobHandle, ReembedWorker, WorkerConfig};

/// Last minted job-id timestamp, clamped forward so that rapid repeated
/// launches never collide even within one nanosecond tick.
static LAST_JOB_NANOS: AtomicI64 = AtomicI64::new(0);

/// Mint a job ID from the target table and a monotonic high-resolution
/// timestamp, e.g. `recipes-1759912345123456789`.
fn mint_job_id(table: TargetTable) -> String {
    let now = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros().saturating_mul(1000));

    let prev = LAST_JOB_NANOS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now - 1);
    let nanos = now.max(prev + 1);

    format!("{}-{}", table.as_str(), nanos)
}

/// Launches re-embedding jobs and keeps handles to their worker tasks.
///
/// `launch` is fire-and-forget: it validates, persists the initial
/// checkpoint, starts the worker detached from the calling context, and
/// returns the job id without waiting for any batch. All status visibility
/// afterwards is via the checkpoint store.
pub struct JobLauncher {
    backend: Arc<dyn BatchEmbedBackend>,
    store: Arc<dyn CheckpointRepository>,
    config: WorkerConfig,
    registry: EmbeddingModelRegistry,
    handles: RwLock<HashMap<String, JobHandle>>,
}

impl JobLauncher {
    pub fn new(
        backend: Arc<dyn BatchEmbedBackend>,
        store: Arc<dyn CheckpointRepository>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
            registry: EmbeddingModelRegistry::new(),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Reject bad parameters before any side effect. A rejected launch leaves
    /// no checkpoint row behind.
    fn validate(&self, params: &LaunchParams) -> Result<()> {
        if params.start_offset < 0 {
            return Err(Error::Validation(format!(
                "startOffset must be >= 0, got {}",
                params.start_offset
            )));
        }

        let profile = self.registry.get(&params.model).ok_or_else(|| {
            Error::Validation(format!(
                "unknown model '{}' (expected one of: {})",
                params.model,
                self.registry.model_names().join(", ")
            ))
        })?;

        if !profile.supports_dimensions(params.dimensions) {
            return Err(Error::Validation(format!(
                "dimensions {} not valid for model '{}' (valid: {:?})",
                params.dimensions, params.model, profile.valid_dimensions
            )));
        }

        Ok(())
    }

    /// Validate, persist the initial checkpoint, start the worker, return the
    /// job id. The checkpoint row exists before this returns, so a job record
    /// is queryable even if the worker never produces a single batch.
    #[instrument(
        skip(self, params),
        fields(
            subsystem = "jobs",
            component = "launcher",
            op = "launch",
            db_table = %params.table,
            model = %params.model,
        )
    )]
    pub async fn launch(&self, params: LaunchParams) -> Result<String> {
        self.validate(&params)?;

        let job_id = mint_job_id(params.table);
        let mut checkpoint = JobCheckpoint::initial(job_id.clone(), &params, Utc::now());
        checkpoint.metadata = Some(serde_json::json!({
            "only_missing": params.only_missing,
        }));

        // The one checkpoint write that propagates: without the initial row
        // the job would be invisible to every dashboard.
        self.store.upsert(&checkpoint).await?;

        let worker = ReembedWorker::new(
            self.backend.clone(),
            self.store.clone(),
            self.config.clone(),
            checkpoint,
            params.only_missing,
        );
        let handle = worker.start();
        self.handles.write().await.insert(job_id.clone(), handle);

        info!(
            job_id = %job_id,
            dimensions = params.dimensions,
            start_offset = params.start_offset,
            only_missing = params.only_missing,
            "Re-embedding job launched"
        );
        Ok(job_id)
    }

    /// Signal a job's worker to stop (operator-only, process-local).
    /// Returns false if the job is not tracked by this launcher.
    pub async fn stop(&self, job_id: &str) -> bool {
        let handles = self.handles.read().await;
        match handles.get(job_id) {
            Some(handle) => handle.shutdown().await.is_ok(),
            None => false,
        }
    }

    /// Job ids with a worker task still alive in this process.
    pub async fn active_jobs(&self) -> Vec<String> {
        self.handles
            .read()
            .await
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(job_id, _)| job_id.clone())
            .collect()
    }
}
