//! Deterministic state-machine tests for the re-embedding worker, driven by
//! the scripted mock backend and the in-memory checkpoint store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use culina_core::{CheckpointRepository, JobCheckpoint, JobStatus, LaunchParams, TargetTable};
use culina_db::MemoryCheckpointStore;
use culina_inference::MockBatchBackend;
use culina_jobs::{ReembedWorker, WorkerConfig};

fn zero_delay_config() -> WorkerConfig {
    WorkerConfig::default()
        .with_batch_delay(Duration::ZERO)
        .with_retry_delay(Duration::ZERO)
}

fn recipes_checkpoint(job_id: &str, start_offset: i64) -> JobCheckpoint {
    let params = LaunchParams {
        table: TargetTable::Recipes,
        model: "large".to_string(),
        dimensions: 1024,
        start_offset,
        only_missing: true,
    };
    JobCheckpoint::initial(job_id.to_string(), &params, Utc::now())
}

async fn run_to_end(
    backend: Arc<MockBatchBackend>,
    store: Arc<MemoryCheckpointStore>,
    checkpoint: JobCheckpoint,
) -> JobCheckpoint {
    let worker = ReembedWorker::new(
        backend,
        store,
        zero_delay_config(),
        checkpoint,
        true,
    );
    let (_shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    worker.run(&mut shutdown_rx).await
}

#[tokio::test]
async fn test_250_rows_complete_in_three_batches() {
    let backend = Arc::new(
        MockBatchBackend::new()
            .push_success(100, 100, true, 250)
            .push_success(100, 200, true, 250)
            .push_success(50, 250, false, 250),
    );
    let store = Arc::new(MemoryCheckpointStore::new());

    let final_cp = run_to_end(
        backend.clone(),
        store.clone(),
        recipes_checkpoint("recipes-1", 0),
    )
    .await;

    assert_eq!(final_cp.status, JobStatus::Completed);
    assert_eq!(final_cp.total_processed, 250);
    assert_eq!(final_cp.current_offset, 250);
    assert_eq!(final_cp.percentage, 100.0);
    assert!(final_cp.completed_at.is_some());

    let requests = backend.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests.iter().map(|r| r.offset).collect::<Vec<_>>(),
        vec![0, 100, 200]
    );
    for req in &requests {
        assert_eq!(req.limit, 100);
        assert_eq!(req.table, TargetTable::Recipes);
        assert_eq!(req.model, "large");
        assert_eq!(req.dimensions, 1024);
        assert!(req.only_missing);
    }

    let stored = store.get("recipes-1").await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_offsets_monotonic_across_checkpoint_writes() {
    let backend = Arc::new(
        MockBatchBackend::new()
            .push_success(100, 100, true, 400)
            .push_success(100, 200, true, 400)
            .push_success(100, 300, true, 400)
            .push_success(100, 400, false, 400),
    );
    let store = Arc::new(MemoryCheckpointStore::new());

    run_to_end(backend, store.clone(), recipes_checkpoint("recipes-1", 0)).await;

    let writes = store.write_log();
    assert!(!writes.is_empty());
    for pair in writes.windows(2) {
        assert!(
            pair[1].current_offset >= pair[0].current_offset,
            "offset decreased without a sweep reset: {} -> {}",
            pair[0].current_offset,
            pair[1].current_offset
        );
    }
}

#[tokio::test]
async fn test_retry_convergence_same_offset() {
    // Three failures at offset 0, then the batch goes through. The worker
    // must issue exactly N+1 requests at that offset and advance once.
    let backend = Arc::new(
        MockBatchBackend::new()
            .push_error("503 Service Unavailable")
            .push_error("503 Service Unavailable")
            .push_error("503 Service Unavailable")
            .push_success(100, 100, true, 250)
            .push_success(100, 200, true, 250)
            .push_success(50, 250, false, 250),
    );
    let store = Arc::new(MemoryCheckpointStore::new());

    let final_cp = run_to_end(
        backend.clone(),
        store.clone(),
        recipes_checkpoint("recipes-1", 0),
    )
    .await;

    let offsets: Vec<i64> = backend.requests().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 0, 0, 0, 100, 200]);
    assert_eq!(final_cp.status, JobStatus::Completed);
    assert_eq!(final_cp.total_processed, 250);

    // Failures annotate the running job; the next success clears them.
    let writes = store.write_log();
    assert_eq!(writes.len(), 6);
    for failed_write in &writes[0..3] {
        assert_eq!(failed_write.status, JobStatus::Running);
        assert!(failed_write
            .error_message
            .as_deref()
            .unwrap()
            .contains("503"));
        assert_eq!(failed_write.current_offset, 0);
    }
    assert!(writes[3].error_message.is_none());
}

#[tokio::test]
async fn test_network_errors_retried_like_any_other() {
    let backend = Arc::new(
        MockBatchBackend::new()
            .push_network_error("connection refused")
            .push_success(10, 10, false, 10),
    );
    let store = Arc::new(MemoryCheckpointStore::new());

    let final_cp = run_to_end(
        backend.clone(),
        store,
        recipes_checkpoint("recipes-1", 0),
    )
    .await;

    assert_eq!(final_cp.status, JobStatus::Completed);
    let offsets: Vec<i64> = backend.requests().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 0]);
}

#[tokio::test]
async fn test_only_missing_sweep_resets_to_zero() {
    // The second batch reports nextOffset=0 with hasMore=true: new rows lost
    // their embeddings mid-pass, so the traversal starts over.
    let backend = Arc::new(
        MockBatchBackend::new()
            .push_success(100, 100, true, 250)
            .push_success(40, 0, true, 260)
            .push_success(100, 100, true, 260)
            .push_success(160, 260, false, 260),
    );
    let store = Arc::new(MemoryCheckpointStore::new());

    let final_cp = run_to_end(
        backend.clone(),
        store.clone(),
        recipes_checkpoint("recipes-1", 0),
    )
    .await;

    let offsets: Vec<i64> = backend.requests().iter().map(|r| r.offset).collect();
    assert_eq!(offsets, vec![0, 100, 0, 100]);
    assert_eq!(final_cp.status, JobStatus::Completed);
    assert_eq!(final_cp.current_offset, 260);

    // The only offset decrease in the write log is the sanctioned reset.
    let writes = store.write_log();
    let decreases: Vec<(i64, i64)> = writes
        .windows(2)
        .filter(|pair| pair[1].current_offset < pair[0].current_offset)
        .map(|pair| (pair[0].current_offset, pair[1].current_offset))
        .collect();
    assert_eq!(decreases, vec![(100, 0)]);
}

#[tokio::test]
async fn test_completion_contract() {
    let backend = Arc::new(MockBatchBackend::new().push_success(10, 10, false, 10));
    let store = Arc::new(MemoryCheckpointStore::new());

    run_to_end(backend, store.clone(), recipes_checkpoint("recipes-1", 0)).await;

    let writes = store.write_log();
    let last = writes.last().unwrap();
    assert_eq!(last.status, JobStatus::Completed);
    assert_eq!(last.percentage, 100.0);
    assert!(last.completed_at.is_some());
}

#[tokio::test]
async fn test_checkpoint_outage_does_not_abort_job() {
    let backend = Arc::new(
        MockBatchBackend::new()
            .push_success(100, 100, true, 250)
            .push_success(100, 200, true, 250)
            .push_success(50, 250, false, 250),
    );
    let store = Arc::new(MemoryCheckpointStore::new());
    store.fail_next_writes(2);

    let final_cp = run_to_end(
        backend.clone(),
        store.clone(),
        recipes_checkpoint("recipes-1", 0),
    )
    .await;

    // Execution depends on the backend's offset contract, not on the store:
    // all three batches ran and the job completed even though the first two
    // snapshot writes were lost.
    assert_eq!(final_cp.status, JobStatus::Completed);
    assert_eq!(backend.request_count(), 3);
    assert_eq!(store.write_count(), 1);
    let stored = store.get("recipes-1").await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_resume_from_persisted_offset() {
    // Relaunch at the last persisted current_offset of a prior run: no rows
    // before that offset are touched again.
    let backend = Arc::new(MockBatchBackend::new().push_success(50, 250, false, 250));
    let store = Arc::new(MemoryCheckpointStore::new());

    let final_cp = run_to_end(
        backend.clone(),
        store,
        recipes_checkpoint("recipes-resume", 200),
    )
    .await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].offset, 200);
    assert_eq!(final_cp.status, JobStatus::Completed);
    assert_eq!(final_cp.total_processed, 50);
    assert_eq!(final_cp.percentage, 100.0);
    assert_eq!(final_cp.start_offset, 200);
}

#[tokio::test]
async fn test_error_message_truncated_in_checkpoint() {
    let long_error = "x".repeat(2000);
    let backend = Arc::new(
        MockBatchBackend::new()
            .push_error(long_error)
            .push_success(5, 5, false, 5),
    );
    let store = Arc::new(MemoryCheckpointStore::new());

    run_to_end(backend, store.clone(), recipes_checkpoint("recipes-1", 0)).await;

    let writes = store.write_log();
    let message = writes[0].error_message.as_deref().unwrap();
    assert_eq!(
        message.chars().count(),
        culina_core::defaults::ERROR_MESSAGE_MAX
    );
}

#[tokio::test]
async fn test_shutdown_stops_between_batches() {
    let mut backend = MockBatchBackend::new();
    for i in 0..200 {
        backend = backend.push_success(10, (i + 1) * 10, true, 10_000);
    }
    let backend = Arc::new(backend);
    let store = Arc::new(MemoryCheckpointStore::new());

    let config = WorkerConfig::default()
        .with_batch_delay(Duration::from_millis(20))
        .with_retry_delay(Duration::from_millis(20));
    let worker = ReembedWorker::new(
        backend.clone(),
        store.clone(),
        config,
        recipes_checkpoint("recipes-stop", 0),
        true,
    );
    let handle = worker.start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.shutdown().await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !handle.is_finished() {
        assert!(tokio::time::Instant::now() < deadline, "worker did not stop");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // A stopped job is not completed; it can be resumed from its last
    // persisted offset.
    let stored = store.get("recipes-stop").await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Running);
    assert!(stored.current_offset > 0);
    assert!(backend.request_count() < 200);
}
