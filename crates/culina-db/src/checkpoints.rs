//! Checkpoint repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use culina_core::{
    CheckpointRepository, Error, JobCheckpoint, JobStatus, Result, TargetTable,
};

/// DDL for the checkpoint table. Applied idempotently at startup.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reembed_checkpoint (
    job_id          TEXT PRIMARY KEY,
    status          TEXT NOT NULL,
    table_name      TEXT NOT NULL,
    model           TEXT NOT NULL,
    dimensions      INTEGER NOT NULL,
    start_offset    BIGINT NOT NULL,
    current_offset  BIGINT NOT NULL,
    total_processed BIGINT NOT NULL,
    total_count     BIGINT NOT NULL,
    percentage      DOUBLE PRECISION NOT NULL,
    start_time      TIMESTAMPTZ NOT NULL,
    elapsed_minutes DOUBLE PRECISION NOT NULL,
    completed_at    TIMESTAMPTZ,
    error_message   TEXT,
    metadata        JSONB
);
CREATE INDEX IF NOT EXISTS reembed_checkpoint_status_idx
    ON reembed_checkpoint (status);
CREATE INDEX IF NOT EXISTS reembed_checkpoint_start_time_idx
    ON reembed_checkpoint (start_time DESC);
";

/// Create the checkpoint table and indexes if they do not exist.
pub async fn ensure_schema(pool: &Pool<Postgres>) -> Result<()> {
    for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }
    Ok(())
}

/// PostgreSQL implementation of CheckpointRepository.
///
/// One upsert per checkpoint write: the full snapshot replaces the row in
/// place, so the stored record is always self-consistent regardless of how
/// many iterations the job has run.
pub struct PgCheckpointStore {
    pool: Pool<Postgres>,
}

impl PgCheckpointStore {
    /// Create a new PgCheckpointStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a checkpoint row into a JobCheckpoint.
    fn parse_row(row: sqlx::postgres::PgRow) -> Result<JobCheckpoint> {
        let status: String = row.get("status");
        let table_name: String = row.get("table_name");
        Ok(JobCheckpoint {
            job_id: row.get("job_id"),
            status: JobStatus::parse(&status)
                .map_err(|_| Error::Internal(format!("corrupt status '{}' in checkpoint", status)))?,
            table_name: TargetTable::parse(&table_name).map_err(|_| {
                Error::Internal(format!("corrupt table_name '{}' in checkpoint", table_name))
            })?,
            model: row.get("model"),
            dimensions: row.get("dimensions"),
            start_offset: row.get("start_offset"),
            current_offset: row.get("current_offset"),
            total_processed: row.get("total_processed"),
            total_count: row.get("total_count"),
            percentage: row.get("percentage"),
            start_time: row.get("start_time"),
            elapsed_minutes: row.get("elapsed_minutes"),
            completed_at: row.get("completed_at"),
            error_message: row.get("error_message"),
            metadata: row.get("metadata"),
        })
    }
}

const SELECT_COLUMNS: &str = "job_id, status, table_name, model, dimensions, start_offset, \
     current_offset, total_processed, total_count, percentage, start_time, \
     elapsed_minutes, completed_at, error_message, metadata";

#[async_trait]
impl CheckpointRepository for PgCheckpointStore {
    async fn upsert(&self, checkpoint: &JobCheckpoint) -> Result<()> {
        sqlx::query(
            "INSERT INTO reembed_checkpoint (
                 job_id, status, table_name, model, dimensions, start_offset,
                 current_offset, total_processed, total_count, percentage,
                 start_time, elapsed_minutes, completed_at, error_message, metadata
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (job_id) DO UPDATE SET
                 status = EXCLUDED.status,
                 table_name = EXCLUDED.table_name,
                 model = EXCLUDED.model,
                 dimensions = EXCLUDED.dimensions,
                 start_offset = EXCLUDED.start_offset,
                 current_offset = EXCLUDED.current_offset,
                 total_processed = EXCLUDED.total_processed,
                 total_count = EXCLUDED.total_count,
                 percentage = EXCLUDED.percentage,
                 start_time = EXCLUDED.start_time,
                 elapsed_minutes = EXCLUDED.elapsed_minutes,
                 completed_at = EXCLUDED.completed_at,
                 error_message = EXCLUDED.error_message,
                 metadata = EXCLUDED.metadata",
        )
        .bind(&checkpoint.job_id)
        .bind(checkpoint.status.as_str())
        .bind(checkpoint.table_name.as_str())
        .bind(&checkpoint.model)
        .bind(checkpoint.dimensions)
        .bind(checkpoint.start_offset)
        .bind(checkpoint.current_offset)
        .bind(checkpoint.total_processed)
        .bind(checkpoint.total_count)
        .bind(checkpoint.percentage)
        .bind(checkpoint.start_time)
        .bind(checkpoint.elapsed_minutes)
        .bind(checkpoint.completed_at)
        .bind(&checkpoint.error_message)
        .bind(&checkpoint.metadata)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobCheckpoint>> {
        let query = format!(
            "SELECT {} FROM reembed_checkpoint WHERE job_id = $1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(Self::parse_row).transpose()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<JobCheckpoint>> {
        let query = format!(
            "SELECT {} FROM reembed_checkpoint ORDER BY start_time DESC LIMIT $1",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_row).collect()
    }

    async fn running_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reembed_checkpoint WHERE status = 'running'")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }
}
