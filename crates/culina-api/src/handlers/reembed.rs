//! Re-embedding job handlers: privileged launch plus checkpoint queries.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use culina_core::{defaults, Error, JobCheckpoint, LaunchParams, TargetTable};

use super::ApiError;
use crate::AppState;

/// Launch request body. Field names follow the operator API's wire format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReembedRequest {
    pub table: String,
    pub model: String,
    pub dimensions: i32,
    #[serde(default)]
    pub start_offset: i64,
    #[serde(default = "default_only_missing")]
    pub only_missing: bool,
}

fn default_only_missing() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReembedResponse {
    pub job_id: String,
}

/// POST /api/admin/reembed
///
/// Fire-and-forget: returns the job id immediately; progress is visible only
/// by polling the checkpoint record.
#[instrument(skip(state, body), fields(subsystem = "api", component = "reembed", op = "launch"))]
pub async fn launch_reembed(
    State(state): State<AppState>,
    Json(body): Json<LaunchReembedRequest>,
) -> Result<Json<LaunchReembedResponse>, ApiError> {
    let table = TargetTable::parse(&body.table)?;
    let job_id = state
        .launcher
        .launch(LaunchParams {
            table,
            model: body.model,
            dimensions: body.dimensions,
            start_offset: body.start_offset,
            only_missing: body.only_missing,
        })
        .await?;
    Ok(Json(LaunchReembedResponse { job_id }))
}

/// GET /api/reembed/jobs/{job_id}
pub async fn get_reembed_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobCheckpoint>, ApiError> {
    let checkpoint = state
        .store
        .get(&job_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))?;
    Ok(Json(checkpoint))
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub limit: Option<i64>,
}

/// GET /api/reembed/jobs
pub async fn list_reembed_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobCheckpoint>>, ApiError> {
    let limit = query.limit.unwrap_or(defaults::PAGE_LIMIT).clamp(1, 500);
    let jobs = state.store.list_recent(limit).await?;
    Ok(Json(jobs))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub running_jobs: i64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let running_jobs = state.store.running_count().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        running_jobs,
    }))
}
