//! Core data models for the culina re-embedding service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Catalog tables whose rows carry vector embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTable {
    Ingredients,
    Recipes,
    MenuSets,
}

impl TargetTable {
    /// All re-embeddable tables.
    pub const ALL: [TargetTable; 3] = [
        TargetTable::Ingredients,
        TargetTable::Recipes,
        TargetTable::MenuSets,
    ];

    /// String form used in job IDs, checkpoints, and the wire protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTable::Ingredients => "ingredients",
            TargetTable::Recipes => "recipes",
            TargetTable::MenuSets => "menu_sets",
        }
    }

    /// Parse the string form, rejecting anything outside the allowed set.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ingredients" => Ok(TargetTable::Ingredients),
            "recipes" => Ok(TargetTable::Recipes),
            "menu_sets" => Ok(TargetTable::MenuSets),
            other => Err(Error::Validation(format!(
                "unknown table '{}' (expected one of: ingredients, recipes, menu_sets)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TargetTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a re-embedding job.
///
/// There is no failed terminal state: failures are annotations
/// (`error_message`) on a still-running job, and the worker retries until the
/// dataset is exhausted or an operator intervenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            other => Err(Error::Validation(format!("unknown job status '{}'", other))),
        }
    }
}

/// Completion percentage for an offset/total pair, clamped to [0, 100].
///
/// Returns 0 while the total row count is still unknown (≤ 0).
pub fn percentage_for(current_offset: i64, total_count: i64) -> f64 {
    if total_count <= 0 {
        return 0.0;
    }
    let pct = current_offset as f64 / total_count as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Persisted progress record for one re-embedding job, keyed by `job_id`.
///
/// Every field is written on every checkpoint update (full-snapshot upsert),
/// so the stored row is always self-consistent and externally queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCheckpoint {
    pub job_id: String,
    pub status: JobStatus,
    pub table_name: TargetTable,
    pub model: String,
    pub dimensions: i32,
    pub start_offset: i64,
    pub current_offset: i64,
    pub total_processed: i64,
    pub total_count: i64,
    pub percentage: f64,
    pub start_time: DateTime<Utc>,
    pub elapsed_minutes: f64,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub metadata: Option<JsonValue>,
}

impl JobCheckpoint {
    /// Initial checkpoint for a freshly launched job: running, counters at
    /// their start values, totals unknown.
    pub fn initial(job_id: String, params: &LaunchParams, now: DateTime<Utc>) -> Self {
        Self {
            job_id,
            status: JobStatus::Running,
            table_name: params.table,
            model: params.model.clone(),
            dimensions: params.dimensions,
            start_offset: params.start_offset,
            current_offset: params.start_offset,
            total_processed: 0,
            total_count: 0,
            percentage: 0.0,
            start_time: now,
            elapsed_minutes: 0.0,
            completed_at: None,
            error_message: None,
            metadata: None,
        }
    }

    /// Recompute the derived fields (`percentage`, `elapsed_minutes`) from the
    /// counters and the given wall-clock time.
    pub fn refresh_derived(&mut self, now: DateTime<Utc>) {
        self.percentage = percentage_for(self.current_offset, self.total_count);
        self.elapsed_minutes = (now - self.start_time).num_seconds() as f64 / 60.0;
    }

    /// Transition to the terminal state. The row is never written again after
    /// the snapshot carrying this state.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.percentage = 100.0;
        self.completed_at = Some(now);
        self.error_message = None;
        self.elapsed_minutes = (now - self.start_time).num_seconds() as f64 / 60.0;
    }
}

/// Parameters accepted by the job launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchParams {
    pub table: TargetTable,
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

/// One batch request to the embedding service.
///
/// Field names follow the service's wire protocol (camelCase JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEmbedRequest {
    pub table: TargetTable,
    pub offset: i64,
    pub limit: i64,
    pub model: String,
    pub dimensions: i32,
    pub only_missing: bool,
}

/// Successful batch response from the embedding service.
///
/// `next_offset` is authoritative: the worker only ever advances to the value
/// the service hands back and never computes offsets itself, which is what
/// makes repeating a request at the same offset after a failure safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEmbedResponse {
    pub processed: i64,
    pub next_offset: i64,
    pub has_more: bool,
    pub total_count: i64,
}

impl BatchEmbedResponse {
    /// In only-missing mode the service signals a fresh sweep by pointing the
    /// next offset back at 0 while reporting more eligible rows: new
    /// null-embedding rows may have appeared since the pass began.
    pub fn is_sweep_reset(&self) -> bool {
        self.has_more && self.next_offset == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_table_as_str() {
        assert_eq!(TargetTable::Ingredients.as_str(), "ingredients");
        assert_eq!(TargetTable::Recipes.as_str(), "recipes");
        assert_eq!(TargetTable::MenuSets.as_str(), "menu_sets");
    }

    #[test]
    fn test_target_table_parse_round_trip() {
        for table in TargetTable::ALL {
            assert_eq!(TargetTable::parse(table.as_str()).unwrap(), table);
        }
    }

    #[test]
    fn test_target_table_parse_rejects_unknown() {
        assert!(TargetTable::parse("users").is_err());
        assert!(TargetTable::parse("").is_err());
        assert!(TargetTable::parse("Recipes").is_err());
    }

    #[test]
    fn test_job_status_round_trip() {
        for status in [JobStatus::Running, JobStatus::Completed] {
            assert_eq!(JobStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_job_status_parse_rejects_failed() {
        // "failed" is deliberately not a status; errors annotate running jobs.
        assert!(JobStatus::parse("failed").is_err());
    }

    #[test]
    fn test_percentage_basic() {
        assert_eq!(percentage_for(0, 250), 0.0);
        assert_eq!(percentage_for(100, 250), 40.0);
        assert_eq!(percentage_for(250, 250), 100.0);
    }

    #[test]
    fn test_percentage_clamped() {
        assert_eq!(percentage_for(300, 250), 100.0);
        assert_eq!(percentage_for(-5, 250), 0.0);
    }

    #[test]
    fn test_percentage_unknown_total() {
        assert_eq!(percentage_for(100, 0), 0.0);
        assert_eq!(percentage_for(100, -1), 0.0);
    }

    #[test]
    fn test_initial_checkpoint() {
        let params = LaunchParams {
            table: TargetTable::Recipes,
            model: "large".to_string(),
            dimensions: 1024,
            start_offset: 40,
            only_missing: true,
        };
        let now = Utc::now();
        let cp = JobCheckpoint::initial("recipes-1".to_string(), &params, now);

        assert_eq!(cp.status, JobStatus::Running);
        assert_eq!(cp.start_offset, 40);
        assert_eq!(cp.current_offset, 40);
        assert_eq!(cp.total_processed, 0);
        assert_eq!(cp.total_count, 0);
        assert_eq!(cp.percentage, 0.0);
        assert!(cp.completed_at.is_none());
        assert!(cp.error_message.is_none());
    }

    #[test]
    fn test_refresh_derived() {
        let params = LaunchParams {
            table: TargetTable::Ingredients,
            model: "small".to_string(),
            dimensions: 1536,
            start_offset: 0,
            only_missing: true,
        };
        let start = Utc::now() - chrono::Duration::minutes(3);
        let mut cp = JobCheckpoint::initial("ingredients-1".to_string(), &params, start);
        cp.current_offset = 50;
        cp.total_count = 200;
        cp.refresh_derived(Utc::now());

        assert_eq!(cp.percentage, 25.0);
        assert!(cp.elapsed_minutes >= 3.0);
    }

    #[test]
    fn test_mark_completed() {
        let params = LaunchParams {
            table: TargetTable::Recipes,
            model: "large".to_string(),
            dimensions: 1024,
            start_offset: 0,
            only_missing: false,
        };
        let mut cp = JobCheckpoint::initial("recipes-2".to_string(), &params, Utc::now());
        cp.error_message = Some("503 earlier".to_string());
        cp.mark_completed(Utc::now());

        assert_eq!(cp.status, JobStatus::Completed);
        assert_eq!(cp.percentage, 100.0);
        assert!(cp.completed_at.is_some());
        assert!(cp.error_message.is_none());
    }

    #[test]
    fn test_batch_request_wire_format() {
        let req = BatchEmbedRequest {
            table: TargetTable::MenuSets,
            offset: 200,
            limit: 100,
            model: "large".to_string(),
            dimensions: 1024,
            only_missing: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["table"], "menu_sets");
        assert_eq!(json["offset"], 200);
        assert_eq!(json["onlyMissing"], true);
        assert!(json.get("only_missing").is_none());
    }

    #[test]
    fn test_batch_response_wire_format() {
        let resp: BatchEmbedResponse = serde_json::from_str(
            r#"{"processed": 100, "nextOffset": 300, "hasMore": true, "totalCount": 900}"#,
        )
        .unwrap();
        assert_eq!(resp.processed, 100);
        assert_eq!(resp.next_offset, 300);
        assert!(resp.has_more);
        assert_eq!(resp.total_count, 900);
    }

    #[test]
    fn test_sweep_reset_sentinel() {
        let reset = BatchEmbedResponse {
            processed: 40,
            next_offset: 0,
            has_more: true,
            total_count: 500,
        };
        assert!(reset.is_sweep_reset());

        let done = BatchEmbedResponse {
            processed: 40,
            next_offset: 0,
            has_more: false,
            total_count: 500,
        };
        assert!(!done.is_sweep_reset());

        let advancing = BatchEmbedResponse {
            processed: 100,
            next_offset: 100,
            has_more: true,
            total_count: 500,
        };
        assert!(!advancing.is_sweep_reset());
    }

    #[test]
    fn test_launch_params_defaults() {
        let params: LaunchParams = serde_json::from_str(
            r#"{"table": "recipes", "model": "large", "dimensions": 1024}"#,
        )
        .unwrap();
        assert_eq!(params.start_offset, 0);
        assert!(params.only_missing);
    }
}
