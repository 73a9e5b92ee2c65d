//! Structured logging schema and field name constants for culina.
//!
//! All crates use these field names for consistent structured logging so log
//! aggregation tools can query by standardized names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, retry or fallback applied |
//! | INFO  | Lifecycle events (launch, completion), operation summaries |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-batch iteration detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → job → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "worker", "launcher", "checkpoint_store", "embed_backend"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "launch", "process_batch", "upsert"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Re-embedding job ID.
pub const JOB_ID: &str = "job_id";

/// Catalog table being re-embedded.
pub const DB_TABLE: &str = "db_table";

/// Embedding model ID used for the job.
pub const MODEL: &str = "model";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Row offset of the current batch.
pub const OFFSET: &str = "offset";

/// Rows processed by an operation.
pub const PROCESSED: &str = "processed";

/// Consecutive retry count at the current offset.
pub const RETRY: &str = "retry";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
