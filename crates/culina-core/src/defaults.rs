//! Centralized default constants for the culina re-embedding service.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// BATCH PROCESSING
// =============================================================================

/// Maximum rows requested from the embedding service per batch.
pub const BATCH_LIMIT: i64 = 100;

/// Delay between successful batches in milliseconds.
///
/// The downstream embedding computation is rate-limited; this fixed pause is
/// the only throttle applied between batches.
pub const BATCH_DELAY_MS: u64 = 500;

/// Delay before retrying a failed batch in milliseconds.
///
/// Fixed, not exponential: the job is designed to outwait infrastructure
/// outages of any length at a constant probe rate.
pub const RETRY_DELAY_MS: u64 = 5000;

/// Maximum stored length of a checkpoint error message in characters.
pub const ERROR_MESSAGE_MAX: usize = 500;

// =============================================================================
// EMBEDDING SERVICE
// =============================================================================

/// Default embedding service base URL.
pub const EMBED_SERVICE_URL: &str = "http://127.0.0.1:8089";

/// Timeout for a single batch request to the embedding service (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default page size for job list endpoints.
pub const PAGE_LIMIT: i64 = 50;
