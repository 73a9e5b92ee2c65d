//! Failure classification for the batch worker.
//!
//! Classification is informational: it labels the log line an operator sees,
//! and nothing else. Every failure class is retried indefinitely at the same
//! fixed delay, because the job is designed to finish unattended — waiting
//! out an infrastructure outage and waiting for a human to fix a permanent
//! fault look identical from inside the loop.

use culina_core::{defaults, Error};

/// Substrings (matched case-insensitively) that mark a failure as likely
/// infrastructure-related rather than a logic or input fault.
pub const RETRYABLE_PATTERNS: [&str; 9] = [
    "502",
    "503",
    "504",
    "timeout",
    "network",
    "connection",
    "cloudflare",
    "bad gateway",
    "service unavailable",
];

/// Operator-facing failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Failure text matches a known retryable pattern.
    Transient,
    /// Backend-reported failure with no recognized pattern.
    Opaque,
    /// The backend could not be reached at all.
    Network,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::Opaque => "opaque",
            ErrorClass::Network => "network",
        }
    }
}

/// Classify a worker-loop failure for logging.
pub fn classify(error: &Error) -> ErrorClass {
    if matches!(error, Error::Request(_)) {
        return ErrorClass::Network;
    }
    let text = error.to_string().to_lowercase();
    if RETRYABLE_PATTERNS.iter().any(|p| text.contains(p)) {
        ErrorClass::Transient
    } else {
        ErrorClass::Opaque
    }
}

/// Truncate an error message for checkpoint storage.
pub fn truncate_error(message: &str) -> String {
    message.chars().take(defaults::ERROR_MESSAGE_MAX).collect()
}
