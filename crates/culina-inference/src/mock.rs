//! Scripted mock backend for deterministic testing.
//!
//! Unlike a randomized fake, the script is an explicit queue of outcomes:
//! tests push the exact sequence of successes and failures a run should see,
//! then assert against the recorded request log (offsets, retry counts,
//! sweep resets).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use culina_inference::mock::MockBatchBackend;
//!
//! let backend = MockBatchBackend::new()
//!     .push_error("503 Service Unavailable")
//!     .push_success(100, 100, true, 250);
//!
//! // first call fails, second succeeds; backend.requests() shows both
//! // were made at the same offset.
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use culina_core::{
    BatchEmbedBackend, BatchEmbedRequest, BatchEmbedResponse, Error, Result,
};

/// One scripted outcome.
#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Success(BatchEmbedResponse),
    BackendError(String),
    NetworkError(String),
}

/// Scripted mock implementation of BatchEmbedBackend.
#[derive(Default)]
pub struct MockBatchBackend {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    requests: Mutex<Vec<BatchEmbedRequest>>,
}

impl MockBatchBackend {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful batch response.
    pub fn push_success(
        self,
        processed: i64,
        next_offset: i64,
        has_more: bool,
        total_count: i64,
    ) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Success(BatchEmbedResponse {
                processed,
                next_offset,
                has_more,
                total_count,
            }));
        self
    }

    /// Queue a backend-reported failure (non-2xx body or error field).
    pub fn push_error(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::BackendError(message.into()));
        self
    }

    /// Queue a transport-level failure.
    pub fn push_network_error(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::NetworkError(message.into()));
        self
    }

    /// All requests received, in order.
    pub fn requests(&self) -> Vec<BatchEmbedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl BatchEmbedBackend for MockBatchBackend {
    async fn process_batch(&self, req: &BatchEmbedRequest) -> Result<BatchEmbedResponse> {
        self.requests.lock().unwrap().push(req.clone());

        let outcome = self.script.lock().unwrap().pop_front();
        match outcome {
            Some(ScriptedOutcome::Success(resp)) => Ok(resp),
            Some(ScriptedOutcome::BackendError(msg)) => Err(Error::Backend(msg)),
            Some(ScriptedOutcome::NetworkError(msg)) => Err(Error::Request(msg)),
            None => Err(Error::Backend("mock script exhausted".into())),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
