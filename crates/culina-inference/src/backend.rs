//! HTTP client for the embedding-computation service.
//!
//! The service is treated as a black-box batch processor: one POST per batch,
//! and the response's `nextOffset` is the only source of traversal progress.
//! A failure is either a non-2xx status (body is an error text), an HTTP 200
//! whose JSON carries an `error` string, or a transport failure.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use culina_core::{
    defaults, BatchEmbedBackend, BatchEmbedRequest, BatchEmbedResponse, Error, Result,
};

/// Default embedding service endpoint.
pub const DEFAULT_EMBED_SERVICE_URL: &str = defaults::EMBED_SERVICE_URL;

/// Raw response body from the embedding service.
///
/// The service reports application-level failures as HTTP 200 with an `error`
/// field, so every field of the success shape has to be optional until the
/// error check has run.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBatchResponse {
    error: Option<String>,
    processed: Option<i64>,
    next_offset: Option<i64>,
    has_more: Option<bool>,
    total_count: Option<i64>,
}

impl RawBatchResponse {
    fn into_response(self) -> Result<BatchEmbedResponse> {
        if let Some(error) = self.error {
            return Err(Error::Backend(error));
        }
        match (self.processed, self.next_offset, self.has_more, self.total_count) {
            (Some(processed), Some(next_offset), Some(has_more), Some(total_count)) => {
                Ok(BatchEmbedResponse {
                    processed,
                    next_offset,
                    has_more,
                    total_count,
                })
            }
            _ => Err(Error::Serialization(
                "embedding service response missing required fields".into(),
            )),
        }
    }
}

/// Embedding service client.
pub struct HttpEmbedBackend {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpEmbedBackend {
    /// Create a new client for the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CULINA_EMBED_URL` | `http://127.0.0.1:8089` | Embedding service base URL |
    /// | `CULINA_EMBED_TIMEOUT_SECS` | `120` | Per-batch request timeout |
    pub fn from_env() -> Self {
        let base_url = std::env::var("CULINA_EMBED_URL")
            .unwrap_or_else(|_| DEFAULT_EMBED_SERVICE_URL.to_string());
        let timeout_secs = std::env::var("CULINA_EMBED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::EMBED_TIMEOUT_SECS);

        Self {
            client: Client::new(),
            base_url,
            timeout_secs,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The configured service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl BatchEmbedBackend for HttpEmbedBackend {
    #[instrument(
        skip(self, req),
        fields(
            subsystem = "inference",
            component = "embed_backend",
            op = "process_batch",
            db_table = %req.table,
            offset = req.offset,
        )
    )]
    async fn process_batch(&self, req: &BatchEmbedRequest) -> Result<BatchEmbedResponse> {
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/api/embed-batch", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(req)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "Embedding service returned {}: {}",
                status, body
            )));
        }

        let raw: RawBatchResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))?;

        let parsed = raw.into_response()?;
        debug!(
            processed = parsed.processed,
            next_offset = parsed.next_offset,
            has_more = parsed.has_more,
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch processed"
        );
        Ok(parsed)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
