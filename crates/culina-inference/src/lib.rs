//! # culina-inference
//!
//! Embedding service client for the culina re-embedding service.
//!
//! This crate provides:
//! - `HttpEmbedBackend`, the reqwest client for the external batch embedding
//!   endpoint
//! - The embedding model registry (known model ids and their valid dimension
//!   sets), consulted by launch validation
//! - A scripted mock backend for deterministic tests (feature `mock`)

pub mod backend;
pub mod embedding_models;
#[cfg(feature = "mock")]
pub mod mock;

pub use backend::{HttpEmbedBackend, DEFAULT_EMBED_SERVICE_URL};
pub use embedding_models::{EmbeddingModelProfile, EmbeddingModelRegistry};
#[cfg(feature = "mock")]
pub use mock::MockBatchBackend;
