//! Embedding model configuration and registry.
//!
//! The embedding service exposes a small set of models, each supporting a
//! fixed set of output dimensions (reduced-dimension variants trade recall for
//! index size). Launch validation consults this registry: a job may only be
//! started for a known model id with a dimension in that model's valid set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Known embedding model profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingModelProfile {
    /// Model id as accepted by the embedding service (e.g., "small", "large").
    pub name: String,
    /// Output vector dimensions this model can produce.
    pub valid_dimensions: Vec<i32>,
    /// Dimension used when a caller does not care.
    pub default_dimension: i32,
    /// Brief description.
    pub description: String,
}

impl EmbeddingModelProfile {
    /// Returns true if this model can produce vectors of the given width.
    pub fn supports_dimensions(&self, dimensions: i32) -> bool {
        self.valid_dimensions.contains(&dimensions)
    }
}

/// Registry of known embedding models.
pub struct EmbeddingModelRegistry {
    models: HashMap<String, EmbeddingModelProfile>,
}

impl EmbeddingModelRegistry {
    /// Create a new registry with all known embedding models.
    pub fn new() -> Self {
        let mut models = HashMap::new();

        models.insert(
            "small".to_string(),
            EmbeddingModelProfile {
                name: "small".to_string(),
                valid_dimensions: vec![256, 512, 768, 1536],
                default_dimension: 1536,
                description: "Small: fast catalog embeddings, up to 1536d".to_string(),
            },
        );

        models.insert(
            "large".to_string(),
            EmbeddingModelProfile {
                name: "large".to_string(),
                valid_dimensions: vec![256, 1024, 3072],
                default_dimension: 3072,
                description: "Large: high-quality catalog embeddings, up to 3072d".to_string(),
            },
        );

        Self { models }
    }

    /// Get a model profile by id.
    pub fn get(&self, model_name: &str) -> Option<&EmbeddingModelProfile> {
        self.models.get(model_name)
    }

    /// Get all known model ids.
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the total number of known models.
    pub fn count(&self) -> usize {
        self.models.len()
    }
}

impl Default for EmbeddingModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
