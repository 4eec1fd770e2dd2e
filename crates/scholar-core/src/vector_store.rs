//! Vector store trait and types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DocumentChunk, Result};

/// A stored embedding together with the chunk it was computed from
///
/// Entries are never mutated once stored; the store only grows or is cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub content_hash: String,
    pub embedding: Vec<f32>,
    pub chunk: DocumentChunk,
    pub created_at: DateTime<Utc>,
}

/// An entry returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// The embedding model and vector length a store's entries were built with
///
/// Vectors from different models are not comparable, so a store holds entries
/// from exactly one space at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSpace {
    pub model_id: String,
    pub dimensions: usize,
}

impl EmbeddingSpace {
    pub fn new(model_id: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimensions,
        }
    }
}

/// Trait for persistent vector stores
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append entries embedded in `space`
    ///
    /// Fails when the store already holds entries from another space or when
    /// an embedding does not have `space.dimensions` components.
    async fn add(&self, space: &EmbeddingSpace, entries: Vec<IndexEntry>) -> Result<usize>;

    /// Space of the stored entries, `None` while the store is empty
    async fn embedding_space(&self) -> Result<Option<EmbeddingSpace>>;

    /// Return the `top_k` entries most similar to `vector`, best first
    ///
    /// A vector whose length differs from the stored dimension is an error.
    async fn search_by_vector(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredEntry>>;

    /// Whether an entry with this content hash is already stored
    async fn contains(&self, content_hash: &str) -> Result<bool>;

    /// Remove every entry, leaving an empty but usable store
    async fn clear(&self) -> Result<()>;

    /// Get the total number of entries
    async fn count(&self) -> Result<usize>;
}
