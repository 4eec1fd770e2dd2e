//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for text embedding providers
///
/// The same provider must be used for ingestion and querying so that stored
/// vectors and query vectors live in the same space.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::EmbeddingProvider("Provider returned no vector".to_string()))
    }

    /// Identifier of the embedding model
    fn model_id(&self) -> &str;
}
