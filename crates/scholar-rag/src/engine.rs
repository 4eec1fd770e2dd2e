//! Retrieval index and question answering over ingested chunks

use chrono::Utc;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use scholar_core::{
    DocumentChunk, EmbeddingProvider, EmbeddingSpace, Error, IndexEntry, IngestReport,
    LLMProvider, Result, ScoredEntry, VectorStore,
};

use crate::AnswerComposer;

/// Number of chunks retrieved per question unless told otherwise
pub const DEFAULT_TOP_K: usize = 5;

const DEFAULT_EMBED_BATCH: usize = 64;

/// Embeds chunks into a vector store and answers questions from it
pub struct RagSystem<E: EmbeddingProvider, L: LLMProvider, V: VectorStore> {
    embedder: E,
    composer: AnswerComposer<L>,
    store: V,
    batch_size: usize,
}

impl<E: EmbeddingProvider, L: LLMProvider, V: VectorStore> RagSystem<E, L, V> {
    /// Create a new RAG system
    pub fn new(embedder: E, llm: L, store: V) -> Self {
        Self {
            embedder,
            composer: AnswerComposer::new(llm),
            store,
            batch_size: DEFAULT_EMBED_BATCH,
        }
    }

    /// Set how many texts are sent per embedding request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &V {
        &self.store
    }

    pub fn composer(&self) -> &AnswerComposer<L> {
        &self.composer
    }

    /// Embed and store `chunks`, skipping ones already in the index
    ///
    /// All embeddings are computed before anything is written, so a provider
    /// failure leaves the index untouched.
    pub async fn ingest(&self, chunks: Vec<DocumentChunk>) -> Result<IngestReport> {
        if chunks.is_empty() {
            return Ok(IngestReport::default());
        }

        let mut seen = HashSet::new();
        let mut fresh = Vec::new();
        let mut duplicates_skipped = 0;
        for chunk in chunks {
            let hash = chunk.content_hash();
            if !seen.insert(hash.clone()) || self.store.contains(&hash).await? {
                duplicates_skipped += 1;
            } else {
                fresh.push((hash, chunk));
            }
        }

        if fresh.is_empty() {
            return Ok(IngestReport {
                chunks_added: 0,
                duplicates_skipped,
            });
        }

        let stored_space = self.check_embedding_model().await?;
        info!(new = fresh.len(), duplicates = duplicates_skipped, "Adding chunks to vector store");

        let mut entries = Vec::with_capacity(fresh.len());
        for batch in fresh.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|(_, chunk)| chunk.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::EmbeddingProvider(format!(
                    "Expected {} embeddings, received {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for ((hash, chunk), embedding) in batch.iter().zip(vectors) {
                entries.push(IndexEntry {
                    id: Uuid::new_v4().to_string(),
                    content_hash: hash.clone(),
                    embedding,
                    chunk: chunk.clone(),
                    created_at: Utc::now(),
                });
            }
        }

        let dimensions = entries.first().map(|e| e.embedding.len()).unwrap_or_default();
        let space = stored_space
            .unwrap_or_else(|| EmbeddingSpace::new(self.embedder.model_id(), dimensions));
        let chunks_added = self.store.add(&space, entries).await?;
        info!(chunks_added, "Ingestion complete");

        Ok(IngestReport {
            chunks_added,
            duplicates_skipped,
        })
    }

    /// Return the `k` stored chunks closest to `question`
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<ScoredEntry>> {
        if k == 0 {
            return Err(Error::InvalidInput("k must be positive".to_string()));
        }
        if self.store.count().await? == 0 {
            return Ok(Vec::new());
        }

        self.check_embedding_model().await?;
        let vector = self.embedder.embed(question).await?;
        self.store.search_by_vector(&vector, k).await
    }

    /// Fail when the index was built by a different embedding model
    async fn check_embedding_model(&self) -> Result<Option<EmbeddingSpace>> {
        let space = self.store.embedding_space().await?;
        if let Some(space) = &space {
            if space.model_id != self.embedder.model_id() {
                return Err(Error::VectorStore(format!(
                    "Index was built with embedding model {} but {} is configured; clear the index to rebuild it",
                    space.model_id,
                    self.embedder.model_id()
                )));
            }
        }
        Ok(space)
    }

    /// Answer `question` from the `k` most similar stored chunks
    pub async fn query(&self, question: &str, k: usize) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("Question must not be empty".to_string()));
        }

        let context: Vec<DocumentChunk> = self
            .retrieve(question, k)
            .await?
            .into_iter()
            .map(|scored| scored.chunk)
            .collect();

        self.composer.compose(question, &context).await
    }

    /// Delete every stored entry
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        info!("Database cleared");
        Ok(())
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }
}
