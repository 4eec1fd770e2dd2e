//! Retrieval-augmented answering over downloaded papers
//!
//! This crate provides the PDF ingestion pipeline (download, page extraction,
//! overlapping chunking), the persistent local vector store, the grounded
//! answer composer and the `RagSystem` that ties them together.

mod chunker;
mod composer;
mod engine;
mod pdf;
mod vector_store;

#[cfg(any(test, feature = "test-util"))]
pub mod fakes;

pub use chunker::TextSplitter;
pub use composer::{AnswerComposer, NO_CONTEXT_ANSWER, SYSTEM_PROMPT};
pub use engine::{DEFAULT_TOP_K, RagSystem};
pub use pdf::{DEFAULT_DOWNLOAD_DIR, PdfFetcher, extract_pages, sanitize_file_name, split};
pub use vector_store::{DEFAULT_INDEX_DIR, LocalVectorStore};

// Re-export core types for convenience
pub use scholar_core::{
    DocumentChunk, EmbeddingProvider, Error, IndexEntry, IngestReport, LLMProvider, Result,
    ScoredEntry, VectorStore,
};
