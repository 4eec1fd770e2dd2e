//! Core traits and types for the Scholar RAG assistant
//!
//! This crate defines the data model shared by every other crate (paper records,
//! document chunks, index entries, conversation turns) and the capability-facing
//! interfaces for paper sources, embedding providers, LLM providers and vector
//! stores, so each piece can be swapped for a fake in tests.

pub mod embedding;
pub mod error;
pub mod llm;
pub mod paper_source;
pub mod types;
pub mod vector_store;


pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use llm::{ChatMessage, ChatRole, GenerationConfig, GenerationResult, LLMProvider};
pub use paper_source::{PaperSource, RawHit};
pub use types::*;
pub use vector_store::{EmbeddingSpace, IndexEntry, ScoredEntry, VectorStore};
