//! OpenAI integration for the Scholar RAG assistant
//!
//! This crate provides the OpenAI implementation of the EmbeddingProvider and
//! LLMProvider traits.

mod client;
mod config;


pub use client::OpenAIClient;
pub use config::OpenAIConfig;

// Re-export core types for convenience
pub use scholar_core::{
    ChatMessage, EmbeddingProvider, Error, GenerationConfig, GenerationResult, LLMProvider,
    Result,
};
