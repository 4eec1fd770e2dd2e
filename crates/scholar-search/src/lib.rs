//! Paper search for the Scholar RAG assistant
//!
//! This crate provides the Google Scholar implementation of the PaperSource
//! trait and the paced, bounded search loop that turns raw hits into records.

mod pacer;
mod scholar;
mod search;


pub use pacer::Pacer;
pub use scholar::{ScholarSource, parse_results_page};
pub use search::search;

// Re-export core types for convenience
pub use scholar_core::{Error, PaperRecord, PaperSource, RawHit, Result};
