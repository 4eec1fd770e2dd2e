//! Data model shared across the Scholar RAG assistant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when a search result has no title
pub const UNKNOWN_TITLE: &str = "No Title";
/// Placeholder used when a search result has no abstract
pub const UNKNOWN_ABSTRACT: &str = "No Abstract";
/// Placeholder used when a search result has no publication year
pub const UNKNOWN_YEAR: &str = "Unknown";

/// A paper found by a paper source
///
/// Every field is always present; missing upstream values are replaced with
/// the `UNKNOWN_*` placeholders when the record is parsed. Only the links are
/// optional, and a missing `pdf_url` is never filled in from `pub_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: String,
    pub year: String,
    pub pdf_url: Option<String>,
    pub pub_url: Option<String>,
}

impl PaperRecord {
    /// Whether the record can be downloaded and ingested
    pub fn has_pdf(&self) -> bool {
        self.pdf_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    /// Authors joined for display
    pub fn authors_display(&self) -> String {
        if self.authors.is_empty() {
            "Unknown".to_string()
        } else {
            self.authors.join(", ")
        }
    }
}

/// A bounded slice of a document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    /// Path of the file the chunk was read from
    pub source: String,
    /// 1-based page number
    pub page: u32,
}

impl DocumentChunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            page,
        }
    }

    /// Stable hash of the chunk's text and origin, used to skip re-ingestion
    pub fn content_hash(&self) -> String {
        let key = format!("{}\u{1f}{}\u{1f}{}", self.source, self.page, self.text);
        format!("{:x}", md5::compute(key.as_bytes()))
    }
}

/// Who spoke in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of an ingest call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub chunks_added: usize,
    pub duplicates_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pdf_url: Option<&str>) -> PaperRecord {
        PaperRecord {
            title: "Graph Attention Networks".to_string(),
            authors: vec!["P Veličković".to_string(), "G Cucurull".to_string()],
            abstract_text: UNKNOWN_ABSTRACT.to_string(),
            year: "2017".to_string(),
            pdf_url: pdf_url.map(str::to_string),
            pub_url: Some("https://example.org/gat".to_string()),
        }
    }

    #[test]
    fn test_has_pdf() {
        assert!(record(Some("https://arxiv.org/pdf/1710.10903")).has_pdf());
        assert!(!record(None).has_pdf());
        assert!(!record(Some("  ")).has_pdf());
    }

    #[test]
    fn test_authors_display() {
        assert_eq!(record(None).authors_display(), "P Veličković, G Cucurull");

        let mut anonymous = record(None);
        anonymous.authors.clear();
        assert_eq!(anonymous.authors_display(), "Unknown");
    }

    #[test]
    fn test_content_hash_depends_on_origin() {
        let a = DocumentChunk::new("same text", "a.pdf", 1);
        let b = DocumentChunk::new("same text", "a.pdf", 2);
        let c = DocumentChunk::new("same text", "a.pdf", 1);

        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_turn_roles() {
        assert_eq!(ConversationTurn::user("hi").role, Role::User);
        assert_eq!(ConversationTurn::assistant("hello").role, Role::Assistant);
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
