//! Paper source trait and the raw search hit type

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{PaperRecord, Result, UNKNOWN_ABSTRACT, UNKNOWN_TITLE, UNKNOWN_YEAR};

/// A search result as scraped, with every field possibly missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    pub title: Option<String>,
    pub authors: Option<Vec<String>>,
    pub abstract_text: Option<String>,
    pub year: Option<String>,
    pub eprint_url: Option<String>,
    pub pub_url: Option<String>,
}

impl RawHit {
    /// Turn the hit into a fully populated record
    ///
    /// Blank strings count as missing. The eprint link becomes `pdf_url` and
    /// the publisher link stays `pub_url`; neither stands in for the other.
    pub fn into_record(self) -> PaperRecord {
        PaperRecord {
            title: non_blank(self.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            authors: self
                .authors
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            abstract_text: non_blank(self.abstract_text)
                .unwrap_or_else(|| UNKNOWN_ABSTRACT.to_string()),
            year: non_blank(self.year).unwrap_or_else(|| UNKNOWN_YEAR.to_string()),
            pdf_url: non_blank(self.eprint_url),
            pub_url: non_blank(self.pub_url),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trait for academic search backends
///
/// Results are exposed page by page so callers can stop scanning as soon as
/// they have enough records.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Fetch the page of hits starting at `offset`; an empty page means the
    /// result stream is exhausted
    async fn next_page(&self, query: &str, offset: usize) -> Result<Vec<RawHit>>;

    /// Human readable name of the backend
    fn name(&self) -> &str;
}
