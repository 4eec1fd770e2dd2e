//! Bounded, paced paper search

use std::collections::VecDeque;
use tracing::{info, warn};

use scholar_core::{Error, PaperRecord, PaperSource, RawHit, Result};

use crate::Pacer;

/// Search `source` for `query` and return at most `limit` records
///
/// Pages are pulled lazily and scanning stops as soon as `limit` records are
/// collected or the source runs dry. A fetch error ends the scan early and the
/// records gathered so far are returned. The pacer sleeps between records.
pub async fn search<S>(source: &S, pacer: &Pacer, query: &str, limit: usize) -> Result<Vec<PaperRecord>>
where
    S: PaperSource + ?Sized,
{
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("Search query must not be empty".to_string()));
    }

    info!(query, limit, source = source.name(), "Searching for papers");

    let mut records = Vec::new();
    let mut pending: VecDeque<RawHit> = VecDeque::new();
    let mut offset = 0;

    while records.len() < limit {
        if pending.is_empty() {
            match source.next_page(query, offset).await {
                Ok(page) if page.is_empty() => break,
                Ok(page) => {
                    offset += page.len();
                    pending.extend(page);
                }
                Err(e) => {
                    warn!(error = %e, collected = records.len(), "Error fetching papers, returning partial results");
                    break;
                }
            }
        }

        let Some(hit) = pending.pop_front() else {
            break;
        };

        let record = hit.into_record();
        info!(title = %record.title, "Found paper");
        records.push(record);

        if records.len() < limit {
            pacer.pause().await;
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves fixed pages and records which offsets were requested
    struct FakeSource {
        pages: Vec<Result<Vec<RawHit>>>,
        requested: Mutex<Vec<usize>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Result<Vec<RawHit>>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<usize> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaperSource for FakeSource {
        async fn next_page(&self, _query: &str, offset: usize) -> Result<Vec<RawHit>> {
            let mut requested = self.requested.lock().unwrap();
            let index = requested.len();
            requested.push(offset);
            match self.pages.get(index) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(Error::Network(e.to_string())),
                None => Ok(Vec::new()),
            }
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn hits(titles: &[&str]) -> Vec<RawHit> {
        titles
            .iter()
            .map(|t| RawHit {
                title: Some(t.to_string()),
                ..Default::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_limit_bounds_records_not_scan() {
        let source = FakeSource::new(vec![Ok(hits(&["a", "b", "c"])), Ok(hits(&["d", "e"]))]);

        let records = search(&source, &Pacer::none(), "gnn", 4).await.unwrap();

        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
        assert_eq!(source.requests(), vec![0, 3]);
    }

    #[tokio::test]
    async fn test_stops_on_exhaustion() {
        let source = FakeSource::new(vec![Ok(hits(&["a", "b"]))]);

        let records = search(&source, &Pacer::none(), "gnn", 10).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(source.requests(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_fetch_error_returns_partial_results() {
        let source = FakeSource::new(vec![
            Ok(hits(&["a"])),
            Err(Error::Network("429".to_string())),
            Ok(hits(&["never"])),
        ]);

        let records = search(&source, &Pacer::none(), "gnn", 5).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "a");
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_every_record_is_fully_populated() {
        let source = FakeSource::new(vec![Ok(vec![RawHit::default(), RawHit::default()])]);

        let records = search(&source, &Pacer::none(), "gnn", 2).await.unwrap();

        assert_eq!(records.len(), 2);
        for record in records {
            assert_eq!(record.title, scholar_core::UNKNOWN_TITLE);
            assert_eq!(record.abstract_text, scholar_core::UNKNOWN_ABSTRACT);
            assert_eq!(record.year, scholar_core::UNKNOWN_YEAR);
        }
    }

    #[tokio::test]
    async fn test_zero_limit_fetches_nothing() {
        let source = FakeSource::new(vec![Ok(hits(&["a"]))]);

        let records = search(&source, &Pacer::none(), "gnn", 0).await.unwrap();

        assert!(records.is_empty());
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let source = FakeSource::new(Vec::new());
        let result = search(&source, &Pacer::none(), "   ", 3).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
