//! Session state and the user-facing operations

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use scholar_core::{
    ConversationTurn, EmbeddingProvider, Error, IngestReport, LLMProvider, PaperRecord,
    PaperSource, Result, VectorStore,
};
use scholar_rag::{DEFAULT_TOP_K, PdfFetcher, RagSystem, TextSplitter, split};
use scholar_search::{Pacer, search};

/// A paper that could not be analyzed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperFailure {
    pub title: String,
    pub reason: String,
}

/// Outcome of analyzing the selected papers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub papers_ingested: usize,
    pub chunks_added: usize,
    pub duplicates_skipped: usize,
    pub failures: Vec<PaperFailure>,
}

/// One user's search results, paper selection, transcript and index
///
/// Ending the session drops the in-memory state; the persisted index is kept.
pub struct Session<E, L, V, S>
where
    E: EmbeddingProvider,
    L: LLMProvider,
    V: VectorStore,
    S: PaperSource,
{
    source: S,
    pacer: Pacer,
    fetcher: PdfFetcher,
    splitter: TextSplitter,
    rag: RagSystem<E, L, V>,
    top_k: usize,
    papers: Vec<PaperRecord>,
    selected: BTreeSet<usize>,
    transcript: Vec<ConversationTurn>,
}

impl<E, L, V, S> Session<E, L, V, S>
where
    E: EmbeddingProvider,
    L: LLMProvider,
    V: VectorStore,
    S: PaperSource,
{
    pub fn new(source: S, rag: RagSystem<E, L, V>, fetcher: PdfFetcher) -> Self {
        Self {
            source,
            pacer: Pacer::default(),
            fetcher,
            splitter: TextSplitter::default(),
            rag,
            top_k: DEFAULT_TOP_K,
            papers: Vec::new(),
            selected: BTreeSet::new(),
            transcript: Vec::new(),
        }
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn rag(&self) -> &RagSystem<E, L, V> {
        &self.rag
    }

    pub fn fetcher(&self) -> &PdfFetcher {
        &self.fetcher
    }

    pub fn papers(&self) -> &[PaperRecord] {
        &self.papers
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected papers in list order
    pub fn selected(&self) -> Vec<&PaperRecord> {
        self.selected.iter().filter_map(|&i| self.papers.get(i)).collect()
    }

    /// Replace the paper list with the results for `query`
    pub async fn search(&mut self, query: &str, limit: usize) -> Result<&[PaperRecord]> {
        let records = search(&self.source, &self.pacer, query, limit).await?;
        self.papers = records;
        self.selected.clear();
        Ok(&self.papers)
    }

    /// Flip the selection of the paper at `index`, returning whether it is now selected
    ///
    /// Papers without a direct PDF link cannot be selected.
    pub fn toggle_selection(&mut self, index: usize) -> Result<bool> {
        let record = self.papers.get(index).ok_or_else(|| {
            Error::InvalidInput(format!("No paper number {}", index + 1))
        })?;

        if !record.has_pdf() {
            return Err(Error::InvalidInput(format!(
                "\"{}\" has no PDF link and cannot be analyzed",
                record.title
            )));
        }

        if self.selected.remove(&index) {
            Ok(false)
        } else {
            self.selected.insert(index);
            Ok(true)
        }
    }

    /// Download, split and ingest every selected paper in order
    ///
    /// A paper that fails is recorded in the report and the rest are still
    /// processed. Only fatal errors (missing credentials) end the batch.
    /// `progress` is called after each paper with `(done, total, title)`.
    pub async fn analyze<F>(&self, mut progress: F) -> Result<AnalysisReport>
    where
        F: FnMut(usize, usize, &str),
    {
        let selected = self.selected();
        if selected.is_empty() {
            return Err(Error::InvalidInput(
                "Select at least one paper with a PDF link first".to_string(),
            ));
        }

        let total = selected.len();
        let mut report = AnalysisReport::default();
        info!(total, "Analyzing selected papers");

        for (i, record) in selected.into_iter().enumerate() {
            match self.analyze_paper(record).await {
                Ok(ingest) => {
                    report.papers_ingested += 1;
                    report.chunks_added += ingest.chunks_added;
                    report.duplicates_skipped += ingest.duplicates_skipped;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(title = %record.title, error = %e, "Skipping paper");
                    report.failures.push(PaperFailure {
                        title: record.title.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            progress(i + 1, total, &record.title);
        }

        Ok(report)
    }

    async fn analyze_paper(&self, record: &PaperRecord) -> Result<IngestReport> {
        let url = record.pdf_url.as_deref();
        let path = self.fetcher.fetch(url).await.ok_or_else(|| {
            Error::Network(format!("Could not download {}", url.unwrap_or_default()))
        })?;

        let chunks = split(&path, &self.splitter)?;
        if chunks.is_empty() {
            return Err(Error::Parsing(format!(
                "No extractable text in {}",
                path.display()
            )));
        }

        self.rag.ingest(chunks).await
    }

    /// Ask a question about the analyzed papers
    ///
    /// The question is kept in the transcript even when answering fails.
    pub async fn ask(&mut self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("Question must not be empty".to_string()));
        }

        self.transcript.push(ConversationTurn::user(question));
        let answer = self.rag.query(question, self.top_k).await?;
        self.transcript.push(ConversationTurn::assistant(answer.clone()));
        Ok(answer)
    }

    /// Remove every ingested chunk from the index
    pub async fn clear_index(&self) -> Result<()> {
        self.rag.clear().await
    }

    /// End the session, dropping results and transcript
    pub fn end(self) {
        info!(turns = self.transcript.len(), "Session ended");
    }
}
