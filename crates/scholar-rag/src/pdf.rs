//! PDF download and page-level chunking

use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use scholar_core::{DocumentChunk, Error, Result};

use crate::TextSplitter;

/// Default directory for downloaded papers
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloaded_papers";

/// Downloads paper PDFs into a local directory, reusing earlier downloads
pub struct PdfFetcher {
    download_dir: PathBuf,
    client: Client,
}

impl PdfFetcher {
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            download_dir: download_dir.into(),
            client,
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Where the file for `url` lives (or will live) on disk
    pub fn local_path(&self, url: &str) -> Option<PathBuf> {
        sanitize_file_name(url).map(|name| self.download_dir.join(name))
    }

    /// Download `url` unless a file with the derived name already exists
    ///
    /// Returns `None` for a missing or empty URL and for any download failure;
    /// failures are logged, never raised.
    pub async fn fetch(&self, url: Option<&str>) -> Option<PathBuf> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let path = self.local_path(url)?;

        if let Err(e) = tokio::fs::create_dir_all(&self.download_dir).await {
            warn!(dir = %self.download_dir.display(), error = %e, "Cannot create download directory");
            return None;
        }

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(path = %path.display(), "File already exists");
            return Some(path);
        }

        info!(url, "Downloading PDF");
        match self.download(url, &path).await {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, "Downloaded");
                Some(path)
            }
            Err(e) => {
                warn!(url, error = %e, "Failed to download");
                None
            }
        }
    }

    /// Stream the response body into a `.part` file, then move it into place
    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::Network(e.to_string()))?;

        let partial = path.with_extension("pdf.part");
        let written = match write_stream(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, path).await?;
        Ok(written)
    }
}

async fn write_stream(response: reqwest::Response, partial: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Network(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

/// Derive a filesystem-safe file name from the last segment of `url`
///
/// `.pdf` is appended when missing, then everything except alphanumerics,
/// spaces, dots, underscores and hyphens is dropped. URLs without a usable
/// last segment get a name derived from the URL's hash.
pub fn sanitize_file_name(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let mut name = url.rsplit('/').next().unwrap_or_default().to_string();
    if !name.to_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }

    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_end();

    let stem = &cleaned[..cleaned.len().saturating_sub(4)];
    if stem.trim_matches(|c| c == '.' || c == ' ').is_empty() {
        return Some(format!("{:x}.pdf", md5::compute(url.as_bytes())));
    }

    Some(cleaned.to_string())
}

/// Extract the text of every page, keyed by 1-based page number
pub fn extract_pages(path: &Path) -> Result<Vec<(u32, String)>> {
    let document = lopdf::Document::load(path)
        .map_err(|e| Error::Parsing(format!("{}: {}", path.display(), e)))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => pages.push((*page_number, text)),
            Err(e) => {
                debug!(page = page_number, error = %e, "Skipping page without extractable text");
            }
        }
    }

    Ok(pages)
}

/// Parse a downloaded PDF and split each page into overlapping chunks
pub fn split(path: &Path, splitter: &TextSplitter) -> Result<Vec<DocumentChunk>> {
    info!(path = %path.display(), "Processing PDF");

    let source = path.display().to_string();
    let chunks: Vec<DocumentChunk> = extract_pages(path)?
        .into_iter()
        .flat_map(|(page, text)| {
            splitter
                .split_text(&text)
                .into_iter()
                .map(|chunk| DocumentChunk::new(chunk, source.clone(), page))
                .collect::<Vec<_>>()
        })
        .collect();

    info!(chunks = chunks.len(), "Split PDF into chunks");
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{serve_http, write_test_pdf};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_keeps_pdf_names() {
        assert_eq!(
            sanitize_file_name("https://example.org/papers/GNN Survey.PDF").as_deref(),
            Some("GNN Survey.PDF")
        );
    }

    #[test]
    fn test_sanitize_appends_suffix() {
        assert_eq!(
            sanitize_file_name("https://arxiv.org/pdf/1609.02907").as_deref(),
            Some("1609.02907.pdf")
        );
    }

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        assert_eq!(
            sanitize_file_name("https://host.org/download?id=5&type=full").as_deref(),
            Some("downloadid5typefull.pdf")
        );
    }

    #[test]
    fn test_sanitize_empty_segment_uses_hash() {
        let name = sanitize_file_name("https://host.org/").unwrap();
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 32 + 4);
        assert_eq!(sanitize_file_name("https://host.org/"), Some(name));
    }

    #[test]
    fn test_sanitize_rejects_empty_url() {
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name("   "), None);
    }

    #[tokio::test]
    async fn test_fetch_without_url_is_noop() {
        let dir = TempDir::new().unwrap();
        let fetcher = PdfFetcher::new(dir.path().join("papers")).unwrap();

        assert_eq!(fetcher.fetch(None).await, None);
        assert_eq!(fetcher.fetch(Some("")).await, None);
        assert!(!dir.path().join("papers").exists());
    }

    #[tokio::test]
    async fn test_fetch_reuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let fetcher = PdfFetcher::new(dir.path()).unwrap();
        // Nothing listens on port 9, so any network access would fail.
        let url = "http://127.0.0.1:9/papers/cached.pdf";
        let expected = dir.path().join("cached.pdf");
        std::fs::write(&expected, b"%PDF-1.5 cached").unwrap();

        let first = fetcher.fetch(Some(url)).await;
        let second = fetcher.fetch(Some(url)).await;

        assert_eq!(first, Some(expected.clone()));
        assert_eq!(second, Some(expected.clone()));
        assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.5 cached");
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_none() {
        let dir = TempDir::new().unwrap();
        let fetcher = PdfFetcher::new(dir.path()).unwrap();

        let result = fetcher.fetch(Some("http://127.0.0.1:9/missing.pdf")).await;

        assert_eq!(result, None);
        assert!(!dir.path().join("missing.pdf").exists());
        assert!(!dir.path().join("missing.pdf.part").exists());
    }

    #[tokio::test]
    async fn test_download_happens_once() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.pdf");
        write_test_pdf(&source, &["Downloaded over HTTP"]);
        let bytes = std::fs::read(&source).unwrap();
        let (base, hits) = serve_http("200 OK", bytes.clone()).await;
        let fetcher = PdfFetcher::new(dir.path().join("papers")).unwrap();
        let url = format!("{}/files/gcn.pdf", base);

        let first = fetcher.fetch(Some(&url)).await;
        let second = fetcher.fetch(Some(&url)).await;

        let expected = dir.path().join("papers").join("gcn.pdf");
        assert_eq!(first, Some(expected.clone()));
        assert_eq!(second, Some(expected.clone()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read(&expected).unwrap(), bytes);
        assert!(!expected.with_extension("pdf.part").exists());

        let chunks = split(&expected, &TextSplitter::default()).unwrap();
        assert!(chunks[0].text.contains("Downloaded"));
    }

    #[tokio::test]
    async fn test_http_error_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let (base, hits) = serve_http("404 Not Found", b"not here".to_vec()).await;
        let fetcher = PdfFetcher::new(dir.path()).unwrap();

        let result = fetcher.fetch(Some(&format!("{}/gone.pdf", base))).await;

        assert_eq!(result, None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!dir.path().join("gone.pdf").exists());
        assert!(!dir.path().join("gone.pdf.part").exists());
    }

    #[test]
    fn test_split_pdf_keeps_page_numbers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.pdf");
        write_test_pdf(&path, &["We evaluate on the Cora dataset", "Results improve accuracy"]);

        let chunks = split(&path, &TextSplitter::default()).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.contains("Cora"));
        assert_eq!(chunks[0].page, 1);
        assert!(chunks[1].text.contains("accuracy"));
        assert_eq!(chunks[1].page, 2);
        assert_eq!(chunks[0].source, path.display().to_string());
    }

    #[test]
    fn test_split_rejects_non_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"<html>Access denied</html>").unwrap();

        assert!(matches!(
            split(&path, &TextSplitter::default()),
            Err(Error::Parsing(_))
        ));
    }
}
