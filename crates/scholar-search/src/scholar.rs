//! Google Scholar result-page scraper

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

use scholar_core::{Error, PaperSource, RawHit, Result};

const DEFAULT_BASE_URL: &str = "https://scholar.google.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());
static TYPE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\[[A-Z]+\]\s*)+").unwrap());

/// Paper source backed by Google Scholar's HTML result pages
pub struct ScholarSource {
    client: Client,
    base_url: Url,
}

impl ScholarSource {
    /// Create a source pointing at scholar.google.com
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a source pointing at a custom host (mirrors, tests)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::InvalidInput(format!("Invalid base URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn page_url(&self, query: &str, offset: usize) -> Result<Url> {
        let mut url = self
            .base_url
            .join("scholar")
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("hl", "en")
            .append_pair("start", &offset.to_string());
        Ok(url)
    }
}

#[async_trait]
impl PaperSource for ScholarSource {
    async fn next_page(&self, query: &str, offset: usize) -> Result<Vec<RawHit>> {
        let url = self.page_url(query, offset)?;
        debug!(%url, "Fetching Google Scholar results");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::Network(
                "Google Scholar is rate limiting this client".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(Error::Network(format!(
                "Google Scholar returned status {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if body.contains("gs_captcha") || body.contains("unusual traffic") {
            return Err(Error::Network(
                "Google Scholar asked for a CAPTCHA; try again later".to_string(),
            ));
        }

        parse_results_page(&body, &self.base_url)
    }

    fn name(&self) -> &str {
        "Google Scholar"
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Parsing(format!("Bad selector {}: {:?}", css, e)))
}

/// Collapse runs of whitespace (including non-breaking spaces) to single spaces
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(|url| url.to_string())
}

/// Parse one Google Scholar result page into raw hits
///
/// Every result block yields a hit, even when most fields are missing, so the
/// number of hits always matches the number of results on the page.
pub fn parse_results_page(html: &str, base_url: &Url) -> Result<Vec<RawHit>> {
    let document = Html::parse_document(html);

    let result_sel = selector("div.gs_r.gs_or")?;
    let title_sel = selector("h3.gs_rt")?;
    let title_link_sel = selector("h3.gs_rt a")?;
    let byline_sel = selector("div.gs_a")?;
    let snippet_sel = selector("div.gs_rs")?;
    let pdf_link_sel = selector("div.gs_or_ggsm a")?;

    let hits = document
        .select(&result_sel)
        .map(|result| {
            let title = result
                .select(&title_link_sel)
                .next()
                .or_else(|| result.select(&title_sel).next())
                .map(element_text)
                .map(|t| TYPE_MARKER.replace(&t, "").trim().to_string());

            let pub_url = result
                .select(&title_link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve(base_url, href));

            let eprint_url = result
                .select(&pdf_link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve(base_url, href));

            let byline = result.select(&byline_sel).next().map(element_text);
            let (authors, year) = match byline {
                Some(line) => parse_byline(&line),
                None => (None, None),
            };

            let abstract_text = result.select(&snippet_sel).next().map(element_text);

            RawHit {
                title,
                authors,
                abstract_text,
                year,
                eprint_url,
                pub_url,
            }
        })
        .collect();

    Ok(hits)
}

/// Split a byline like `A Author, B Author - Venue, 2020 - host.org`
fn parse_byline(line: &str) -> (Option<Vec<String>>, Option<String>) {
    let mut parts = line.split(" - ");

    let authors = parts.next().map(|names| {
        names
            .split(',')
            .map(|name| name.trim().trim_end_matches('…').trim())
            .filter(|name| !name.is_empty() && *name != "…")
            .map(str::to_string)
            .collect::<Vec<_>>()
    });

    let year = parts
        .next()
        .and_then(|venue| YEAR.find_iter(venue).last())
        .map(|m| m.as_str().to_string());

    (authors.filter(|a| !a.is_empty()), year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_parse_byline() {
        let (authors, year) =
            parse_byline("TN Kipf, M Welling - arXiv preprint arXiv:1609.02907, 2016 - arxiv.org");
        assert_eq!(authors, Some(vec!["TN Kipf".to_string(), "M Welling".to_string()]));
        assert_eq!(year.as_deref(), Some("2016"));
    }

    #[test]
    fn test_parse_byline_without_year() {
        let (authors, year) = parse_byline("J Doe, R Roe… - Some Workshop - example.org");
        assert_eq!(authors, Some(vec!["J Doe".to_string(), "R Roe".to_string()]));
        assert_eq!(year, None);
    }

    #[test]
    fn test_page_url_encodes_query() {
        let source = ScholarSource::with_base_url("https://scholar.example").unwrap();
        let url = source.page_url("graph neural networks", 10).unwrap();
        assert_eq!(
            url.as_str(),
            "https://scholar.example/scholar?q=graph+neural+networks&hl=en&start=10"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ScholarSource::with_base_url("not a url"),
            Err(Error::InvalidInput(_))
        ));
    }

    /// Answer every connection on a local port with one fixed HTTP response
    async fn serve_http(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), hits)
    }

    const ONE_RESULT: &str = r#"<html><body>
        <div class="gs_r gs_or"><div class="gs_ri">
          <h3 class="gs_rt"><a href="/paper">Attention is all you need</a></h3>
          <div class="gs_a">A Vaswani, N Shazeer - Advances in neural information processing systems, 2017 - neurips.cc</div>
        </div></div>
    </body></html>"#;

    #[tokio::test]
    async fn test_next_page_parses_served_results() {
        let (base, hits) = serve_http("200 OK", ONE_RESULT).await;
        let source = ScholarSource::with_base_url(&base).unwrap();

        let page = source.next_page("transformers", 0).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title.as_deref(), Some("Attention is all you need"));
        assert_eq!(page[0].year.as_deref(), Some("2017"));
        assert_eq!(page[0].pub_url, Some(format!("{}/paper", base)));
    }

    #[tokio::test]
    async fn test_rate_limit_is_a_network_error() {
        let (base, _) = serve_http("429 Too Many Requests", "slow down").await;
        let source = ScholarSource::with_base_url(&base).unwrap();

        assert!(matches!(source.next_page("gnn", 0).await, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_captcha_page_is_a_network_error() {
        let body = r#"<html><body><div id="gs_captcha_ccl">Please show you're not a robot</div></body></html>"#;
        let (base, _) = serve_http("200 OK", body).await;
        let source = ScholarSource::with_base_url(&base).unwrap();

        assert!(matches!(source.next_page("gnn", 0).await, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_a_network_error() {
        let (base, _) = serve_http("503 Service Unavailable", "down").await;
        let source = ScholarSource::with_base_url(&base).unwrap();

        assert!(matches!(source.next_page("gnn", 0).await, Err(Error::Network(_))));
    }

    #[tokio::test]
    #[ignore = "Hits the live Google Scholar site"]
    async fn test_live_search() {
        let source = ScholarSource::new().unwrap();
        let hits = source.next_page("graph neural networks", 0).await.unwrap();
        assert!(!hits.is_empty());
    }
}
