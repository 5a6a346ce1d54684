//! Page crawler.
//!
//! Fetches a batch of result URLs and extracts readable text. The batch
//! never fails because individual pages do: every URL gets its own
//! outcome, and callers inspect those rather than the aggregate flag.

use async_trait::async_trait;
use futures_util::future::join_all;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use crate::error::AgentError;

/// Content areas tried before falling back to `<body>`.
const CONTENT_SELECTORS: [&str; 7] = [
    "article",
    "main",
    "[role='main']",
    ".content",
    "#content",
    ".post-content",
    ".entry-content",
];

/// Character cap on the text extracted from one page.
const MAX_PAGE_CHARS: usize = 50_000;

/// Outcome of fetching one URL.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// The URL that was fetched.
    pub url: String,
    /// Extracted page text, when the fetch succeeded. May be empty for
    /// pages with no readable text.
    pub content: Option<String>,
    /// Failure description, when the fetch did not succeed.
    pub error: Option<String>,
}

impl CrawlOutcome {
    /// Successful fetch with extracted text.
    #[must_use]
    pub const fn ok(url: String, content: String) -> Self {
        Self {
            url,
            content: Some(content),
            error: None,
        }
    }

    /// Failed fetch with a reason.
    #[must_use]
    pub const fn failed(url: String, error: String) -> Self {
        Self {
            url,
            content: None,
            error: Some(error),
        }
    }

    /// Whether the fetch succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes for one batch of URLs, in input order.
#[derive(Debug, Clone, Default)]
pub struct CrawlBatch {
    /// Per-URL outcomes, one per input URL.
    pub outcomes: Vec<CrawlOutcome>,
}

impl CrawlBatch {
    /// Whether at least one URL in the batch was fetched.
    #[must_use]
    pub fn any_success(&self) -> bool {
        self.outcomes.iter().any(CrawlOutcome::is_success)
    }
}

/// Crawler the orchestrator hands each query's result URLs to.
#[async_trait]
pub trait CrawlProvider: Send + Sync {
    /// Fetches every URL, reporting each outcome independently.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Crawl`] only for adapter-level failures;
    /// individual URL failures are captured in their outcomes.
    async fn crawl_batch(&self, urls: &[String]) -> Result<CrawlBatch, AgentError>;
}

/// HTTP crawler that extracts readable text with CSS selectors.
#[derive(Debug, Clone)]
pub struct HttpCrawler {
    client: reqwest::Client,
}

impl HttpCrawler {
    /// Creates a crawler with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::HttpClient`] if the HTTP client cannot be
    /// constructed.
    pub fn new(timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scour-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AgentError::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Fetches one page, capturing any failure in the outcome.
    async fn fetch_page(&self, url_str: &str) -> CrawlOutcome {
        let url = match Url::parse(url_str) {
            Ok(u) => u,
            Err(e) => return CrawlOutcome::failed(url_str.to_string(), format!("invalid URL: {e}")),
        };

        if url.scheme() != "http" && url.scheme() != "https" {
            return CrawlOutcome::failed(
                url_str.to_string(),
                format!("unsupported scheme: {}", url.scheme()),
            );
        }

        let response = match self.client.get(url.as_str()).send().await {
            Ok(r) => r,
            Err(e) => return CrawlOutcome::failed(url_str.to_string(), format!("fetch failed: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            return CrawlOutcome::failed(url_str.to_string(), format!("HTTP {status}"));
        }

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("text/html"));

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return CrawlOutcome::failed(url_str.to_string(), format!("body read failed: {e}"));
            }
        };

        let text = if is_html {
            extract_text(&body)
        } else {
            cap_chars(body.split_whitespace().collect::<Vec<_>>().join(" "))
        };

        CrawlOutcome::ok(url_str.to_string(), text)
    }
}

#[async_trait]
impl CrawlProvider for HttpCrawler {
    async fn crawl_batch(&self, urls: &[String]) -> Result<CrawlBatch, AgentError> {
        let outcomes = join_all(urls.iter().map(|url| self.fetch_page(url))).await;
        Ok(CrawlBatch { outcomes })
    }
}

/// Extracts readable text from an HTML document.
///
/// Tries known content containers first and falls back to `<body>`,
/// then collapses all whitespace runs to single spaces.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    for selector_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            for element in document.select(&selector) {
                let text = element.text().collect::<Vec<_>>().join(" ");
                if !text.trim().is_empty() {
                    parts.push(text);
                }
            }
        }
        if !parts.is_empty() {
            break;
        }
    }

    if parts.is_empty()
        && let Ok(body_selector) = Selector::parse("body")
    {
        for element in document.select(&body_selector) {
            parts.push(element.text().collect::<Vec<_>>().join(" "));
        }
    }

    let joined = parts.join("\n\n");
    cap_chars(joined.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Caps extracted text at [`MAX_PAGE_CHARS`], marking the cut.
fn cap_chars(text: String) -> String {
    if text.chars().count() <= MAX_PAGE_CHARS {
        text
    } else {
        let cut: String = text.chars().take(MAX_PAGE_CHARS).collect();
        format!("{cut}...[truncated]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_prefers_content_areas() {
        let html = r#"
            <html>
            <body>
                <nav>Site navigation links</nav>
                <main>
                    <h1>Release Notes</h1>
                    <p>Version 2.0 shipped today.</p>
                </main>
                <footer>Copyright</footer>
            </body>
            </html>
        "#;
        let text = extract_text(html);
        assert!(text.contains("Version 2.0 shipped today."));
        assert!(!text.contains("Site navigation links"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_extract_text_body_fallback() {
        let html = "<html><body><p>Just a paragraph.</p></body></html>";
        let text = extract_text(html);
        assert!(text.contains("Just a paragraph."));
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let html = "<html><body><main>one\n\n   two\t\tthree</main></body></html>";
        assert_eq!(extract_text(html), "one two three");
    }

    #[test]
    fn test_extract_text_empty_page() {
        assert_eq!(extract_text("<html><body></body></html>"), "");
    }

    #[test]
    fn test_cap_chars_marks_truncation() {
        let long = "x".repeat(MAX_PAGE_CHARS + 10);
        let capped = cap_chars(long);
        assert!(capped.ends_with("...[truncated]"));
        assert_eq!(capped.chars().count(), MAX_PAGE_CHARS + "...[truncated]".len());
    }

    #[tokio::test]
    async fn test_crawl_batch_isolates_bad_urls() {
        let crawler = HttpCrawler::new(Duration::from_secs(5)).unwrap_or_else(|_| unreachable!());
        let urls = vec![
            "not a url at all".to_string(),
            "ftp://example.com/file".to_string(),
        ];
        let batch = crawler
            .crawl_batch(&urls)
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(batch.outcomes.len(), 2);
        assert!(!batch.any_success());
        assert!(
            batch.outcomes[0]
                .error
                .as_deref()
                .is_some_and(|e| e.contains("invalid URL"))
        );
        assert!(
            batch.outcomes[1]
                .error
                .as_deref()
                .is_some_and(|e| e.contains("unsupported scheme"))
        );
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = CrawlOutcome::ok("https://a".to_string(), "text".to_string());
        assert!(ok.is_success());
        assert_eq!(ok.content.as_deref(), Some("text"));

        let failed = CrawlOutcome::failed("https://b".to_string(), "HTTP 404".to_string());
        assert!(!failed.is_success());
        assert_eq!(failed.error.as_deref(), Some("HTTP 404"));
    }
}
