//! Web search backend.
//!
//! One search call per planned query, fanned out concurrently by the
//! orchestrator. A call is all-or-nothing: partial results within a
//! single query are not surfaced, failures propagate.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::source::Source;
use crate::error::AgentError;

/// Serper search endpoint.
const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// One ranked result from the search backend.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    #[serde(rename = "link")]
    pub url: String,
    /// Short text extract chosen by the search engine.
    #[serde(default)]
    pub snippet: String,
    /// Publication date, when the engine reports one.
    #[serde(default)]
    pub date: Option<String>,
}

impl From<&SearchResult> for Source {
    fn from(result: &SearchResult) -> Self {
        Self {
            title: result.title.clone(),
            url: result.url.clone(),
            snippet: result.snippet.clone(),
            date: result.date.clone(),
            favicon: Source::derive_favicon(&result.url),
        }
    }
}

/// Ranked results for one query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Organic results in engine rank order.
    #[serde(default, rename = "organic")]
    pub results: Vec<SearchResult>,
}

/// Search backend the orchestrator fans queries out to.
///
/// The cancellation token comes from the caller's request lifecycle;
/// implementations should abandon in-flight work when it fires.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Runs one search, returning up to `count` ranked results.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Search`] on transport failure, a non-success
    /// HTTP status, an unparseable response, or cancellation.
    async fn search(
        &self,
        query: &str,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, AgentError>;
}

/// Google search via the Serper API.
#[derive(Debug, Clone)]
pub struct SerperSearch {
    client: reqwest::Client,
    api_key: String,
}

impl SerperSearch {
    /// Creates a Serper-backed search provider.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::HttpClient`] if the HTTP client cannot be
    /// constructed.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scour-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AgentError::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    fn name(&self) -> &'static str {
        "serper"
    }

    async fn search(
        &self,
        query: &str,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, AgentError> {
        let request = self
            .client
            .post(SERPER_ENDPOINT)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&json!({
                "q": query,
                "num": count
            }))
            .send();

        let response = tokio::select! {
            () = cancel.cancelled() => {
                return Err(AgentError::Search {
                    query: query.to_string(),
                    message: "cancelled".to_string(),
                });
            }
            response = request => response.map_err(|e| AgentError::Search {
                query: query.to_string(),
                message: format!("request failed: {e}"),
            })?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Search {
                query: query.to_string(),
                message: format!("HTTP {status}"),
            });
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| AgentError::Search {
                query: query.to_string(),
                message: format!("invalid response: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serper_response() {
        let json = r#"{
            "searchParameters": {"q": "rust"},
            "organic": [
                {
                    "title": "The Rust Programming Language",
                    "link": "https://www.rust-lang.org/",
                    "snippet": "A language empowering everyone.",
                    "date": "Jan 3, 2025",
                    "position": 1
                },
                {
                    "title": "Rust (programming language) - Wikipedia",
                    "link": "https://en.wikipedia.org/wiki/Rust_(programming_language)"
                }
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].title, "The Rust Programming Language");
        assert_eq!(parsed.results[0].date.as_deref(), Some("Jan 3, 2025"));
        // Missing snippet and date default rather than failing the parse.
        assert_eq!(parsed.results[1].snippet, "");
        assert_eq!(parsed.results[1].date, None);
    }

    #[test]
    fn test_parse_empty_organic() {
        let parsed: SearchResponse =
            serde_json::from_str(r#"{"searchParameters": {}}"#).unwrap_or_default();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn test_result_to_source_derives_favicon() {
        let result = SearchResult {
            title: "Docs".to_string(),
            url: "https://docs.rs/tokio".to_string(),
            snippet: "An async runtime.".to_string(),
            date: None,
        };
        let source = Source::from(&result);
        assert_eq!(source.url, "https://docs.rs/tokio");
        assert_eq!(
            source.favicon.as_deref(),
            Some("https://www.google.com/s2/favicons?sz=128&domain=docs.rs")
        );
    }

    #[tokio::test]
    async fn test_search_respects_cancellation() {
        let provider = SerperSearch::new("test-key", Duration::from_secs(5))
            .unwrap_or_else(|_| unreachable!());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = provider.search("anything", 10, &cancel).await;
        match result {
            Err(AgentError::Search { message, .. }) => assert!(message.contains("cancelled")),
            _ => unreachable!(),
        }
    }
}
