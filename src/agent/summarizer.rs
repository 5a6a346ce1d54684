//! Page summarizer agent.
//!
//! Condenses one scraped page into a query-focused summary. Summarization
//! is best-effort: every failure mode degrades to some non-empty text so
//! a bad page or a flaky model never costs the iteration its evidence.

use async_trait::async_trait;
use tracing::warn;

use super::config::AgentConfig;
use super::prompt::{PageContext, build_summarizer_prompt};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::message::TokenUsage;
use crate::error::{AgentError, FailureKind};

/// Agent that summarizes scraped pages against the active query.
///
/// [`PageSummarizer::summarize`] never fails. The degradation order is:
/// model summary, then raw page content (model overloaded), then the
/// original search snippet (any other model failure).
pub struct PageSummarizer {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl PageSummarizer {
    /// Creates a new summarizer with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.summarizer_model.clone(),
            max_tokens: config.summarizer_max_tokens,
            system_prompt,
        }
    }

    /// Summarizes one scraped page, degrading instead of failing.
    ///
    /// Returns the text to store as the result's scraped content, plus
    /// token usage when the model call succeeded and reported any.
    pub async fn summarize(
        &self,
        provider: &dyn LlmProvider,
        query: &str,
        page: &PageContext<'_>,
        prior_queries: &[String],
    ) -> (String, Option<TokenUsage>) {
        let user_msg = build_summarizer_prompt(query, page, prior_queries);

        match self.execute(provider, &user_msg).await {
            Ok(response) if !response.content.trim().is_empty() => {
                let usage = response.recorded_usage();
                (response.content, usage)
            }
            Ok(_) => {
                warn!(url = page.url, "summarizer returned no text, keeping snippet");
                (
                    format!(
                        "[Summary unavailable: empty response]\n\nOriginal snippet: {}",
                        page.snippet
                    ),
                    None,
                )
            }
            Err(e) if e.classify() == FailureKind::Overloaded => {
                warn!(url = page.url, error = %e, "summarizer overloaded, keeping raw page content");
                (
                    format!(
                        "[Summary unavailable (model overloaded); raw page content follows]\n\n{}",
                        page.content
                    ),
                    None,
                )
            }
            Err(e) => {
                warn!(url = page.url, error = %e, "summarizer failed, keeping snippet");
                (
                    format!(
                        "[Summary unavailable: {e}]\n\nOriginal snippet: {}",
                        page.snippet
                    ),
                    None,
                )
            }
        }
    }

    /// Placeholder evidence text for a URL the crawler could not fetch.
    #[must_use]
    pub fn scrape_failure_text(error: &str, snippet: &str) -> String {
        format!("[Failed to scrape: {error}]\n\nOriginal snippet: {snippet}")
    }

    /// Placeholder evidence text for a page that yielded no text.
    #[must_use]
    pub fn empty_page_text(snippet: &str) -> String {
        format!("[No content found on page]\n\nOriginal snippet: {snippet}")
    }
}

#[async_trait]
impl Agent for PageSummarizer {
    fn name(&self) -> &'static str {
        "summarizer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        0.0
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{ChatRequest, ChatResponse};

    use std::pin::Pin;

    use futures_util::Stream;

    /// Mock provider scripted to succeed with fixed content or fail
    /// with a fixed API error.
    struct MockProvider {
        content: Option<String>,
        error_message: String,
        error_status: Option<u16>,
    }

    impl MockProvider {
        fn succeeding(content: &str) -> Self {
            Self {
                content: Some(content.to_string()),
                error_message: String::new(),
                error_status: None,
            }
        }

        fn failing(message: &str, status: Option<u16>) -> Self {
            Self {
                content: None,
                error_message: message.to_string(),
                error_status: status,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            self.content.as_ref().map_or_else(
                || {
                    Err(AgentError::ApiRequest {
                        message: self.error_message.clone(),
                        status: self.error_status,
                        code: None,
                    })
                },
                |content| {
                    Ok(ChatResponse {
                        content: content.clone(),
                        usage: TokenUsage {
                            prompt_tokens: 100,
                            completion_tokens: 40,
                            total_tokens: 140,
                        },
                        finish_reason: Some("stop".to_string()),
                    })
                },
            )
        }

        async fn chat_stream(
            &self,
            _request: &ChatRequest,
        ) -> Result<Pin<Box<dyn Stream<Item = Result<String, AgentError>> + Send>>, AgentError>
        {
            Err(AgentError::Stream {
                message: "not implemented".to_string(),
            })
        }
    }

    fn test_summarizer() -> PageSummarizer {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        PageSummarizer::new(&config, "summarize".to_string())
    }

    fn test_page() -> PageContext<'static> {
        PageContext {
            title: "Release notes",
            url: "https://example.com/notes",
            snippet: "the original snippet",
            date: None,
            content: "the full raw page text",
        }
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let provider = MockProvider::succeeding("a dense summary");
        let (text, usage) = test_summarizer()
            .summarize(&provider, "query", &test_page(), &[])
            .await;
        assert_eq!(text, "a dense summary");
        assert_eq!(usage.map(|u| u.total_tokens), Some(140));
    }

    #[tokio::test]
    async fn test_summarize_overloaded_keeps_raw_content() {
        let provider = MockProvider::failing("Overloaded", Some(529));
        let (text, usage) = test_summarizer()
            .summarize(&provider, "query", &test_page(), &[])
            .await;
        assert!(text.contains("the full raw page text"));
        assert!(text.contains("overloaded"));
        assert!(usage.is_none());
    }

    #[tokio::test]
    async fn test_summarize_overload_detected_by_message() {
        let provider = MockProvider::failing("rate limit exceeded, slow down", None);
        let (text, _) = test_summarizer()
            .summarize(&provider, "query", &test_page(), &[])
            .await;
        assert!(text.contains("the full raw page text"));
    }

    #[tokio::test]
    async fn test_summarize_other_failure_keeps_snippet() {
        let provider = MockProvider::failing("invalid api key", Some(401));
        let (text, usage) = test_summarizer()
            .summarize(&provider, "query", &test_page(), &[])
            .await;
        assert!(text.contains("Summary unavailable"));
        assert!(text.contains("the original snippet"));
        assert!(!text.contains("the full raw page text"));
        assert!(usage.is_none());
    }

    #[tokio::test]
    async fn test_summarize_empty_response_keeps_snippet() {
        let provider = MockProvider::succeeding("   \n");
        let (text, usage) = test_summarizer()
            .summarize(&provider, "query", &test_page(), &[])
            .await;
        assert!(text.contains("the original snippet"));
        assert!(usage.is_none());
    }

    #[test]
    fn test_scrape_failure_text() {
        let text = PageSummarizer::scrape_failure_text("HTTP 404", "a snippet");
        assert!(text.contains("Failed to scrape"));
        assert!(text.contains("HTTP 404"));
        assert!(text.contains("a snippet"));
    }

    #[test]
    fn test_empty_page_text() {
        let text = PageSummarizer::empty_page_text("a snippet");
        assert!(text.contains("No content found"));
        assert!(text.contains("a snippet"));
    }

    #[test]
    fn test_agent_properties() {
        let agent = test_summarizer();
        assert_eq!(agent.name(), "summarizer");
        assert!(!agent.json_mode());
    }
}
