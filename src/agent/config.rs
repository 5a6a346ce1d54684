//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default iteration budget for one question.
const DEFAULT_STEP_LIMIT: usize = 10;
/// Default number of organic results requested per search query.
const DEFAULT_SEARCH_RESULTS: usize = 10;
/// Default maximum concurrent summarizer calls.
const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default planner max tokens. Plans are small JSON objects.
const DEFAULT_PLANNER_MAX_TOKENS: u32 = 1024;
/// Default summarizer max tokens.
const DEFAULT_SUMMARIZER_MAX_TOKENS: u32 = 2048;
/// Default selector max tokens. Reasoning plus feedback, nothing more.
const DEFAULT_SELECTOR_MAX_TOKENS: u32 = 1024;
/// Default answer max tokens.
const DEFAULT_ANSWER_MAX_TOKENS: u32 = 4096;
/// Default per-page crawl timeout in seconds.
const DEFAULT_CRAWL_TIMEOUT_SECS: u64 = 30;

/// Configuration for the research agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model for the query planner.
    pub planner_model: String,
    /// Model for per-page summarization.
    pub summarizer_model: String,
    /// Model for the action selector.
    pub selector_model: String,
    /// Model for answer generation.
    pub answer_model: String,
    /// Maximum tokens for planner responses.
    pub planner_max_tokens: u32,
    /// Maximum tokens for summarizer responses.
    pub summarizer_max_tokens: u32,
    /// Maximum tokens for selector responses.
    pub selector_max_tokens: u32,
    /// Maximum tokens for the answer.
    pub answer_max_tokens: u32,
    /// Iteration budget: the loop forces a final answer once the step
    /// counter reaches this value.
    pub step_limit: usize,
    /// Organic results requested per search query.
    pub search_result_count: usize,
    /// Maximum concurrent summarizer calls during fan-out.
    pub max_concurrency: usize,
    /// API key for the search backend, when one is configured.
    pub search_api_key: Option<String>,
    /// Per-page crawl timeout.
    pub crawl_timeout: Duration,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing
    /// files.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    planner_model: Option<String>,
    summarizer_model: Option<String>,
    selector_model: Option<String>,
    answer_model: Option<String>,
    planner_max_tokens: Option<u32>,
    summarizer_max_tokens: Option<u32>,
    selector_max_tokens: Option<u32>,
    answer_max_tokens: Option<u32>,
    step_limit: Option<usize>,
    search_result_count: Option<usize>,
    max_concurrency: Option<usize>,
    search_api_key: Option<String>,
    crawl_timeout: Option<Duration>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("SCOUR_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("SCOUR_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("SCOUR_BASE_URL"))
                .ok();
        }
        if self.planner_model.is_none() {
            self.planner_model = std::env::var("SCOUR_PLANNER_MODEL").ok();
        }
        if self.summarizer_model.is_none() {
            self.summarizer_model = std::env::var("SCOUR_SUMMARIZER_MODEL").ok();
        }
        if self.selector_model.is_none() {
            self.selector_model = std::env::var("SCOUR_SELECTOR_MODEL").ok();
        }
        if self.answer_model.is_none() {
            self.answer_model = std::env::var("SCOUR_ANSWER_MODEL").ok();
        }
        if self.planner_max_tokens.is_none() {
            self.planner_max_tokens = std::env::var("SCOUR_PLANNER_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.summarizer_max_tokens.is_none() {
            self.summarizer_max_tokens = std::env::var("SCOUR_SUMMARIZER_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.selector_max_tokens.is_none() {
            self.selector_max_tokens = std::env::var("SCOUR_SELECTOR_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.answer_max_tokens.is_none() {
            self.answer_max_tokens = std::env::var("SCOUR_ANSWER_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.step_limit.is_none() {
            self.step_limit = std::env::var("SCOUR_STEP_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.search_result_count.is_none() {
            self.search_result_count = std::env::var("SCOUR_SEARCH_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.max_concurrency.is_none() {
            self.max_concurrency = std::env::var("SCOUR_MAX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.search_api_key.is_none() {
            self.search_api_key = std::env::var("SERPER_API_KEY")
                .or_else(|_| std::env::var("SCOUR_SEARCH_API_KEY"))
                .ok();
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("SCOUR_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the planner model.
    #[must_use]
    pub fn planner_model(mut self, model: impl Into<String>) -> Self {
        self.planner_model = Some(model.into());
        self
    }

    /// Sets the summarizer model.
    #[must_use]
    pub fn summarizer_model(mut self, model: impl Into<String>) -> Self {
        self.summarizer_model = Some(model.into());
        self
    }

    /// Sets the selector model.
    #[must_use]
    pub fn selector_model(mut self, model: impl Into<String>) -> Self {
        self.selector_model = Some(model.into());
        self
    }

    /// Sets the answer model.
    #[must_use]
    pub fn answer_model(mut self, model: impl Into<String>) -> Self {
        self.answer_model = Some(model.into());
        self
    }

    /// Sets the planner max tokens.
    #[must_use]
    pub const fn planner_max_tokens(mut self, n: u32) -> Self {
        self.planner_max_tokens = Some(n);
        self
    }

    /// Sets the summarizer max tokens.
    #[must_use]
    pub const fn summarizer_max_tokens(mut self, n: u32) -> Self {
        self.summarizer_max_tokens = Some(n);
        self
    }

    /// Sets the selector max tokens.
    #[must_use]
    pub const fn selector_max_tokens(mut self, n: u32) -> Self {
        self.selector_max_tokens = Some(n);
        self
    }

    /// Sets the answer max tokens.
    #[must_use]
    pub const fn answer_max_tokens(mut self, n: u32) -> Self {
        self.answer_max_tokens = Some(n);
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub const fn step_limit(mut self, n: usize) -> Self {
        self.step_limit = Some(n);
        self
    }

    /// Sets the per-query search result count.
    #[must_use]
    pub const fn search_result_count(mut self, n: usize) -> Self {
        self.search_result_count = Some(n);
        self
    }

    /// Sets the maximum concurrent summarizer calls.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Sets the search backend API key.
    #[must_use]
    pub fn search_api_key(mut self, key: impl Into<String>) -> Self {
        self.search_api_key = Some(key.into());
        self
    }

    /// Sets the per-page crawl timeout.
    #[must_use]
    pub const fn crawl_timeout(mut self, duration: Duration) -> Self {
        self.crawl_timeout = Some(duration);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            planner_model: self
                .planner_model
                .unwrap_or_else(|| "gpt-5.2-2025-12-11".to_string()),
            summarizer_model: self
                .summarizer_model
                .unwrap_or_else(|| "gpt-5-mini-2025-08-07".to_string()),
            selector_model: self
                .selector_model
                .unwrap_or_else(|| "gpt-5.2-2025-12-11".to_string()),
            answer_model: self
                .answer_model
                .unwrap_or_else(|| "gpt-5.2-2025-12-11".to_string()),
            planner_max_tokens: self
                .planner_max_tokens
                .unwrap_or(DEFAULT_PLANNER_MAX_TOKENS),
            summarizer_max_tokens: self
                .summarizer_max_tokens
                .unwrap_or(DEFAULT_SUMMARIZER_MAX_TOKENS),
            selector_max_tokens: self
                .selector_max_tokens
                .unwrap_or(DEFAULT_SELECTOR_MAX_TOKENS),
            answer_max_tokens: self.answer_max_tokens.unwrap_or(DEFAULT_ANSWER_MAX_TOKENS),
            step_limit: self.step_limit.unwrap_or(DEFAULT_STEP_LIMIT),
            search_result_count: self.search_result_count.unwrap_or(DEFAULT_SEARCH_RESULTS),
            max_concurrency: self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY),
            search_api_key: self.search_api_key,
            crawl_timeout: self
                .crawl_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CRAWL_TIMEOUT_SECS)),
            prompt_dir: self.prompt_dir,
        })
    }
}
