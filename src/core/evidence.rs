//! Per-question evidence accumulated by the agent loop.
//!
//! One [`EvidenceStore`] exists per user question. The orchestrator owns it
//! mutably for the lifetime of the loop and is the only writer; every other
//! component receives a shared borrow as a read-only snapshot. All fan-out
//! work is joined before any mutation is applied, so no locking is needed.

use serde::{Deserialize, Serialize};

use crate::core::message::{ChatMessage, Role, TokenUsage};

/// Optional geographic hints attached to the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestHints {
    /// Request latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Request longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// City name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Country name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl RequestHints {
    /// Renders the hints as a single prompt-friendly line, or `None`
    /// when no field is set.
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(city) = &self.city {
            parts.push(city.clone());
        }
        if let Some(country) = &self.country {
            parts.push(country.clone());
        }
        let mut line = parts.join(", ");
        if let (Some(lat), Some(lon)) = (self.latitude, self.longitude) {
            if line.is_empty() {
                line = format!("lat {lat}, lon {lon}");
            } else {
                line.push_str(&format!(" (lat {lat}, lon {lon})"));
            }
        }
        if line.is_empty() { None } else { Some(line) }
    }
}

/// One search result after crawling and summarization.
///
/// `scraped_content` is never empty: the summarizer fallback chain
/// guarantees a substitute string for every failure mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    /// Publication date, when the search backend reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Original search snippet.
    pub snippet: String,
    /// Summarized page content, or a fallback substitute.
    pub scraped_content: String,
}

/// One query and everything it yielded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// The query as issued.
    pub query: String,
    /// Per-result evidence, in search-ranking order.
    pub results: Vec<EvidenceEntry>,
}

/// One usage report from a model call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Which component made the call.
    pub source: String,
    /// Tokens consumed by the call.
    pub usage: TokenUsage,
}

/// Accumulated evidence for one user question.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    messages: Vec<ChatMessage>,
    step: usize,
    search_history: Vec<SearchRecord>,
    latest_feedback: Option<String>,
    request_hints: Option<RequestHints>,
    usage_log: Vec<UsageEntry>,
}

impl EvidenceStore {
    /// Creates a fresh store for one question.
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>, request_hints: Option<RequestHints>) -> Self {
        Self {
            messages,
            step: 0,
            search_history: Vec::new(),
            latest_feedback: None,
            request_hints,
            usage_log: Vec::new(),
        }
    }

    /// Prior conversation turns (read-only input).
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The user question driving this run: the most recent user turn.
    #[must_use]
    pub fn question(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Current iteration count.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Increments the iteration counter and returns the new value.
    pub const fn advance_step(&mut self) -> usize {
        self.step += 1;
        self.step
    }

    /// All search records appended so far, in iteration order.
    #[must_use]
    pub fn search_history(&self) -> &[SearchRecord] {
        &self.search_history
    }

    /// Appends one query's evidence. History is append-only.
    pub fn record_search(&mut self, record: SearchRecord) {
        self.search_history.push(record);
    }

    /// Total number of evidence entries across all queries.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.search_history.iter().map(|r| r.results.len()).sum()
    }

    /// The most recent evaluator feedback, if any iteration provided one.
    #[must_use]
    pub fn latest_feedback(&self) -> Option<&str> {
        self.latest_feedback.as_deref()
    }

    /// Stores evaluator feedback. Only an explicitly provided, non-empty
    /// value overwrites; `None` or blank input leaves earlier feedback
    /// in place.
    pub fn record_feedback(&mut self, feedback: Option<&str>) {
        if let Some(text) = feedback
            && !text.trim().is_empty()
        {
            self.latest_feedback = Some(text.to_string());
        }
    }

    /// Geographic hints, when the request carried them.
    #[must_use]
    pub const fn request_hints(&self) -> Option<&RequestHints> {
        self.request_hints.as_ref()
    }

    /// Appends one usage report.
    pub fn record_usage(&mut self, source: &str, usage: TokenUsage) {
        self.usage_log.push(UsageEntry {
            source: source.to_string(),
            usage,
        });
    }

    /// The raw usage log, in call order.
    #[must_use]
    pub fn usage_log(&self) -> &[UsageEntry] {
        &self.usage_log
    }

    /// Cumulative token usage across all recorded calls.
    #[must_use]
    pub fn total_usage(&self) -> TokenUsage {
        self.usage_log
            .iter()
            .fold(TokenUsage::default(), |acc, entry| {
                acc.saturating_add(entry.usage)
            })
    }
}
