//! Research loop orchestrator.
//!
//! Drives the full question pipeline: plan queries → search → crawl →
//! summarize → decide, looping until the selector chooses to answer or
//! the step budget runs out, then streams the final cited answer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{join_all, try_join_all};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::answerer::{AnswerGenerator, AnswerSink};
use super::config::AgentConfig;
use super::planner::QueryPlanner;
use super::prompt::{PageContext, PromptSet};
use super::provider::LlmProvider;
use super::selector::ActionSelector;
use super::summarizer::PageSummarizer;
use crate::core::evidence::{EvidenceEntry, EvidenceStore, RequestHints, SearchRecord};
use crate::core::message::{ChatMessage, TokenUsage, user_message};
use crate::core::observation::{Observation, ObservationSink};
use crate::core::plan::ResearchPlan;
use crate::core::source::{Source, collect_sources};
use crate::error::AgentError;
use crate::web::crawl::{CrawlBatch, CrawlOutcome, CrawlProvider};
use crate::web::search::{SearchProvider, SearchResponse, SearchResult};

/// One research question plus its request-scoped context.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    /// Conversation turns; the most recent user turn is the question.
    pub messages: Vec<ChatMessage>,
    /// Geographic hints for query planning.
    pub hints: Option<RequestHints>,
    /// Cancellation signal from the caller's request lifecycle.
    pub cancel: CancellationToken,
}

impl ResearchRequest {
    /// Creates a request from existing conversation turns.
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            hints: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a request from a single question.
    #[must_use]
    pub fn question(text: &str) -> Self {
        Self::new(vec![user_message(text)])
    }

    /// Attaches geographic hints.
    #[must_use]
    pub fn with_hints(mut self, hints: RequestHints) -> Self {
        self.hints = Some(hints);
        self
    }

    /// Attaches an external cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Result of one completed research run.
#[derive(Debug, Clone)]
pub struct ResearchReport {
    /// The final answer, as streamed to the sink.
    pub answer: String,
    /// Every distinct source consulted, first-seen order.
    pub sources: Vec<Source>,
    /// Number of plan/search/decide iterations executed.
    pub iterations: usize,
    /// Whether the step budget forced the answer.
    pub forced_final: bool,
    /// Cumulative token usage across all model calls.
    pub total_usage: TokenUsage,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Orchestrates the iterative research loop.
///
/// Owns the [`EvidenceStore`] mutably for the lifetime of one run and is
/// its only writer; agents and adapters see read-only snapshots. All
/// fan-out work is joined before any mutation is applied.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    crawler: Arc<dyn CrawlProvider>,
    config: AgentConfig,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given collaborators.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        crawler: Arc<dyn CrawlProvider>,
        config: AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self::with_prompts(provider, search, crawler, config, prompts)
    }

    /// Creates a new orchestrator with explicit prompts.
    #[must_use]
    pub const fn with_prompts(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        crawler: Arc<dyn CrawlProvider>,
        config: AgentConfig,
        prompts: PromptSet,
    ) -> Self {
        Self {
            provider,
            search,
            crawler,
            config,
            prompts,
        }
    }

    /// Runs the research loop for one question.
    ///
    /// Iterates planning, searching, summarizing, and deciding until the
    /// selector answers or the step budget runs out, then streams exactly
    /// one answer through `sink`. Observations are emitted as each phase
    /// completes.
    ///
    /// # Errors
    ///
    /// Planner, search, and selector failures abort the run. Crawl and
    /// summarization failures never do; they degrade to substitute
    /// evidence entries.
    #[allow(clippy::too_many_lines)]
    pub async fn run(
        &self,
        request: ResearchRequest,
        observations: &dyn ObservationSink,
        sink: &mut dyn AnswerSink,
    ) -> Result<ResearchReport, AgentError> {
        let start = Instant::now();
        let ResearchRequest {
            messages,
            hints,
            cancel,
        } = request;

        let mut evidence = EvidenceStore::new(messages, hints);
        if evidence.question().is_none_or(|q| q.trim().is_empty()) {
            return Err(AgentError::Orchestration {
                message: "request contains no user question".to_string(),
            });
        }

        let planner = QueryPlanner::new(&self.config, self.prompts.planner.clone());
        let summarizer = PageSummarizer::new(&self.config, self.prompts.summarizer.clone());
        let selector = ActionSelector::new(&self.config, self.prompts.selector.clone());

        let mut all_sources: Vec<Source> = Vec::new();
        let mut iterations: usize = 0;

        let is_final = loop {
            iterations += 1;

            let (plan, usage) = planner.plan(&*self.provider, &evidence).await?;
            if let Some(usage) = usage {
                evidence.record_usage("planner", usage);
            }
            debug!(
                iteration = iterations,
                queries = plan.queries.len(),
                "research plan produced"
            );
            observations.emit(Observation::QueryPlan {
                plan: plan.plan.clone(),
                queries: plan.queries.clone(),
            });

            // One concurrent search per planned query. Completion order is
            // arbitrary but try_join_all returns responses in input order,
            // so evidence stays aligned with the plan.
            let responses = try_join_all(plan.queries.iter().map(|planned| {
                self.search
                    .search(&planned.query, self.config.search_result_count, &cancel)
            }))
            .await?;

            let iteration_sources = collect_sources(
                responses
                    .iter()
                    .flat_map(|response| response.results.iter().map(Source::from)),
            );
            if !iteration_sources.is_empty() {
                observations.emit(Observation::SearchSources {
                    sources: iteration_sources.clone(),
                });
            }
            all_sources.extend(iteration_sources);

            let prior_queries: Vec<String> = evidence
                .search_history()
                .iter()
                .map(|record| record.query.clone())
                .collect();
            let (records, summary_usage) = self
                .gather_evidence(&summarizer, &plan, responses, &prior_queries)
                .await;
            for record in records {
                evidence.record_search(record);
            }
            if !summary_usage.is_empty() {
                evidence.record_usage("summarizer", summary_usage);
            }

            let (action, usage) = selector.decide(&*self.provider, &evidence).await?;
            if let Some(usage) = usage {
                evidence.record_usage("selector", usage);
            }
            evidence.record_feedback(action.feedback());
            debug!(iteration = iterations, action = %action, "action chosen");
            observations.emit(Observation::NewAction {
                action: action.clone(),
            });

            if action.is_answer() {
                break false;
            }
            let step = evidence.advance_step();
            if step >= self.config.step_limit {
                info!(step, "step budget exhausted, forcing final answer");
                break true;
            }
        };

        let total_usage = evidence.total_usage();
        if !total_usage.is_empty() {
            observations.emit(Observation::TokenUsage { usage: total_usage });
        }

        // The loop's single exit into text generation.
        let answerer = AnswerGenerator::new(&self.config, self.prompts.answer.clone());
        let answer = answerer
            .generate(&*self.provider, &evidence, is_final, sink)
            .await?;

        Ok(ResearchReport {
            answer,
            sources: collect_sources(all_sources),
            iterations,
            forced_final: is_final,
            total_usage,
            elapsed: start.elapsed(),
        })
    }

    /// Crawls and summarizes every query's results concurrently.
    ///
    /// Records come back in plan order with results in search-rank order,
    /// regardless of network completion order.
    async fn gather_evidence(
        &self,
        summarizer: &PageSummarizer,
        plan: &ResearchPlan,
        responses: Vec<SearchResponse>,
        prior_queries: &[String],
    ) -> (Vec<SearchRecord>, TokenUsage) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));

        let per_query = plan.queries.iter().zip(responses).map(|(planned, response)| {
            self.collect_query_record(
                summarizer,
                &planned.query,
                response,
                prior_queries,
                Arc::clone(&semaphore),
            )
        });

        let collected = join_all(per_query).await;

        let mut records = Vec::with_capacity(collected.len());
        let mut usage = TokenUsage::default();
        for (record, record_usage) in collected {
            usage = usage.saturating_add(record_usage);
            records.push(record);
        }
        (records, usage)
    }

    /// Builds one query's evidence record from a crawl batch and a
    /// summarizer fan-out.
    async fn collect_query_record(
        &self,
        summarizer: &PageSummarizer,
        query: &str,
        response: SearchResponse,
        prior_queries: &[String],
        semaphore: Arc<Semaphore>,
    ) -> (SearchRecord, TokenUsage) {
        let urls: Vec<String> = response
            .results
            .iter()
            .map(|result| result.url.clone())
            .collect();

        // An adapter-level crawl failure degrades to per-URL failures so
        // the iteration still gets an evidence entry for every result.
        let batch = match self.crawler.crawl_batch(&urls).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(query, error = %e, "crawl batch failed, substituting per-URL failures");
                CrawlBatch {
                    outcomes: urls
                        .iter()
                        .map(|url| CrawlOutcome::failed(url.clone(), e.to_string()))
                        .collect(),
                }
            }
        };

        let per_result = response.results.iter().enumerate().map(|(i, result)| {
            self.summarize_result(
                summarizer,
                query,
                result,
                batch.outcomes.get(i),
                prior_queries,
                Arc::clone(&semaphore),
            )
        });

        let entries = join_all(per_result).await;

        let mut results = Vec::with_capacity(entries.len());
        let mut usage = TokenUsage::default();
        for (entry, entry_usage) in entries {
            if let Some(entry_usage) = entry_usage {
                usage = usage.saturating_add(entry_usage);
            }
            results.push(entry);
        }

        (
            SearchRecord {
                query: query.to_string(),
                results,
            },
            usage,
        )
    }

    /// Produces the evidence entry for one search result.
    ///
    /// Failed or empty crawls get placeholder text without a model call;
    /// everything else goes through the summarizer, which degrades
    /// internally rather than failing.
    async fn summarize_result(
        &self,
        summarizer: &PageSummarizer,
        query: &str,
        result: &SearchResult,
        outcome: Option<&CrawlOutcome>,
        prior_queries: &[String],
        semaphore: Arc<Semaphore>,
    ) -> (EvidenceEntry, Option<TokenUsage>) {
        let (scraped_content, usage) = match outcome {
            None => (
                PageSummarizer::scrape_failure_text("no crawl outcome returned", &result.snippet),
                None,
            ),
            Some(outcome) if !outcome.is_success() => {
                let error = outcome.error.as_deref().unwrap_or("unknown error");
                (
                    PageSummarizer::scrape_failure_text(error, &result.snippet),
                    None,
                )
            }
            Some(outcome) => {
                let text = outcome.content.as_deref().unwrap_or("");
                if text.trim().is_empty() {
                    (PageSummarizer::empty_page_text(&result.snippet), None)
                } else {
                    // The semaphore is never closed; a failed acquire only
                    // loses the concurrency bound, not the work.
                    let _permit = semaphore.acquire().await.ok();
                    let page = PageContext {
                        title: &result.title,
                        url: &result.url,
                        snippet: &result.snippet,
                        date: result.date.as_deref(),
                        content: text,
                    };
                    summarizer
                        .summarize(&*self.provider, query, &page, prior_queries)
                        .await
                }
            }
        };

        (
            EvidenceEntry {
                date: result.date.clone(),
                title: result.title.clone(),
                url: result.url.clone(),
                snippet: result.snippet.clone(),
                scraped_content,
            },
            usage,
        )
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("search", &self.search.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
