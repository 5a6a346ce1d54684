//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Commands return
//! their output as a string; the `ask` command additionally streams the
//! answer to stdout as it is generated, before the trailer is returned.

#![allow(clippy::too_many_lines)]

use std::fmt::Write as FmtWrite;
use std::io::{self, Write as IoWrite};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agent::answerer::{AnswerSink, NullAnswerSink};
use crate::agent::client::create_provider;
use crate::agent::config::AgentConfig;
use crate::agent::orchestrator::{Orchestrator, ResearchReport, ResearchRequest};
use crate::agent::prompt::PromptSet;
use crate::cli::parser::{Cli, Commands, ConfigCommands, PromptCommands};
use crate::core::evidence::RequestHints;
use crate::core::observation::{Observation, ObservationSink};
use crate::error::{CommandError, Result};
use crate::web::crawl::HttpCrawler;
use crate::web::search::SerperSearch;

/// Request timeout for the search backend.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name, defaulting to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Pretty-prints a JSON value. Serialization of `serde_json::Value`
/// cannot fail, so an empty string stands in for the impossible case.
fn to_pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

// ==================== Parameter Structs ====================

/// Parameters for the ask command.
#[derive(Debug, Clone, Default)]
pub struct AskParams<'a> {
    /// The question to research.
    pub question: &'a str,
    /// Iteration budget before the answer is forced.
    pub step_limit: Option<usize>,
    /// Organic results requested per search query.
    pub results: Option<usize>,
    /// Maximum concurrent summarizer calls.
    pub concurrency: Option<usize>,
    /// Model for the query planner.
    pub planner_model: Option<&'a str>,
    /// Model for per-page summarization.
    pub summarizer_model: Option<&'a str>,
    /// Model for the continue/answer selector.
    pub selector_model: Option<&'a str>,
    /// Model for answer generation.
    pub answer_model: Option<&'a str>,
    /// City hint for location-sensitive queries.
    pub city: Option<&'a str>,
    /// Country hint for location-sensitive queries.
    pub country: Option<&'a str>,
    /// Latitude hint for location-sensitive queries.
    pub latitude: Option<f64>,
    /// Longitude hint for location-sensitive queries.
    pub longitude: Option<f64>,
    /// Directory containing prompt template files.
    pub prompt_dir: Option<&'a std::path::Path>,
    /// Log loop observations as JSON lines via tracing.
    pub observations: bool,
}

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Ask {
            question,
            step_limit,
            results,
            concurrency,
            planner_model,
            summarizer_model,
            selector_model,
            answer_model,
            city,
            country,
            latitude,
            longitude,
            prompt_dir,
            observations,
        } => {
            let params = AskParams {
                question,
                step_limit: *step_limit,
                results: *results,
                concurrency: *concurrency,
                planner_model: planner_model.as_deref(),
                summarizer_model: summarizer_model.as_deref(),
                selector_model: selector_model.as_deref(),
                answer_model: answer_model.as_deref(),
                city: city.as_deref(),
                country: country.as_deref(),
                latitude: *latitude,
                longitude: *longitude,
                prompt_dir: prompt_dir.as_deref(),
                observations: *observations,
            };
            cmd_ask(&params, format)
        }
        Commands::Prompts(sub) => match sub {
            PromptCommands::Init { dir } => cmd_prompts_init(dir.as_deref(), format),
            PromptCommands::Path => cmd_prompts_path(format),
        },
        Commands::Config(sub) => match sub {
            ConfigCommands::Show => cmd_config_show(format),
        },
    }
}

// ==================== Sinks ====================

/// Streams answer deltas straight to stdout as they arrive.
///
/// Writes are best-effort: a broken pipe mid-stream is not worth more
/// than the truncated output the reader already observed.
struct StdoutStreamSink {
    out: io::Stdout,
}

impl StdoutStreamSink {
    fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl AnswerSink for StdoutStreamSink {
    fn delta(&mut self, text: &str) {
        let mut handle = self.out.lock();
        let _ = handle.write_all(text.as_bytes());
        let _ = handle.flush();
    }

    fn finish(&mut self, _full_text: &str) {
        let mut handle = self.out.lock();
        let _ = handle.write_all(b"\n");
        let _ = handle.flush();
    }
}

/// Forwards loop observations to the tracing subscriber.
///
/// With `as_json` set, each observation is logged at info level as one
/// JSON line; otherwise a short summary is logged at debug level.
struct ObservationLogger {
    as_json: bool,
}

impl ObservationSink for ObservationLogger {
    fn emit(&self, observation: Observation) {
        if self.as_json {
            let line = serde_json::to_string(&observation).unwrap_or_default();
            info!(target: "scour_rs::observe", "{line}");
            return;
        }
        match &observation {
            Observation::QueryPlan { queries, .. } => {
                debug!(queries = queries.len(), "research plan produced");
            }
            Observation::SearchSources { sources } => {
                debug!(sources = sources.len(), "new sources found");
            }
            Observation::NewAction { action } => {
                debug!(action = %action, reasoning = action.reasoning(), "action chosen");
            }
            Observation::TokenUsage { usage } => {
                debug!(total_tokens = usage.total_tokens, "token usage");
            }
        }
    }
}

// ==================== Command Implementations ====================

fn cmd_ask(params: &AskParams<'_>, format: OutputFormat) -> Result<String> {
    if params.question.trim().is_empty() {
        return Err(CommandError::InvalidArguments(
            "question must not be empty".to_string(),
        ));
    }

    // Build agent configuration from env + CLI overrides
    let mut builder = AgentConfig::builder().from_env();
    if let Some(n) = params.step_limit {
        builder = builder.step_limit(n);
    }
    if let Some(n) = params.results {
        builder = builder.search_result_count(n);
    }
    if let Some(n) = params.concurrency {
        builder = builder.max_concurrency(n);
    }
    if let Some(model) = params.planner_model {
        builder = builder.planner_model(model);
    }
    if let Some(model) = params.summarizer_model {
        builder = builder.summarizer_model(model);
    }
    if let Some(model) = params.selector_model {
        builder = builder.selector_model(model);
    }
    if let Some(model) = params.answer_model {
        builder = builder.answer_model(model);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }

    let config = builder
        .build()
        .map_err(|e| CommandError::ExecutionFailed(format!("configuration error: {e}")))?;

    let search_key = config.search_api_key.clone().ok_or_else(|| {
        CommandError::ExecutionFailed(
            "search API key missing: set SERPER_API_KEY or SCOUR_SEARCH_API_KEY".to_string(),
        )
    })?;

    let provider = create_provider(&config)
        .map_err(|e| CommandError::ExecutionFailed(format!("provider creation failed: {e}")))?;
    let search = SerperSearch::new(search_key, SEARCH_TIMEOUT)?;
    let crawler = HttpCrawler::new(config.crawl_timeout)?;

    let hints = request_hints(params);
    let orchestrator = Orchestrator::new(
        Arc::from(provider),
        Arc::new(search),
        Arc::new(crawler),
        config,
    );
    let logger = ObservationLogger {
        as_json: params.observations,
    };

    // Create tokio runtime as sync/async bridge
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("failed to create async runtime: {e}"))
    })?;

    let result = rt.block_on(async {
        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher.cancel();
            }
        });

        let mut request = ResearchRequest::question(params.question).with_cancellation(cancel);
        if let Some(hints) = hints {
            request = request.with_hints(hints);
        }

        // JSON mode holds the answer for the report instead of streaming.
        match format {
            OutputFormat::Text => {
                let mut sink = StdoutStreamSink::new();
                orchestrator.run(request, &logger, &mut sink).await
            }
            OutputFormat::Json => {
                let mut sink = NullAnswerSink;
                orchestrator.run(request, &logger, &mut sink).await
            }
        }
    });

    let report = result
        .map_err(|e| CommandError::ExecutionFailed(format!("research failed: {e}")))?;

    match format {
        OutputFormat::Text => Ok(render_text_trailer(&report)),
        OutputFormat::Json => Ok(render_json_report(&report)),
    }
}

/// Builds location hints from the ask arguments, or `None` when unset.
fn request_hints(params: &AskParams<'_>) -> Option<RequestHints> {
    if params.city.is_none()
        && params.country.is_none()
        && params.latitude.is_none()
        && params.longitude.is_none()
    {
        return None;
    }
    Some(RequestHints {
        latitude: params.latitude,
        longitude: params.longitude,
        city: params.city.map(String::from),
        country: params.country.map(String::from),
    })
}

/// Renders the post-answer source list and run statistics.
fn render_text_trailer(report: &ResearchReport) -> String {
    let mut output = String::new();

    if !report.sources.is_empty() {
        output.push_str("\nSources:\n");
        for (i, source) in report.sources.iter().enumerate() {
            let _ = writeln!(output, "  {}. {}", i + 1, source.title);
            let _ = writeln!(output, "     {}", source.url);
        }
    }

    let budget_hint = if report.forced_final {
        " (budget reached)"
    } else {
        ""
    };
    let _ = write!(
        output,
        "\n---\nSteps: {}{budget_hint} | Sources: {} | Tokens: {} | Time: {:.1}s\n",
        report.iterations,
        report.sources.len(),
        report.total_usage.total_tokens,
        report.elapsed.as_secs_f64()
    );
    output
}

/// Renders the full run report as pretty JSON.
fn render_json_report(report: &ResearchReport) -> String {
    let json = serde_json::json!({
        "answer": report.answer,
        "sources": report.sources,
        "iterations": report.iterations,
        "forced_final": report.forced_final,
        "usage": report.total_usage,
        "elapsed_seconds": report.elapsed.as_secs_f64(),
    });
    to_pretty_json(&json)
}

fn cmd_prompts_init(dir: Option<&std::path::Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(std::path::PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    let _ = writeln!(
                        output,
                        "  {}",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    );
                }
                output.push_str("\nEdit these files to customize agent system prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(to_pretty_json(&json))
        }
    }
}

fn cmd_prompts_path(format: OutputFormat) -> Result<String> {
    let dir = std::env::var("SCOUR_PROMPT_DIR")
        .ok()
        .map(std::path::PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    match format {
        OutputFormat::Text => Ok(format!("{}\n", dir.display())),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": dir.to_string_lossy(),
                "exists": dir.is_dir(),
            });
            Ok(to_pretty_json(&json))
        }
    }
}

fn cmd_config_show(format: OutputFormat) -> Result<String> {
    let mut builder = AgentConfig::builder().from_env();
    // Resolution should still render when no key is configured.
    let key_present =
        std::env::var("OPENAI_API_KEY").is_ok() || std::env::var("SCOUR_API_KEY").is_ok();
    if !key_present {
        builder = builder.api_key("");
    }
    let config = builder
        .build()
        .map_err(|e| CommandError::ExecutionFailed(format!("configuration error: {e}")))?;

    let api_key = if config.api_key.is_empty() {
        "(not set)"
    } else {
        "(set)"
    };
    let search_api_key = config.search_api_key.as_ref().map_or("(not set)", |key| {
        if key.is_empty() { "(not set)" } else { "(set)" }
    });
    let prompt_dir = config
        .prompt_dir
        .as_ref()
        .map(|p| p.display().to_string())
        .or_else(|| PromptSet::default_dir().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "(none)".to_string());

    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Provider:          {}", config.provider);
            let _ = writeln!(
                output,
                "Base URL:          {}",
                config.base_url.as_deref().unwrap_or("(default)")
            );
            let _ = writeln!(output, "Planner model:     {}", config.planner_model);
            let _ = writeln!(output, "Summarizer model:  {}", config.summarizer_model);
            let _ = writeln!(output, "Selector model:    {}", config.selector_model);
            let _ = writeln!(output, "Answer model:      {}", config.answer_model);
            let _ = writeln!(output, "Step limit:        {}", config.step_limit);
            let _ = writeln!(output, "Search results:    {}", config.search_result_count);
            let _ = writeln!(output, "Max concurrency:   {}", config.max_concurrency);
            let _ = writeln!(
                output,
                "Crawl timeout:     {}s",
                config.crawl_timeout.as_secs()
            );
            let _ = writeln!(output, "Prompt dir:        {prompt_dir}");
            let _ = writeln!(output, "API key:           {api_key}");
            let _ = writeln!(output, "Search API key:    {search_api_key}");
            Ok(output)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "provider": config.provider,
                "base_url": config.base_url,
                "planner_model": config.planner_model,
                "summarizer_model": config.summarizer_model,
                "selector_model": config.selector_model,
                "answer_model": config.answer_model,
                "step_limit": config.step_limit,
                "search_result_count": config.search_result_count,
                "max_concurrency": config.max_concurrency,
                "crawl_timeout_seconds": config.crawl_timeout.as_secs(),
                "prompt_dir": prompt_dir,
                "api_key_set": !config.api_key.is_empty(),
                "search_api_key_set": config.search_api_key.as_ref().is_some_and(|k| !k.is_empty()),
            });
            Ok(to_pretty_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::TokenUsage;
    use crate::core::source::Source;
    use tempfile::TempDir;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse(" JSON "), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_ask_rejects_blank_question() {
        let params = AskParams {
            question: "   ",
            ..AskParams::default()
        };
        let result = cmd_ask(&params, OutputFormat::Text);
        assert!(matches!(result, Err(CommandError::InvalidArguments(_))));
    }

    #[test]
    fn test_request_hints_from_args() {
        let params = AskParams {
            question: "q",
            city: Some("Berlin"),
            latitude: Some(52.52),
            longitude: Some(13.4),
            ..AskParams::default()
        };
        let hints = request_hints(&params).unwrap_or_else(|| unreachable!());
        assert_eq!(hints.city.as_deref(), Some("Berlin"));
        assert_eq!(hints.latitude, Some(52.52));

        let bare = AskParams {
            question: "q",
            ..AskParams::default()
        };
        assert!(request_hints(&bare).is_none());
    }

    fn sample_report() -> ResearchReport {
        ResearchReport {
            answer: "The answer.".to_string(),
            sources: vec![Source {
                title: "Release notes".to_string(),
                url: "https://example.com/notes".to_string(),
                snippet: "notes".to_string(),
                date: None,
                favicon: None,
            }],
            iterations: 2,
            forced_final: false,
            total_usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 50,
                total_tokens: 150,
            },
            elapsed: Duration::from_millis(2_500),
        }
    }

    #[test]
    fn test_text_trailer_lists_sources_and_stats() {
        let trailer = render_text_trailer(&sample_report());
        assert!(trailer.contains("Sources:"));
        assert!(trailer.contains("1. Release notes"));
        assert!(trailer.contains("https://example.com/notes"));
        assert!(trailer.contains("Steps: 2 |"));
        assert!(trailer.contains("Tokens: 150"));
        assert!(trailer.contains("Time: 2.5s"));
        assert!(!trailer.contains("budget reached"));
    }

    #[test]
    fn test_text_trailer_marks_forced_final() {
        let mut report = sample_report();
        report.forced_final = true;
        let trailer = render_text_trailer(&report);
        assert!(trailer.contains("Steps: 2 (budget reached)"));
    }

    #[test]
    fn test_json_report_shape() {
        let rendered = render_json_report(&sample_report());
        let value: serde_json::Value =
            serde_json::from_str(&rendered).unwrap_or_else(|_| unreachable!());
        assert_eq!(value["answer"], "The answer.");
        assert_eq!(value["iterations"], 2);
        assert_eq!(value["forced_final"], false);
        assert_eq!(value["sources"][0]["url"], "https://example.com/notes");
        assert_eq!(value["usage"]["total_tokens"], 150);
    }

    #[test]
    fn test_prompts_init_writes_then_skips() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());

        let first = cmd_prompts_init(Some(dir.path()), OutputFormat::Text)
            .unwrap_or_else(|_| unreachable!());
        assert!(first.contains("Wrote 4 prompt template(s)"));
        assert!(first.contains("planner.md"));

        let second = cmd_prompts_init(Some(dir.path()), OutputFormat::Text)
            .unwrap_or_else(|_| unreachable!());
        assert!(second.contains("already exist"));
    }

    #[test]
    fn test_prompts_init_json_output() {
        let dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let rendered = cmd_prompts_init(Some(dir.path()), OutputFormat::Json)
            .unwrap_or_else(|_| unreachable!());
        let value: serde_json::Value =
            serde_json::from_str(&rendered).unwrap_or_else(|_| unreachable!());
        assert_eq!(value["count"], 4);
    }
}
