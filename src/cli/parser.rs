//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// scour-rs: iterative web research from the command line.
///
/// Plans web searches, scrapes and summarizes the results, and streams
/// a cited answer once the evidence suffices.
#[derive(Parser, Debug)]
#[command(name = "scour-rs")]
#[command(version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a question on the web and stream a cited answer.
    ///
    /// Runs the full research loop: plan searches, crawl and summarize
    /// the results, and keep iterating until the evidence suffices or
    /// the step budget runs out. Requires an OpenAI-compatible API key
    /// and a Serper API key.
    #[command(after_help = r#"Examples:
  scour-rs ask "What changed in the latest TypeScript release?"
  scour-rs ask "best coffee roasters nearby" --city Berlin --country Germany
  scour-rs ask "rust async traits" --step-limit 3 --results 5
  scour-rs ask "compare QUIC and HTTP/2" --answer-model gpt-5.2-2025-12-11
  scour-rs --format json ask "who maintains serde?" | jq '.sources[].url'
  OPENAI_API_KEY=sk-... SERPER_API_KEY=... scour-rs ask "explain CRDTs"
"#)]
    Ask {
        /// The question to research.
        question: String,

        /// Iteration budget before the answer is forced.
        #[arg(long)]
        step_limit: Option<usize>,

        /// Organic results requested per search query.
        #[arg(long)]
        results: Option<usize>,

        /// Maximum concurrent summarizer calls.
        #[arg(long)]
        concurrency: Option<usize>,

        /// Model for the query planner.
        #[arg(long)]
        planner_model: Option<String>,

        /// Model for per-page summarization.
        #[arg(long)]
        summarizer_model: Option<String>,

        /// Model for the continue/answer selector.
        #[arg(long)]
        selector_model: Option<String>,

        /// Model for answer generation.
        #[arg(long)]
        answer_model: Option<String>,

        /// City hint for location-sensitive queries.
        #[arg(long)]
        city: Option<String>,

        /// Country hint for location-sensitive queries.
        #[arg(long)]
        country: Option<String>,

        /// Latitude hint for location-sensitive queries.
        #[arg(long, requires = "longitude")]
        latitude: Option<f64>,

        /// Longitude hint for location-sensitive queries.
        #[arg(long, requires = "latitude")]
        longitude: Option<f64>,

        /// Directory containing prompt template files.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,

        /// Log loop observations as JSON lines via tracing.
        #[arg(long)]
        observations: bool,
    },

    /// Prompt template operations (init, path).
    #[command(subcommand)]
    Prompts(PromptCommands),

    /// Configuration operations (show).
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Prompt template subcommands.
#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// Write default prompt templates to disk for customization.
    ///
    /// Creates markdown template files in the prompt directory so users
    /// can customize agent system prompts without recompiling.
    #[command(after_help = r#"Examples:
  scour-rs prompts init                        # Write to ~/.config/scour-rs/prompts/
  scour-rs prompts init --dir ./my-prompts     # Write to custom directory
"#)]
    Init {
        /// Target directory for prompt templates.
        ///
        /// Defaults to `~/.config/scour-rs/prompts/`.
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Print the prompt override directory the agent will read from.
    Path,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration with secrets redacted.
    #[command(after_help = r#"Examples:
  scour-rs config show                  # Resolved config as text
  scour-rs --format json config show    # Resolved config as JSON
"#)]
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_defaults() {
        let cli = Cli::try_parse_from(["scour-rs", "ask", "what is rust"])
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.format, "text");
        assert!(!cli.verbose);
        match cli.command {
            Commands::Ask {
                question,
                step_limit,
                results,
                observations,
                ..
            } => {
                assert_eq!(question, "what is rust");
                assert_eq!(step_limit, None);
                assert_eq!(results, None);
                assert!(!observations);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_ask_overrides() {
        let cli = Cli::try_parse_from([
            "scour-rs",
            "--format",
            "json",
            "ask",
            "q",
            "--step-limit",
            "3",
            "--results",
            "5",
            "--city",
            "Berlin",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Ask {
                step_limit,
                results,
                city,
                ..
            } => {
                assert_eq!(step_limit, Some(3));
                assert_eq!(results, Some(5));
                assert_eq!(city.as_deref(), Some("Berlin"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_latitude_requires_longitude() {
        let result = Cli::try_parse_from(["scour-rs", "ask", "q", "--latitude", "52.52"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from([
            "scour-rs",
            "ask",
            "q",
            "--latitude",
            "52.52",
            "--longitude",
            "13.4",
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_prompts_init_parse() {
        let cli = Cli::try_parse_from(["scour-rs", "prompts", "init", "--dir", "/tmp/p"])
            .unwrap_or_else(|_| unreachable!());
        match cli.command {
            Commands::Prompts(PromptCommands::Init { dir }) => {
                assert_eq!(dir, Some(PathBuf::from("/tmp/p")));
            }
            _ => unreachable!(),
        }
    }
}
