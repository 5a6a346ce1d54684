//! scour-rs: an iterative deep-research agent.
//!
//! Answers a question by looping through plan → search → crawl →
//! summarize → decide until the evidence suffices or a step budget runs
//! out, then streams one final answer with inline citations.
//!
//! # Architecture
//!
//! - [`core`]: loop-agnostic data types (evidence, actions, plans,
//!   sources, observations, provider-neutral chat messages).
//! - [`agent`]: the loop itself, split into planner, summarizer,
//!   selector, and answer generator, driven by the
//!   [`agent::Orchestrator`] over a pluggable [`agent::LlmProvider`].
//! - [`web`]: external adapters for Serper search and HTTP crawling.
//! - [`cli`]: the `scour-rs` binary's argument parsing and commands.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use scour_rs::agent::answerer::NullAnswerSink;
//! use scour_rs::agent::client::create_provider;
//! use scour_rs::agent::{AgentConfig, Orchestrator, ResearchRequest};
//! use scour_rs::core::observation::NullSink;
//! use scour_rs::web::{HttpCrawler, SerperSearch};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::from_env()?;
//! let search_key = config.search_api_key.clone().unwrap_or_default();
//!
//! let provider = create_provider(&config)?;
//! let search = SerperSearch::new(search_key, Duration::from_secs(30))?;
//! let crawler = HttpCrawler::new(config.crawl_timeout)?;
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::from(provider),
//!     Arc::new(search),
//!     Arc::new(crawler),
//!     config,
//! );
//!
//! let mut sink = NullAnswerSink;
//! let report = orchestrator
//!     .run(
//!         ResearchRequest::question("What is the latest Rust release?"),
//!         &NullSink,
//!         &mut sink,
//!     )
//!     .await?;
//! # let _ = report.answer;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod web;

pub use agent::{AgentConfig, Orchestrator, ResearchReport, ResearchRequest};
pub use error::{AgentError, FailureKind};
