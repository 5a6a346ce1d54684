//! Iterative research agent.
//!
//! Provides an LLM-powered loop that plans web searches, gathers and
//! condenses page evidence, and decides each iteration whether to keep
//! digging or write the final cited answer. Uses a pluggable provider
//! abstraction backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! User question → Orchestrator
//!   ├── QueryPlanner (plans 1-5 searches per iteration)
//!   ├── Web search (one concurrent call per query)
//!   ├── Crawl → N pages per query
//!   │   └── PageSummarizer condenses each page → EvidenceEntry
//!   ├── ActionSelector (continue | answer)
//!   │   └── continue: loop again, bounded by the step budget
//!   └── AnswerGenerator → streamed markdown answer with citations
//! ```

pub mod answerer;
pub mod client;
pub mod config;
pub mod orchestrator;
pub mod planner;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod selector;
pub mod summarizer;
pub mod traits;

// Re-export key types
pub use answerer::{AnswerGenerator, AnswerSink, NullAnswerSink};
pub use config::AgentConfig;
pub use orchestrator::{Orchestrator, ResearchReport, ResearchRequest};
pub use planner::QueryPlanner;
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use selector::ActionSelector;
pub use summarizer::PageSummarizer;
pub use traits::Agent;
