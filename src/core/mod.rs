//! Domain model for the research loop.
//!
//! Everything the loop accumulates or emits lives here: the per-question
//! evidence store, research plans, continue/answer actions, deduplicated
//! sources, progress observations, and the provider-agnostic chat types.
//! The `agent` and `web` modules depend on `core`, never the other way
//! around.

pub mod action;
pub mod evidence;
pub mod message;
pub mod observation;
pub mod plan;
pub mod source;

// Re-export key types
pub use action::Action;
pub use evidence::{EvidenceEntry, EvidenceStore, RequestHints, SearchRecord, UsageEntry};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use observation::{ChannelSink, NullSink, Observation, ObservationSink};
pub use plan::{MAX_PLANNED_QUERIES, MIN_PLANNED_QUERIES, PlannedQuery, ResearchPlan};
pub use source::{Source, collect_sources};
