//! One-way notifications emitted by the agent loop.
//!
//! The loop reports progress (plan produced, sources found, action chosen,
//! usage totals) through a fire-and-forget sink so that a UI or transport
//! can display it live. The variant set is closed: consumers can match
//! exhaustively.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::core::action::Action;
use crate::core::message::TokenUsage;
use crate::core::plan::PlannedQuery;
use crate::core::source::Source;

/// A progress notification emitted at a defined point in the loop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Observation {
    /// A research plan was produced.
    QueryPlan {
        /// The plan narrative.
        plan: String,
        /// The queries about to be issued.
        queries: Vec<PlannedQuery>,
    },
    /// New unique sources were found this iteration.
    SearchSources {
        /// Deduplicated sources in first-seen order.
        sources: Vec<Source>,
    },
    /// The action selector chose how to proceed.
    NewAction {
        /// The decision, including reasoning and any feedback.
        action: Action,
    },
    /// Cumulative token usage, reported once before answering.
    TokenUsage {
        /// Sum of all recorded model-call usage.
        usage: TokenUsage,
    },
}

impl Observation {
    /// The wire tag for this observation.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::QueryPlan { .. } => "query_plan",
            Self::SearchSources { .. } => "search_sources",
            Self::NewAction { .. } => "new_action",
            Self::TokenUsage { .. } => "token_usage",
        }
    }
}

/// Receives observations from the loop. Implementations must not block.
pub trait ObservationSink: Send + Sync {
    /// Deliver one observation. Errors are the sink's problem; the loop
    /// never waits on delivery.
    fn emit(&self, observation: Observation);
}

/// Sink that discards every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ObservationSink for NullSink {
    fn emit(&self, _observation: Observation) {}
}

/// Sink that forwards observations into an unbounded channel.
///
/// Dropped receivers are tolerated: a closed channel silently discards,
/// matching the fire-and-forget contract.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Observation>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Observation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ObservationSink for ChannelSink {
    fn emit(&self, observation: Observation) {
        let _ = self.tx.send(observation);
    }
}
