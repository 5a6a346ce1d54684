//! Agent trait definition.
//!
//! The planner, summarizer, selector, and answer generator all implement
//! this trait, which fixes their role (system prompt, model, sampling)
//! and provides the shared execute path the orchestrator calls.

use async_trait::async_trait;

use crate::core::message::{ChatRequest, ChatResponse, TokenUsage, system_message, user_message};
use crate::error::AgentError;

use super::provider::LlmProvider;

/// Response from an agent execution.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The agent's text output.
    pub content: String,
    /// Token usage for this call.
    pub usage: TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

impl AgentResponse {
    /// Returns the token usage when the provider reported any.
    #[must_use]
    pub fn recorded_usage(&self) -> Option<TokenUsage> {
        (!self.usage.is_empty()).then_some(self.usage)
    }

    /// Whether generation stopped because the token budget ran out.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.finish_reason.as_deref().is_some_and(|r| r == "length")
    }
}

/// Strips markdown code fences from a JSON response.
///
/// Models in JSON mode occasionally wrap their output in ` ```json `
/// blocks anyway; parsers call this before deserializing.
#[must_use]
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

/// Trait implemented by all agents in the system.
///
/// Agents encapsulate a specific role (planning, summarization, decision,
/// answering) with a fixed system prompt and model configuration. The
/// orchestrator calls [`Agent::execute`] to run an agent against a
/// provider.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and usage attribution.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// System prompt that defines the agent's role and behavior.
    fn system_prompt(&self) -> &str;

    /// Whether to request JSON-formatted output.
    fn json_mode(&self) -> bool {
        false
    }

    /// Sampling temperature (0.0 = deterministic, higher = more creative).
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        2048
    }

    /// Executes the agent with the given user message.
    ///
    /// Builds a [`ChatRequest`] from the agent's configuration and
    /// delegates to the provider.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures or response parsing errors.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<AgentResponse, AgentError> {
        let request = ChatRequest {
            model: self.model().to_string(),
            messages: vec![system_message(self.system_prompt()), user_message(user_msg)],
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            json_mode: self.json_mode(),
            stream: false,
        };

        let response: ChatResponse = provider.chat(&request).await?;

        Ok(AgentResponse {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }
}
