//! Action selector agent.
//!
//! Judges the accumulated evidence after each search round and decides
//! whether to keep researching or write the answer.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::build_selector_prompt;
use super::provider::LlmProvider;
use super::traits::{Agent, strip_code_fences};
use crate::core::action::Action;
use crate::core::evidence::EvidenceStore;
use crate::core::message::TokenUsage;
use crate::error::AgentError;

/// Agent that decides between continuing research and answering.
///
/// Its feedback drives the next planning round, so a `continue` decision
/// should name the concrete gap in the evidence.
pub struct ActionSelector {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl ActionSelector {
    /// Creates a new selector with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.selector_model.clone(),
            max_tokens: config.selector_max_tokens,
            system_prompt,
        }
    }

    /// Decides whether the evidence suffices to answer.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ResponseParse`] if the response is not valid
    /// JSON or names an unknown action. Provider failures propagate
    /// unchanged.
    pub async fn decide(
        &self,
        provider: &dyn LlmProvider,
        evidence: &EvidenceStore,
    ) -> Result<(Action, Option<TokenUsage>), AgentError> {
        let user_msg = build_selector_prompt(evidence);
        let response = self.execute(provider, &user_msg).await?;
        match Self::parse_action(&response.content) {
            Ok(action) => Ok((action, response.recorded_usage())),
            Err(_) if response.is_truncated() => Err(AgentError::ResponseParse {
                message: format!(
                    "Response truncated (finish_reason=length, max_tokens={}). \
                     Consider raising SCOUR_SELECTOR_MAX_TOKENS.",
                    self.max_tokens
                ),
                content: response.content,
            }),
            Err(e) => Err(e),
        }
    }

    /// Parses the agent's JSON response into an action.
    fn parse_action(content: &str) -> Result<Action, AgentError> {
        let json_str = strip_code_fences(content);
        serde_json::from_str(json_str).map_err(|e| AgentError::ResponseParse {
            message: format!("Failed to parse action JSON: {e}"),
            content: content.to_string(),
        })
    }
}

#[async_trait]
impl Agent for ActionSelector {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn temperature(&self) -> f32 {
        0.0
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
