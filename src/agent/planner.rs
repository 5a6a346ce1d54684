//! Query planner agent.
//!
//! Turns the question and accumulated evidence into the next round of
//! search queries, returning a structured [`ResearchPlan`] in JSON format.

use async_trait::async_trait;
use chrono::Utc;

use super::config::AgentConfig;
use super::prompt::build_planner_prompt;
use super::provider::LlmProvider;
use super::traits::{Agent, strip_code_fences};
use crate::core::evidence::EvidenceStore;
use crate::core::message::TokenUsage;
use crate::core::plan::ResearchPlan;
use crate::error::AgentError;

/// Agent that plans search queries for the next research iteration.
///
/// Sees the full evidence gathered so far, including evaluator feedback,
/// so each round builds on the last instead of repeating it.
pub struct QueryPlanner {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl QueryPlanner {
    /// Creates a new planner with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.planner_model.clone(),
            max_tokens: config.planner_max_tokens,
            system_prompt,
        }
    }

    /// Plans the next round of search queries.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ResponseParse`] if the response is not valid
    /// JSON, does not match the plan schema, or fails plan validation.
    /// Provider failures propagate unchanged.
    pub async fn plan(
        &self,
        provider: &dyn LlmProvider,
        evidence: &EvidenceStore,
    ) -> Result<(ResearchPlan, Option<TokenUsage>), AgentError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let user_msg = build_planner_prompt(evidence, &today);
        let response = self.execute(provider, &user_msg).await?;
        match Self::parse_plan(&response.content) {
            Ok(plan) => Ok((plan, response.recorded_usage())),
            Err(_) if response.is_truncated() => Err(AgentError::ResponseParse {
                message: format!(
                    "Response truncated (finish_reason=length, max_tokens={}). \
                     Consider raising SCOUR_PLANNER_MAX_TOKENS.",
                    self.max_tokens
                ),
                content: response.content,
            }),
            Err(e) => Err(e),
        }
    }

    /// Parses the agent's JSON response into a validated plan.
    fn parse_plan(content: &str) -> Result<ResearchPlan, AgentError> {
        let json_str = strip_code_fences(content);

        let plan: ResearchPlan =
            serde_json::from_str(json_str).map_err(|e| AgentError::ResponseParse {
                message: format!("Failed to parse research plan JSON: {e}"),
                content: content.to_string(),
            })?;

        plan.validate().map_err(|message| AgentError::ResponseParse {
            message,
            content: content.to_string(),
        })?;

        Ok(plan)
    }
}

#[async_trait]
impl Agent for QueryPlanner {
    fn name(&self) -> &'static str {
        "planner"
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
