//! Answer generator agent.
//!
//! Streams the final cited answer from the accumulated evidence. Runs
//! exactly once per question, either when the selector judges the
//! evidence sufficient or when the step budget runs out.

use async_trait::async_trait;
use futures_util::StreamExt;

use super::config::AgentConfig;
use super::prompt::build_answer_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::evidence::EvidenceStore;
use crate::core::message::{ChatRequest, system_message, user_message};
use crate::error::AgentError;

/// Receives answer text as it streams from the model.
///
/// The CLI writes deltas straight to stdout; library callers that only
/// want the returned string can pass [`NullAnswerSink`].
pub trait AnswerSink: Send {
    /// Called with each text fragment as it arrives.
    fn delta(&mut self, text: &str);

    /// Called once after the stream ends cleanly, with the complete
    /// accumulated answer.
    fn finish(&mut self, _full_text: &str) {}
}

/// Sink that discards all deltas.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnswerSink;

impl AnswerSink for NullAnswerSink {
    fn delta(&mut self, _text: &str) {}
}

/// Agent that writes the final answer with inline citations.
pub struct AnswerGenerator {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl AnswerGenerator {
    /// Creates a new answer generator with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.answer_model.clone(),
            max_tokens: config.answer_max_tokens,
            system_prompt,
        }
    }

    /// Streams the answer, forwarding each delta to `sink`.
    ///
    /// When `is_final` is set the prompt tells the model the research
    /// budget is exhausted and the answer must be best-effort from
    /// whatever evidence exists.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Stream`] if the stream fails mid-response;
    /// deltas already forwarded to the sink are not retracted. Provider
    /// failures propagate unchanged.
    pub async fn generate(
        &self,
        provider: &dyn LlmProvider,
        evidence: &EvidenceStore,
        is_final: bool,
        sink: &mut dyn AnswerSink,
    ) -> Result<String, AgentError> {
        let user_msg = build_answer_prompt(evidence, is_final);
        let request = ChatRequest {
            model: self.model().to_string(),
            messages: vec![
                system_message(self.system_prompt()),
                user_message(&user_msg),
            ],
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            json_mode: false,
            stream: true,
        };

        let mut stream = provider.chat_stream(&request).await?;
        let mut answer = String::new();

        while let Some(chunk) = stream.next().await {
            let delta = chunk?;
            sink.delta(&delta);
            answer.push_str(&delta);
        }

        sink.finish(&answer);
        Ok(answer)
    }
}

#[async_trait]
impl Agent for AnswerGenerator {
    fn name(&self) -> &'static str {
        "answer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        0.1
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::ChatResponse;

    use std::pin::Pin;
    use std::sync::Mutex;

    use futures_util::Stream;

    /// Mock provider that streams scripted chunks and records the last
    /// user message it saw.
    struct MockStreamProvider {
        chunks: Vec<Result<String, String>>,
        last_user_msg: Mutex<String>,
    }

    impl MockStreamProvider {
        fn new(chunks: Vec<Result<String, String>>) -> Self {
            Self {
                chunks,
                last_user_msg: Mutex::new(String::new()),
            }
        }

        fn last_user_msg(&self) -> String {
            self.last_user_msg
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockStreamProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            Err(AgentError::Stream {
                message: "not implemented".to_string(),
            })
        }

        async fn chat_stream(
            &self,
            request: &ChatRequest,
        ) -> Result<Pin<Box<dyn Stream<Item = Result<String, AgentError>> + Send>>, AgentError>
        {
            if let Some(msg) = request.messages.last() {
                *self
                    .last_user_msg
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner) = msg.content.clone();
            }
            let items: Vec<Result<String, AgentError>> = self
                .chunks
                .iter()
                .map(|chunk| {
                    chunk
                        .clone()
                        .map_err(|message| AgentError::Stream { message })
                })
                .collect();
            Ok(Box::pin(futures_util::stream::iter(items)))
        }
    }

    /// Sink that records every delta and the completion callback's text.
    #[derive(Default)]
    struct CollectingSink {
        deltas: Vec<String>,
        final_text: Option<String>,
    }

    impl AnswerSink for CollectingSink {
        fn delta(&mut self, text: &str) {
            self.deltas.push(text.to_string());
        }

        fn finish(&mut self, full_text: &str) {
            self.final_text = Some(full_text.to_string());
        }
    }

    fn test_generator() -> AnswerGenerator {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        AnswerGenerator::new(&config, "write the answer".to_string())
    }

    fn test_evidence() -> EvidenceStore {
        EvidenceStore::new(vec![user_message("What changed in the latest release?")], None)
    }

    #[tokio::test]
    async fn test_generate_streams_and_accumulates() {
        let provider = MockStreamProvider::new(vec![
            Ok("The release ".to_string()),
            Ok("added X.".to_string()),
        ]);
        let mut sink = CollectingSink::default();
        let answer = test_generator()
            .generate(&provider, &test_evidence(), false, &mut sink)
            .await;
        assert_eq!(answer.ok().as_deref(), Some("The release added X."));
        assert_eq!(sink.deltas, vec!["The release ", "added X."]);
        assert_eq!(sink.final_text.as_deref(), Some("The release added X."));
    }

    #[tokio::test]
    async fn test_generate_stream_error_propagates() {
        let provider = MockStreamProvider::new(vec![
            Ok("partial".to_string()),
            Err("connection reset".to_string()),
        ]);
        let mut sink = CollectingSink::default();
        let result = test_generator()
            .generate(&provider, &test_evidence(), false, &mut sink)
            .await;
        assert!(matches!(result, Err(AgentError::Stream { .. })));
        assert_eq!(sink.deltas, vec!["partial"]);
        assert!(sink.final_text.is_none());
    }

    #[tokio::test]
    async fn test_generate_final_mode_changes_prompt() {
        let provider = MockStreamProvider::new(vec![Ok("done".to_string())]);
        let mut sink = NullAnswerSink;
        let _ = test_generator()
            .generate(&provider, &test_evidence(), true, &mut sink)
            .await;
        assert!(provider.last_user_msg().contains("budget is exhausted"));
    }

    #[test]
    fn test_agent_properties() {
        let agent = test_generator();
        assert_eq!(agent.name(), "answer");
        assert!(!agent.json_mode());
        assert!((agent.temperature() - 0.1).abs() < f32::EPSILON);
    }
}
