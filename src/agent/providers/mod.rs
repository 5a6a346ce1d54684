//! Concrete [`LlmProvider`](crate::agent::provider::LlmProvider) backends.

pub mod openai;

pub use openai::OpenAiProvider;
