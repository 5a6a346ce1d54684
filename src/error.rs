//! Error types for the research agent.
//!
//! Library errors are [`AgentError`]; the CLI layer wraps them in
//! [`CommandError`] for exit-code handling. Failure classification for the
//! summarizer fallback chain lives here as [`FailureKind`].

use thiserror::Error;

/// Errors produced by the agent loop and its collaborators.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was provided via configuration or environment.
    #[error("API key missing: set SCOUR_API_KEY or OPENAI_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name is not recognized.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// A model API request failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Human-readable failure description.
        message: String,
        /// HTTP status code, when the transport surfaced one.
        status: Option<u16>,
        /// Provider-specific error code or type, when present.
        code: Option<String>,
    },

    /// A model response could not be parsed into the expected shape.
    #[error("failed to parse model response: {message}")]
    ResponseParse {
        /// What went wrong during parsing or validation.
        message: String,
        /// The raw response content, for diagnostics.
        content: String,
    },

    /// An HTTP client could not be constructed.
    #[error("HTTP client construction failed: {message}")]
    HttpClient {
        /// Failure description from the transport layer.
        message: String,
    },

    /// A web search call failed.
    #[error("search failed for {query:?}: {message}")]
    Search {
        /// The query that was being searched.
        query: String,
        /// Transport or API failure description.
        message: String,
    },

    /// The crawl adapter itself failed (not an individual URL).
    #[error("crawl failed: {message}")]
    Crawl {
        /// Failure description.
        message: String,
    },

    /// A streaming response failed mid-flight.
    #[error("stream error: {message}")]
    Stream {
        /// Failure description.
        message: String,
    },

    /// Loop-level failure (task join, internal invariant).
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Failure description.
        message: String,
    },

    /// Prompt file loading or scaffolding failed.
    #[error("prompt error: {message}")]
    Prompt {
        /// Failure description.
        message: String,
    },
}

/// Coarse failure classes used to pick a summarizer fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider signalled overload or rate limiting; the content that
    /// was going to be summarized is still good.
    Overloaded,
    /// A transient transport-level failure (timeout, 5xx, connection).
    Transient,
    /// Anything else; retrying or substituting raw content won't help.
    Permanent,
}

impl AgentError {
    /// Classify a failure from its structured descriptor.
    ///
    /// Overload detection is a loose match across HTTP status, provider
    /// error code, and message text rather than exact string equality,
    /// since providers spell this condition many ways.
    #[must_use]
    pub fn classify(&self) -> FailureKind {
        match self {
            Self::ApiRequest {
                message,
                status,
                code,
            } => classify_descriptor(*status, code.as_deref(), message),
            Self::Stream { message } => classify_descriptor(None, None, message),
            _ => FailureKind::Permanent,
        }
    }
}

fn classify_descriptor(status: Option<u16>, code: Option<&str>, message: &str) -> FailureKind {
    if let Some(s) = status
        && matches!(s, 429 | 503 | 529)
    {
        return FailureKind::Overloaded;
    }
    let lowered = message.to_lowercase();
    let code_lowered = code.map(str::to_lowercase).unwrap_or_default();
    const OVERLOAD_MARKERS: [&str; 4] =
        ["overload", "rate limit", "rate_limit", "too many requests"];
    if OVERLOAD_MARKERS
        .iter()
        .any(|m| lowered.contains(m) || code_lowered.contains(m))
    {
        return FailureKind::Overloaded;
    }
    if let Some(s) = status
        && matches!(s, 408 | 500 | 502 | 504)
    {
        return FailureKind::Transient;
    }
    const TRANSIENT_MARKERS: [&str; 4] = ["timeout", "timed out", "connection", "temporarily"];
    if TRANSIENT_MARKERS.iter().any(|m| lowered.contains(m)) {
        return FailureKind::Transient;
    }
    FailureKind::Permanent
}

/// Errors produced by CLI command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid command-line arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Command execution failed.
    #[error("{0}")]
    ExecutionFailed(String),

    /// An agent-layer error surfaced to the CLI.
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Result alias for CLI command implementations.
pub type Result<T> = std::result::Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some(429), None, "anything" => FailureKind::Overloaded; "status 429")]
    #[test_case(Some(503), None, "service unavailable" => FailureKind::Overloaded; "status 503")]
    #[test_case(Some(529), None, "" => FailureKind::Overloaded; "status 529")]
    #[test_case(None, Some("overloaded_error"), "try later" => FailureKind::Overloaded; "provider code")]
    #[test_case(None, None, "Rate limit exceeded" => FailureKind::Overloaded; "message rate limit")]
    #[test_case(None, None, "model is Overloaded, please retry" => FailureKind::Overloaded; "message overload mixed case")]
    #[test_case(Some(500), None, "internal error" => FailureKind::Transient; "status 500")]
    #[test_case(Some(502), None, "bad gateway" => FailureKind::Transient; "status 502")]
    #[test_case(None, None, "request timed out" => FailureKind::Transient; "message timeout")]
    #[test_case(None, None, "connection reset by peer" => FailureKind::Transient; "message connection")]
    #[test_case(Some(400), None, "invalid request" => FailureKind::Permanent; "status 400")]
    #[test_case(None, None, "invalid api key" => FailureKind::Permanent; "message permanent")]
    fn classification_table(status: Option<u16>, code: Option<&str>, message: &str) -> FailureKind {
        classify_descriptor(status, code, message)
    }

    #[test]
    fn api_request_classifies_through_error() {
        let err = AgentError::ApiRequest {
            message: "Overloaded".into(),
            status: None,
            code: None,
        };
        assert_eq!(err.classify(), FailureKind::Overloaded);
    }

    #[test]
    fn parse_errors_are_permanent() {
        let err = AgentError::ResponseParse {
            message: "missing field".into(),
            content: "{}".into(),
        };
        assert_eq!(err.classify(), FailureKind::Permanent);
    }

    #[test]
    fn overload_takes_priority_over_transient_markers() {
        // "rate limit ... timeout" should classify as overloaded, not transient
        assert_eq!(
            classify_descriptor(None, None, "rate limit hit, connection closed"),
            FailureKind::Overloaded
        );
    }

    #[test]
    fn display_includes_context() {
        let err = AgentError::Search {
            query: "rust async".into(),
            message: "502 from upstream".into(),
        };
        assert!(err.to_string().contains("rust async"));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn command_error_wraps_agent_error() {
        let err: CommandError = AgentError::ApiKeyMissing.into();
        assert!(err.to_string().contains("API key"));
    }
}
