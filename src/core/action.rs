//! Continue/answer decisions produced once per loop iteration.

use serde::{Deserialize, Serialize};

/// The decision that ends each research iteration.
///
/// `Continue` drives another planning pass unless the step budget is
/// exhausted; `Answer` ends the loop and hands control to the answer
/// generator. The selector prompt requires `feedback` when continuing,
/// but the parsed shape keeps it optional: a decision without feedback
/// must never erase feedback stored by an earlier iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Action {
    /// Keep researching.
    Continue {
        /// Why the accumulated evidence is not yet sufficient.
        reasoning: String,
        /// What is still missing, for the next planning pass.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
    /// Enough evidence has accumulated; produce the answer.
    Answer {
        /// Why the evidence suffices.
        reasoning: String,
        /// Optional residual gaps worth noting.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
}

impl Action {
    /// Returns `true` for a terminal [`Action::Answer`] decision.
    #[must_use]
    pub const fn is_answer(&self) -> bool {
        matches!(self, Self::Answer { .. })
    }

    /// The model's stated reasoning for this decision.
    #[must_use]
    pub fn reasoning(&self) -> &str {
        match self {
            Self::Continue { reasoning, .. } | Self::Answer { reasoning, .. } => reasoning,
        }
    }

    /// Feedback attached to this decision, if any.
    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        match self {
            Self::Continue { feedback, .. } | Self::Answer { feedback, .. } => feedback.as_deref(),
        }
    }

    /// The wire tag for this decision ("continue" or "answer").
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Continue { .. } => "continue",
            Self::Answer { .. } => "answer",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_continue_with_feedback() {
        let json = r#"{"action":"continue","reasoning":"need pricing data","feedback":"search for current subscription tiers"}"#;
        let action: Action = serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert!(!action.is_answer());
        assert_eq!(action.reasoning(), "need pricing data");
        assert_eq!(
            action.feedback(),
            Some("search for current subscription tiers")
        );
    }

    #[test]
    fn test_deserialize_continue_without_feedback() {
        let json = r#"{"action":"continue","reasoning":"more digging needed"}"#;
        let action: Action = serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert!(!action.is_answer());
        assert_eq!(action.feedback(), None);
    }

    #[test]
    fn test_deserialize_answer() {
        let json = r#"{"action":"answer","reasoning":"evidence covers the question"}"#;
        let action: Action = serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert!(action.is_answer());
        assert_eq!(action.kind(), "answer");
    }

    #[test]
    fn test_unknown_action_tag_fails() {
        let json = r#"{"action":"retry","reasoning":"x"}"#;
        assert!(serde_json::from_str::<Action>(json).is_err());
    }

    #[test]
    fn test_serialize_omits_absent_feedback() {
        let action = Action::Answer {
            reasoning: "done".into(),
            feedback: None,
        };
        let json = serde_json::to_string(&action).unwrap_or_default();
        assert!(json.contains("\"answer\""));
        assert!(!json.contains("feedback"));
    }

    #[test]
    fn test_display_is_wire_tag() {
        let action = Action::Continue {
            reasoning: "x".into(),
            feedback: None,
        };
        assert_eq!(action.to_string(), "continue");
    }
}
