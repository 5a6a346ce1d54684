//! Structured research plans produced by the query planner.

use serde::{Deserialize, Serialize};

/// Minimum number of queries a plan may carry.
pub const MIN_PLANNED_QUERIES: usize = 1;
/// Maximum number of queries a plan may carry.
pub const MAX_PLANNED_QUERIES: usize = 5;

/// One planned web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedQuery {
    /// Natural-language search query (no boolean operators).
    pub query: String,
    /// What this query is expected to contribute.
    pub purpose: String,
}

/// A multi-query research plan for one loop iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// The model's overall plan narrative.
    pub plan: String,
    /// Queries to issue, in priority order.
    pub queries: Vec<PlannedQuery>,
}

impl ResearchPlan {
    /// Checks the structural constraints the planner schema promises:
    /// between [`MIN_PLANNED_QUERIES`] and [`MAX_PLANNED_QUERIES`] queries,
    /// none of them blank.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.queries.len() < MIN_PLANNED_QUERIES {
            return Err("plan contains no queries".to_string());
        }
        if self.queries.len() > MAX_PLANNED_QUERIES {
            return Err(format!(
                "plan contains {} queries, maximum is {MAX_PLANNED_QUERIES}",
                self.queries.len()
            ));
        }
        if let Some(blank) = self.queries.iter().position(|q| q.query.trim().is_empty()) {
            return Err(format!("query {blank} is blank"));
        }
        Ok(())
    }
}
