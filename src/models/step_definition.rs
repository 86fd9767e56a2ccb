use serde::{Deserialize, Serialize};

use crate::constants::NO_PREDECESSOR_ID;

/// One procedural step of a machine changeover, as authored on the remote
/// side and mirrored into the local cache.
///
/// `id` is unique and stable across edits. `work_group` assigns the step to
/// one operator/zone lane; lanes are ordered independently of each other.
/// Predecessor/successor ids may reference steps outside the current
/// candidate set (filtered-out or deleted steps); consumers ignore
/// unresolvable references rather than treating them as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: i64,
    pub label: String,
    pub work_group: String,
    pub role: String,
    pub phase: String,
    /// Planned duration in seconds, as estimated by the method office.
    pub estimated_secs: i64,
    pub description: String,
    #[serde(default)]
    pub predecessors: Vec<i64>,
    #[serde(default)]
    pub successors: Vec<i64>,
    /// Free-text condition the operator must check before validating.
    #[serde(default)]
    pub precondition: Option<String>,
}

impl StepDefinition {
    /// Predecessor ids with the "no predecessor" sentinel filtered out.
    pub fn real_predecessors(&self) -> impl Iterator<Item = i64> + '_ {
        self.predecessors
            .iter()
            .copied()
            .filter(|&id| id != NO_PREDECESSOR_ID)
    }
}
