use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One in-progress changeover, persisted so an interrupted session resumes
/// at the same position in every work-group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeoverSession {
    pub from_config: u32,
    pub to_config: u32,
    pub zone: String,
    pub intervention_type: String,
    pub process_scope: String,
    /// Current position within each work-group's ordered sequence.
    #[serde(default)]
    pub resume_indices: BTreeMap<String, usize>,
    pub started_at: DateTime<Utc>,
}

impl ChangeoverSession {
    pub fn new(
        from_config: u32,
        to_config: u32,
        zone: impl Into<String>,
        intervention_type: impl Into<String>,
        process_scope: impl Into<String>,
    ) -> Self {
        Self {
            from_config,
            to_config,
            zone: zone.into(),
            intervention_type: intervention_type.into(),
            process_scope: process_scope.into(),
            resume_indices: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }

    /// Resume position for a work-group, 0 when the group was never entered.
    pub fn index_for(&self, work_group: &str) -> usize {
        self.resume_indices.get(work_group).copied().unwrap_or(0)
    }
}
