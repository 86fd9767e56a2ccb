use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::Result;
use crate::models::{ChangeoverSession, StepDefinition, StepRuntimeState};

/// Selections made when a changeover begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeginChangeover {
    pub from_config: u32,
    pub to_config: u32,
    pub zone: String,
    pub intervention_type: String,
    pub process_scope: String,
}

/// Snapshot of the session's ordered work: per-work-group sequences (after
/// exclusion filtering and dependency ordering) and the current position
/// within each group.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkPlan {
    pub groups: BTreeMap<String, Vec<StepDefinition>>,
    pub positions: BTreeMap<String, usize>,
}

impl WorkPlan {
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Step at the current position of a group.
    pub fn current(&self, work_group: &str) -> Option<&StepDefinition> {
        let steps = self.groups.get(work_group)?;
        steps.get(self.positions.get(work_group).copied().unwrap_or(0))
    }

    /// Total steps across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Mutations and reads handled by the coordinator task, one at a time.
pub(crate) enum Command {
    Begin(BeginChangeover, Reply<WorkPlan>),
    Resume(Reply<Option<WorkPlan>>),
    Complete(Reply<()>),
    Plan(Reply<WorkPlan>),
    Session(Reply<Option<ChangeoverSession>>),
    CurrentStep {
        work_group: String,
        reply: Reply<Option<StepDefinition>>,
    },
    NextStep {
        work_group: String,
        reply: Reply<Option<StepDefinition>>,
    },
    PreviousStep {
        work_group: String,
        reply: Reply<Option<StepDefinition>>,
    },
    ValidateStep {
        step_id: i64,
        comment: String,
        description: String,
        elapsed_secs: i64,
        reply: Reply<StepRuntimeState>,
    },
    InvalidateStep {
        step_id: i64,
        reply: Reply<StepRuntimeState>,
    },
    SetComment {
        step_id: i64,
        comment: String,
        reply: Reply<StepRuntimeState>,
    },
    MarkDisplayed {
        step_id: i64,
        reply: Reply<StepRuntimeState>,
    },
    RuntimeState {
        step_id: i64,
        reply: Reply<Option<StepRuntimeState>>,
    },
}
