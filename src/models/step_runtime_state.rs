use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state_machine::StepLifecycle;

/// Per-step runtime record: validation lifecycle, elapsed-time accounting,
/// operator comment, and last-display bookkeeping.
///
/// Created the first time a step is shown to an operator. Mutated only
/// through the validation state machine and persisted after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRuntimeState {
    pub step_id: i64,
    pub lifecycle: StepLifecycle,
    /// Actual time spent on the step, in seconds. Never negative; reset to
    /// 0 when the step is invalidated.
    pub elapsed_secs: i64,
    pub comment: String,
    pub last_displayed_at: Option<DateTime<Utc>>,
}

impl StepRuntimeState {
    /// Fresh record for a step being shown for the first time.
    pub fn new(step_id: i64) -> Self {
        Self {
            step_id,
            lifecycle: StepLifecycle::default(),
            elapsed_secs: 0,
            comment: String::new(),
            last_displayed_at: None,
        }
    }

    pub fn is_validated(&self) -> bool {
        self.lifecycle.is_validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_starts_pending_with_zero_elapsed() {
        let state = StepRuntimeState::new(9);
        assert_eq!(state.step_id, 9);
        assert_eq!(state.lifecycle, StepLifecycle::Pending);
        assert_eq!(state.elapsed_secs, 0);
        assert!(state.comment.is_empty());
        assert!(state.last_displayed_at.is_none());
        assert!(!state.is_validated());
    }
}
