use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::{StepLifecycle, ValidationEvent};
use crate::error::{ChangeoverError, Result};
use crate::models::StepRuntimeState;
use crate::remote::RemoteStepService;
use crate::storage::StepCache;

/// Validation state machine for individual changeover steps.
///
/// Transition discipline is remote-first: the lifecycle rule is checked
/// locally (an invalid transition never produces a remote call), the remote
/// source is asked to accept the transition, and only on remote success is
/// the cached runtime state updated and persisted. A remote failure leaves
/// the local record untouched.
#[derive(Clone)]
pub struct StepValidationStateMachine {
    remote: Arc<dyn RemoteStepService>,
    cache: Arc<dyn StepCache>,
}

impl StepValidationStateMachine {
    pub fn new(remote: Arc<dyn RemoteStepService>, cache: Arc<dyn StepCache>) -> Self {
        Self { remote, cache }
    }

    /// Current lifecycle of a step. Steps with no runtime record yet are
    /// pending by definition.
    pub async fn current_state(&self, step_id: i64) -> Result<StepLifecycle> {
        Ok(self
            .cache
            .runtime_state(step_id)
            .await?
            .map(|state| state.lifecycle)
            .unwrap_or_default())
    }

    /// Attempt a lifecycle transition, returning the persisted record.
    pub async fn transition(
        &self,
        step_id: i64,
        event: ValidationEvent,
    ) -> Result<StepRuntimeState> {
        let mut state = self
            .cache
            .runtime_state(step_id)
            .await?
            .unwrap_or_else(|| StepRuntimeState::new(step_id));

        let target = Self::determine_target_state(state.lifecycle, &event)?;

        // Remote accepts first; local state is unchanged on any failure.
        match &event {
            ValidationEvent::Validate {
                comment,
                description,
                elapsed_secs,
            } => {
                self.remote
                    .validate(step_id, comment, description, *elapsed_secs)
                    .await?;
                state.comment = comment.clone();
                state.elapsed_secs = *elapsed_secs;
            }
            ValidationEvent::Invalidate => {
                self.remote
                    .unvalidate(step_id, &state.comment, "", state.elapsed_secs)
                    .await?;
                state.elapsed_secs = 0;
            }
        }

        let from = state.lifecycle;
        state.lifecycle = target;
        self.cache.upsert_runtime_state(&state).await?;

        info!(
            step_id = step_id,
            from = %from,
            to = %target,
            event = event.event_type(),
            "Step lifecycle transition"
        );
        Ok(state)
    }

    /// Determine the target state for `(current, event)`, rejecting invalid
    /// pairs before any side effect.
    pub fn determine_target_state(
        current: StepLifecycle,
        event: &ValidationEvent,
    ) -> Result<StepLifecycle> {
        match (current, event) {
            (StepLifecycle::Pending, ValidationEvent::Validate { .. }) => {
                Ok(StepLifecycle::Validated)
            }
            (StepLifecycle::Validated, ValidationEvent::Invalidate) => Ok(StepLifecycle::Pending),
            (from, event) => Err(ChangeoverError::InvalidTransition {
                from: from.to_string(),
                event: event.event_type().to_string(),
            }),
        }
    }

    /// Validate a pending step.
    pub async fn validate(
        &self,
        step_id: i64,
        comment: &str,
        description: &str,
        elapsed_secs: i64,
    ) -> Result<StepRuntimeState> {
        self.transition(
            step_id,
            ValidationEvent::validate(comment, description, elapsed_secs),
        )
        .await
    }

    /// Revert a validated step to pending.
    pub async fn invalidate(&self, step_id: i64) -> Result<StepRuntimeState> {
        self.transition(step_id, ValidationEvent::Invalidate).await
    }

    /// Replace the operator comment. Local-only: comments are not part of
    /// the remote transition contract until the next validate call.
    pub async fn set_comment(&self, step_id: i64, comment: &str) -> Result<StepRuntimeState> {
        let mut state = self
            .cache
            .runtime_state(step_id)
            .await?
            .unwrap_or_else(|| StepRuntimeState::new(step_id));
        state.comment = comment.to_string();
        self.cache.upsert_runtime_state(&state).await?;
        Ok(state)
    }

    /// Record that the step was shown to an operator, creating its runtime
    /// record on first display.
    pub async fn touch_displayed(&self, step_id: i64) -> Result<StepRuntimeState> {
        let mut state = self
            .cache
            .runtime_state(step_id)
            .await?
            .unwrap_or_else(|| StepRuntimeState::new(step_id));
        state.last_displayed_at = Some(Utc::now());
        self.cache.upsert_runtime_state(&state).await?;
        debug!(step_id = step_id, "Step displayed");
        Ok(state)
    }
}
