//! Validation lifecycle: remote-first discipline, elapsed-time accounting,
//! and local rejection of invalid transitions.

mod common;

use std::sync::Arc;

use changeover_core::{
    ChangeoverError, MemoryStore, StepLifecycle, StepValidationStateMachine,
};
use common::ScriptedRemote;

fn machine(remote: Arc<ScriptedRemote>, store: Arc<MemoryStore>) -> StepValidationStateMachine {
    StepValidationStateMachine::new(remote, store)
}

#[tokio::test]
async fn validate_then_invalidate_round_trip() {
    let remote = ScriptedRemote::new();
    let store = Arc::new(MemoryStore::new());
    let machine = machine(remote.clone(), store);

    // Pending, elapsed 0; validate with remote success.
    assert_eq!(machine.current_state(7).await.unwrap(), StepLifecycle::Pending);
    let state = machine.validate(7, "ok", "", 42).await.unwrap();
    assert_eq!(state.lifecycle, StepLifecycle::Validated);
    assert_eq!(state.elapsed_secs, 42);
    assert_eq!(state.comment, "ok");

    // Invalidate reverts to pending and resets elapsed time.
    let state = machine.invalidate(7).await.unwrap();
    assert_eq!(state.lifecycle, StepLifecycle::Pending);
    assert_eq!(state.elapsed_secs, 0);
    assert_eq!(remote.calls(), vec!["validate", "unvalidate"]);
}

#[tokio::test]
async fn remote_failure_leaves_local_state_unchanged() {
    let remote = ScriptedRemote::new();
    let store = Arc::new(MemoryStore::new());
    let machine = machine(remote.clone(), store.clone());

    remote.set_unavailable(true);
    let err = machine.validate(7, "ok", "", 42).await.unwrap_err();
    assert!(err.is_remote());

    // Still pending, no runtime record persisted, elapsed untouched.
    assert_eq!(machine.current_state(7).await.unwrap(), StepLifecycle::Pending);
    use changeover_core::StepCache;
    assert_eq!(store.runtime_state(7).await.unwrap(), None);

    // The remote recovers and the same transition goes through.
    remote.set_unavailable(false);
    let state = machine.validate(7, "ok", "", 42).await.unwrap();
    assert_eq!(state.elapsed_secs, 42);
}

#[tokio::test]
async fn invalid_transitions_are_rejected_without_a_remote_call() {
    let remote = ScriptedRemote::new();
    let store = Arc::new(MemoryStore::new());
    let machine = machine(remote.clone(), store);

    // Invalidate on a pending step.
    let err = machine.invalidate(7).await.unwrap_err();
    assert_eq!(
        err,
        ChangeoverError::InvalidTransition {
            from: "pending".into(),
            event: "invalidate".into()
        }
    );
    assert!(remote.calls().is_empty());

    // Re-validate on a validated step.
    machine.validate(7, "ok", "", 10).await.unwrap();
    let err = machine.validate(7, "again", "", 20).await.unwrap_err();
    assert_eq!(
        err,
        ChangeoverError::InvalidTransition {
            from: "validated".into(),
            event: "validate".into()
        }
    );
    // Only the successful validate reached the remote.
    assert_eq!(remote.calls(), vec!["validate"]);

    // And the recorded elapsed time is the accepted one.
    let state = machine.current_state(7).await.unwrap();
    assert_eq!(state, StepLifecycle::Validated);
}

#[tokio::test]
async fn invalidate_remote_failure_keeps_step_validated() {
    let remote = ScriptedRemote::new();
    let store = Arc::new(MemoryStore::new());
    let machine = machine(remote.clone(), store);

    machine.validate(3, "done", "", 90).await.unwrap();
    remote.set_unavailable(true);

    let err = machine.invalidate(3).await.unwrap_err();
    assert!(err.is_remote());
    assert_eq!(
        machine.current_state(3).await.unwrap(),
        StepLifecycle::Validated
    );
}

#[tokio::test]
async fn comment_and_display_bookkeeping_are_local() {
    let remote = ScriptedRemote::new();
    let store = Arc::new(MemoryStore::new());
    let machine = machine(remote.clone(), store);

    // Both work while the remote is down: no remote contract involved.
    remote.set_unavailable(true);

    let state = machine.touch_displayed(9).await.unwrap();
    assert!(state.last_displayed_at.is_some());
    assert_eq!(state.lifecycle, StepLifecycle::Pending);

    let state = machine.set_comment(9, "waiting on tooling").await.unwrap();
    assert_eq!(state.comment, "waiting on tooling");
    assert!(remote.calls().is_empty());
}
