// Validation lifecycle for changeover steps.
//
// A deliberately small machine: PENDING <-> VALIDATED, with the remote
// source acting as the commit point for every transition. Local state moves
// only after the remote side has durably accepted the same transition, so
// the cache and the remote source never silently diverge.

pub mod events;
pub mod states;
pub mod validation;

pub use events::ValidationEvent;
pub use states::StepLifecycle;
pub use validation::StepValidationStateMachine;
