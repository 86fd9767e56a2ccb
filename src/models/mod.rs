//! Data model for the changeover engine: step definitions and their runtime
//! validation state, transition-keyed exclusion rules, and the resumable
//! session record. One record per file; persistence lives in [`crate::storage`].

pub mod exclusion_rule;
pub mod session;
pub mod step_definition;
pub mod step_runtime_state;

pub use exclusion_rule::{ExclusionTable, TransitionKey};
pub use session::ChangeoverSession;
pub use step_definition::StepDefinition;
pub use step_runtime_state::StepRuntimeState;
