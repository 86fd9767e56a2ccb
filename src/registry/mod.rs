//! Exclusion rule registry: which step ids are skipped for a given
//! configuration transition. An explicit component with injected
//! persistence, created once by the application root and shared by handle.

pub mod exclusion_registry;

pub use exclusion_registry::{default_rules, ExclusionRuleRegistry};
