//! Remote step service seam.
//!
//! The authoritative step source is an external collaborator: transport,
//! authentication, and connectivity decisions live with the application.
//! The engine only needs this request/response contract; every call yields
//! success or a classified failure (`RemoteUnavailable`).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::StepDefinition;

/// Authoritative remote source for step definitions and validations.
#[async_trait]
pub trait RemoteStepService: Send + Sync {
    /// The complete set of step definitions.
    async fn get_all(&self) -> Result<Vec<StepDefinition>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<StepDefinition>>;

    /// Create a definition. Administrative edits are never queued offline;
    /// failures surface to the caller.
    async fn create(&self, definition: &StepDefinition) -> Result<()>;

    async fn update(&self, id: i64, definition: &StepDefinition) -> Result<()>;

    /// Record a step validation with the operator comment, the step
    /// description and the actual elapsed seconds.
    async fn validate(
        &self,
        step_id: i64,
        comment: &str,
        description: &str,
        elapsed_secs: i64,
    ) -> Result<()>;

    /// Revert a previously recorded validation.
    async fn unvalidate(
        &self,
        step_id: i64,
        comment: &str,
        description: &str,
        elapsed_secs: i64,
    ) -> Result<()>;
}
