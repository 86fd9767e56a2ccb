//! # Step Repository
//!
//! Owns the local cache and its reconciliation with the authoritative
//! remote source, so changeover work continues offline.
//!
//! Two disciplines coexist deliberately:
//!
//! - **Reads** degrade gracefully: [`StepRepository::fetch_all`] answers
//!   from the cache immediately and refreshes opportunistically in the
//!   background; a dead remote never surfaces as an error on the read path.
//! - **Administrative writes** are remote-first with no offline queue:
//!   [`StepRepository::create`] and [`StepRepository::update`] fail outright
//!   when the remote rejects them, leaving the cache untouched. Runtime
//!   validation goes through the state machine, which applies the same
//!   remote-first rule per transition.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ChangeoverError, Result};
use crate::models::{StepDefinition, StepRuntimeState};
use crate::remote::RemoteStepService;
use crate::state_machine::StepValidationStateMachine;
use crate::storage::StepCache;

pub struct StepRepository {
    cache: Arc<dyn StepCache>,
    remote: Arc<dyn RemoteStepService>,
    state_machine: StepValidationStateMachine,
    refresh_on_fetch: bool,
}

impl StepRepository {
    pub fn new(cache: Arc<dyn StepCache>, remote: Arc<dyn RemoteStepService>) -> Self {
        let state_machine =
            StepValidationStateMachine::new(Arc::clone(&remote), Arc::clone(&cache));
        Self {
            cache,
            remote,
            state_machine,
            refresh_on_fetch: true,
        }
    }

    /// Disable the opportunistic background refresh on reads. Callers that
    /// need deterministic reconciliation use [`Self::refresh`] directly.
    pub fn with_refresh_on_fetch(mut self, refresh_on_fetch: bool) -> Self {
        self.refresh_on_fetch = refresh_on_fetch;
        self
    }

    /// Cached definitions, returned immediately. Opportunistically spawns a
    /// remote refresh whose result lands in the cache for a subsequent call.
    pub async fn fetch_all(&self) -> Result<Vec<StepDefinition>> {
        if self.refresh_on_fetch {
            let cache = Arc::clone(&self.cache);
            let remote = Arc::clone(&self.remote);
            tokio::spawn(async move {
                if let Err(err) = reconcile(&*cache, &*remote).await {
                    warn!(error = %err, "Background step refresh failed");
                }
            });
        }
        self.cache.all_definitions().await
    }

    /// Awaitable reconciliation: pull the remote set and mirror it into the
    /// cache by id (full-record upsert, vanished rows pruned). A remote
    /// failure degrades to the last-known cache contents.
    pub async fn refresh(&self) -> Result<Vec<StepDefinition>> {
        match reconcile(&*self.cache, &*self.remote).await {
            Ok(definitions) => Ok(definitions),
            Err(err) if err.is_remote() => {
                warn!(error = %err, "Remote unavailable, serving cached steps");
                self.cache.all_definitions().await
            }
            Err(err) => Err(err),
        }
    }

    /// Cached definition lookup.
    pub async fn get_by_id(&self, id: i64) -> Result<StepDefinition> {
        self.cache
            .definition_by_id(id)
            .await?
            .ok_or(ChangeoverError::NotFound { step_id: id })
    }

    /// Create a definition, remote-first. The cache row is written only
    /// after remote acknowledgment.
    pub async fn create(&self, definition: &StepDefinition) -> Result<()> {
        self.remote.create(definition).await?;
        self.cache
            .upsert_definitions(std::slice::from_ref(definition))
            .await
    }

    /// Update a definition, remote-first, same discipline as create.
    pub async fn update(&self, id: i64, definition: &StepDefinition) -> Result<()> {
        self.remote.update(id, definition).await?;
        self.cache
            .upsert_definitions(std::slice::from_ref(definition))
            .await
    }

    /// Validate a pending step (delegates to the validation state machine).
    pub async fn validate(
        &self,
        step_id: i64,
        comment: &str,
        description: &str,
        elapsed_secs: i64,
    ) -> Result<StepRuntimeState> {
        self.state_machine
            .validate(step_id, comment, description, elapsed_secs)
            .await
    }

    /// Revert a validated step to pending.
    pub async fn unvalidate(&self, step_id: i64) -> Result<StepRuntimeState> {
        self.state_machine.invalidate(step_id).await
    }

    /// Runtime record for a step, if one was ever created.
    pub async fn runtime_state(&self, step_id: i64) -> Result<Option<StepRuntimeState>> {
        self.cache.runtime_state(step_id).await
    }

    /// Per-step validation machinery, for callers that route transitions
    /// themselves.
    pub fn state_machine(&self) -> &StepValidationStateMachine {
        &self.state_machine
    }
}

/// Pull the remote set and mirror it into the cache: full-record upsert for
/// every remote row, then prune cached rows absent from the remote snapshot.
async fn reconcile(
    cache: &dyn StepCache,
    remote: &dyn RemoteStepService,
) -> Result<Vec<StepDefinition>> {
    let definitions = remote.get_all().await?;
    cache.upsert_definitions(&definitions).await?;

    let remote_ids: std::collections::HashSet<i64> =
        definitions.iter().map(|d| d.id).collect();
    for cached in cache.all_definitions().await? {
        if !remote_ids.contains(&cached.id) {
            cache.delete_definition(cached.id).await?;
        }
    }

    debug!(count = definitions.len(), "Step cache reconciled with remote");
    Ok(definitions)
}
