//! Shared fixtures: a scriptable remote step service and step builders.
#![allow(dead_code)] // Each test binary uses a different subset.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use changeover_core::error::{ChangeoverError, Result};
use changeover_core::{RemoteStepService, StepDefinition};

/// Build a definition with the given id, work-group, and predecessors.
pub fn step(id: i64, work_group: &str, predecessors: Vec<i64>) -> StepDefinition {
    StepDefinition {
        id,
        label: format!("step-{id}"),
        work_group: work_group.to_string(),
        role: "operator".to_string(),
        phase: "internal".to_string(),
        estimated_secs: 120,
        description: format!("description of step {id}"),
        predecessors,
        successors: vec![],
        precondition: None,
    }
}

/// In-memory remote with scriptable failures and a call recorder.
#[derive(Default)]
pub struct ScriptedRemote {
    inner: Mutex<RemoteInner>,
}

#[derive(Default)]
struct RemoteInner {
    definitions: BTreeMap<i64, StepDefinition>,
    fail_all: bool,
    calls: Vec<String>,
}

impl ScriptedRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_steps(definitions: Vec<StepDefinition>) -> Arc<Self> {
        let remote = Self::default();
        {
            let mut inner = remote.inner.lock();
            for definition in definitions {
                inner.definitions.insert(definition.id, definition);
            }
        }
        Arc::new(remote)
    }

    /// Make every remote call fail with `RemoteUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().fail_all = unavailable;
    }

    /// Replace the remote definition set.
    pub fn set_steps(&self, definitions: Vec<StepDefinition>) {
        let mut inner = self.inner.lock();
        inner.definitions =
            definitions.into_iter().map(|d| (d.id, d)).collect();
    }

    /// Operation names in call order, including rejected calls.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().calls.clone()
    }

    fn record(&self, operation: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.calls.push(operation.to_string());
        if inner.fail_all {
            Err(ChangeoverError::remote_unavailable(
                operation,
                "scripted outage",
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStepService for ScriptedRemote {
    async fn get_all(&self) -> Result<Vec<StepDefinition>> {
        self.record("get_all")?;
        Ok(self.inner.lock().definitions.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<StepDefinition>> {
        self.record("get_by_id")?;
        Ok(self.inner.lock().definitions.get(&id).cloned())
    }

    async fn create(&self, definition: &StepDefinition) -> Result<()> {
        self.record("create")?;
        self.inner
            .lock()
            .definitions
            .insert(definition.id, definition.clone());
        Ok(())
    }

    async fn update(&self, id: i64, definition: &StepDefinition) -> Result<()> {
        self.record("update")?;
        self.inner.lock().definitions.insert(id, definition.clone());
        Ok(())
    }

    async fn validate(
        &self,
        _step_id: i64,
        _comment: &str,
        _description: &str,
        _elapsed_secs: i64,
    ) -> Result<()> {
        self.record("validate")
    }

    async fn unvalidate(
        &self,
        _step_id: i64,
        _comment: &str,
        _description: &str,
        _elapsed_secs: i64,
    ) -> Result<()> {
        self.record("unvalidate")
    }
}
