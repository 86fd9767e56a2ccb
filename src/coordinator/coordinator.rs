use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::commands::{BeginChangeover, Command, Reply, WorkPlan};
use crate::constants::ACTIVE_SESSION_KEY;
use crate::error::{ChangeoverError, Result};
use crate::models::{ChangeoverSession, StepDefinition, StepRuntimeState};
use crate::registry::ExclusionRuleRegistry;
use crate::repository::StepRepository;
use crate::resolver::order_steps;
use crate::storage::KeyValueStore;

const COMMAND_BUFFER: usize = 32;

/// Cloneable API surface of the coordinator actor. Every method enqueues a
/// command and awaits its reply; the actor serializes processing.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| ChangeoverError::CoordinatorStopped)?;
        rx.await.map_err(|_| ChangeoverError::CoordinatorStopped)?
    }

    /// Begin a changeover for the selected transition, returning the
    /// filtered and ordered work plan.
    pub async fn begin(&self, request: BeginChangeover) -> Result<WorkPlan> {
        self.call(|reply| Command::Begin(request, reply)).await
    }

    /// Resume the persisted session, if any. A malformed persisted record
    /// means there is nothing to resume.
    pub async fn resume(&self) -> Result<Option<WorkPlan>> {
        self.call(Command::Resume).await
    }

    /// Complete the active session and clear its persisted record.
    pub async fn complete(&self) -> Result<()> {
        self.call(Command::Complete).await
    }

    /// Snapshot of the active session's work plan.
    pub async fn plan(&self) -> Result<WorkPlan> {
        self.call(Command::Plan).await
    }

    /// The active session record, if any.
    pub async fn session(&self) -> Result<Option<ChangeoverSession>> {
        self.call(Command::Session).await
    }

    pub async fn current_step(&self, work_group: &str) -> Result<Option<StepDefinition>> {
        let work_group = work_group.to_string();
        self.call(|reply| Command::CurrentStep { work_group, reply })
            .await
    }

    /// Advance within a group's sequence. `None` at the end of the group.
    pub async fn next_step(&self, work_group: &str) -> Result<Option<StepDefinition>> {
        let work_group = work_group.to_string();
        self.call(|reply| Command::NextStep { work_group, reply })
            .await
    }

    /// Step back within a group's sequence. `None` at the start.
    pub async fn previous_step(&self, work_group: &str) -> Result<Option<StepDefinition>> {
        let work_group = work_group.to_string();
        self.call(|reply| Command::PreviousStep { work_group, reply })
            .await
    }

    pub async fn validate_step(
        &self,
        step_id: i64,
        comment: &str,
        description: &str,
        elapsed_secs: i64,
    ) -> Result<StepRuntimeState> {
        let comment = comment.to_string();
        let description = description.to_string();
        self.call(|reply| Command::ValidateStep {
            step_id,
            comment,
            description,
            elapsed_secs,
            reply,
        })
        .await
    }

    pub async fn invalidate_step(&self, step_id: i64) -> Result<StepRuntimeState> {
        self.call(|reply| Command::InvalidateStep { step_id, reply })
            .await
    }

    pub async fn set_comment(&self, step_id: i64, comment: &str) -> Result<StepRuntimeState> {
        let comment = comment.to_string();
        self.call(|reply| Command::SetComment {
            step_id,
            comment,
            reply,
        })
        .await
    }

    /// Record that a step was shown, creating its runtime record on first
    /// display.
    pub async fn mark_displayed(&self, step_id: i64) -> Result<StepRuntimeState> {
        self.call(|reply| Command::MarkDisplayed { step_id, reply })
            .await
    }

    pub async fn runtime_state(&self, step_id: i64) -> Result<Option<StepRuntimeState>> {
        self.call(|reply| Command::RuntimeState { step_id, reply })
            .await
    }
}

struct ActiveSession {
    session: ChangeoverSession,
    groups: BTreeMap<String, Vec<StepDefinition>>,
}

/// Coordinator actor: owns all session/group/index state and processes one
/// command at a time from its queue.
pub struct ChangeoverCoordinator {
    repository: Arc<StepRepository>,
    registry: Arc<ExclusionRuleRegistry>,
    kv: Arc<dyn KeyValueStore>,
    active: Option<ActiveSession>,
    rx: mpsc::Receiver<Command>,
}

impl ChangeoverCoordinator {
    /// Spawn the coordinator task and return its handle. The task stops
    /// when every handle has been dropped.
    pub fn spawn(
        repository: Arc<StepRepository>,
        registry: Arc<ExclusionRuleRegistry>,
        kv: Arc<dyn KeyValueStore>,
    ) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let coordinator = Self {
            repository,
            registry,
            kv,
            active: None,
            rx,
        };
        tokio::spawn(coordinator.run());
        CoordinatorHandle { tx }
    }

    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
        debug!("Coordinator queue closed, stopping");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Begin(request, reply) => {
                let _ = reply.send(self.begin(request).await);
            }
            Command::Resume(reply) => {
                let _ = reply.send(self.resume().await);
            }
            Command::Complete(reply) => {
                let _ = reply.send(self.complete().await);
            }
            Command::Plan(reply) => {
                let _ = reply.send(self.plan());
            }
            Command::Session(reply) => {
                let _ = reply.send(Ok(self.active.as_ref().map(|a| a.session.clone())));
            }
            Command::CurrentStep { work_group, reply } => {
                let _ = reply.send(self.current_step(&work_group));
            }
            Command::NextStep { work_group, reply } => {
                let _ = reply.send(self.move_step(&work_group, 1).await);
            }
            Command::PreviousStep { work_group, reply } => {
                let _ = reply.send(self.move_step(&work_group, -1).await);
            }
            Command::ValidateStep {
                step_id,
                comment,
                description,
                elapsed_secs,
                reply,
            } => {
                let result = match self.require_step(step_id) {
                    Ok(()) => {
                        self.repository
                            .validate(step_id, &comment, &description, elapsed_secs)
                            .await
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            Command::InvalidateStep { step_id, reply } => {
                let result = match self.require_step(step_id) {
                    Ok(()) => self.repository.unvalidate(step_id).await,
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            Command::SetComment {
                step_id,
                comment,
                reply,
            } => {
                let result = match self.require_step(step_id) {
                    Ok(()) => {
                        self.repository
                            .state_machine()
                            .set_comment(step_id, &comment)
                            .await
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            Command::MarkDisplayed { step_id, reply } => {
                let result = match self.require_step(step_id) {
                    Ok(()) => self.repository.state_machine().touch_displayed(step_id).await,
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
            }
            Command::RuntimeState { step_id, reply } => {
                let _ = reply.send(self.repository.runtime_state(step_id).await);
            }
        }
    }

    async fn begin(&mut self, request: BeginChangeover) -> Result<WorkPlan> {
        let session = ChangeoverSession::new(
            request.from_config,
            request.to_config,
            request.zone,
            request.intervention_type,
            request.process_scope,
        );
        // Session start is the one read that prefers the freshest set; a
        // dead remote still degrades to the cache.
        let definitions = self.repository.refresh().await?;
        let groups = self.build_groups(&session, definitions);

        self.persist_session(&session).await?;
        info!(
            from_config = session.from_config,
            to_config = session.to_config,
            zone = %session.zone,
            groups = groups.len(),
            "Changeover session started"
        );
        self.active = Some(ActiveSession { session, groups });
        self.plan()
    }

    async fn resume(&mut self) -> Result<Option<WorkPlan>> {
        let payload = match self.kv.get(ACTIVE_SESSION_KEY).await? {
            Some(payload) if !payload.is_empty() => payload,
            _ => return Ok(None),
        };
        let session: ChangeoverSession = match serde_json::from_str(&payload) {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "Persisted session is malformed, nothing to resume");
                return Ok(None);
            }
        };

        let definitions = self.repository.fetch_all().await?;
        let groups = self.build_groups(&session, definitions);
        info!(
            from_config = session.from_config,
            to_config = session.to_config,
            "Changeover session resumed"
        );
        self.active = Some(ActiveSession { session, groups });
        self.plan().map(Some)
    }

    async fn complete(&mut self) -> Result<()> {
        let active = self.active.take().ok_or(ChangeoverError::SessionNotActive)?;
        // The KV contract has no delete; an empty record means no session.
        self.kv.set(ACTIVE_SESSION_KEY, "").await?;
        info!(
            from_config = active.session.from_config,
            to_config = active.session.to_config,
            "Changeover session completed"
        );
        Ok(())
    }

    /// Exclusion filtering, per-work-group partition, per-group ordering.
    fn build_groups(
        &self,
        session: &ChangeoverSession,
        definitions: Vec<StepDefinition>,
    ) -> BTreeMap<String, Vec<StepDefinition>> {
        let excluded = self
            .registry
            .get_excluded_steps(Some(session.from_config), Some(session.to_config));

        let mut partitioned: BTreeMap<String, Vec<StepDefinition>> = BTreeMap::new();
        for definition in definitions {
            if excluded.contains(&definition.id) {
                continue;
            }
            partitioned
                .entry(definition.work_group.clone())
                .or_default()
                .push(definition);
        }

        partitioned
            .into_iter()
            .map(|(group, candidates)| (group, order_steps(&candidates)))
            .collect()
    }

    fn plan(&self) -> Result<WorkPlan> {
        let active = self.active.as_ref().ok_or(ChangeoverError::SessionNotActive)?;
        let positions = active
            .groups
            .iter()
            .map(|(group, steps)| {
                let index = active
                    .session
                    .index_for(group)
                    .min(steps.len().saturating_sub(1));
                (group.clone(), index)
            })
            .collect();
        Ok(WorkPlan {
            groups: active.groups.clone(),
            positions,
        })
    }

    fn current_step(&self, work_group: &str) -> Result<Option<StepDefinition>> {
        let active = self.active.as_ref().ok_or(ChangeoverError::SessionNotActive)?;
        let Some(steps) = active.groups.get(work_group) else {
            return Ok(None);
        };
        Ok(steps.get(active.session.index_for(work_group)).cloned())
    }

    async fn move_step(&mut self, work_group: &str, delta: i64) -> Result<Option<StepDefinition>> {
        let active = self.active.as_mut().ok_or(ChangeoverError::SessionNotActive)?;
        let Some(steps) = active.groups.get(work_group) else {
            return Ok(None);
        };

        let current = active.session.index_for(work_group) as i64;
        let target = current + delta;
        if target < 0 || target as usize >= steps.len() {
            return Ok(None);
        }

        let target = target as usize;
        active
            .session
            .resume_indices
            .insert(work_group.to_string(), target);
        let step = steps[target].clone();

        let session = active.session.clone();
        self.persist_session(&session).await?;
        Ok(Some(step))
    }

    /// Local membership check against the session's candidate set; excluded
    /// or unknown ids never reach the remote layer.
    fn require_step(&self, step_id: i64) -> Result<()> {
        let active = self.active.as_ref().ok_or(ChangeoverError::SessionNotActive)?;
        let known = active
            .groups
            .values()
            .any(|steps| steps.iter().any(|step| step.id == step_id));
        if known {
            Ok(())
        } else {
            Err(ChangeoverError::NotFound { step_id })
        }
    }

    async fn persist_session(&self, session: &ChangeoverSession) -> Result<()> {
        let payload = serde_json::to_string(session)
            .map_err(|e| ChangeoverError::serialization("session", e))?;
        self.kv.set(ACTIVE_SESSION_KEY, &payload).await
    }
}
