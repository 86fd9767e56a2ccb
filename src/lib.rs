#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Changeover Core
//!
//! Workflow engine for machine changeovers: reconfiguring a production line
//! from one physical configuration to another through a set of procedural
//! steps.
//!
//! ## Overview
//!
//! Given the authoritative step set, the engine filters out steps that do
//! not apply to the selected configuration transition, computes a
//! dependency-respecting execution order per work-group, tracks each step's
//! validation lifecycle with elapsed-time accounting, and reconciles step
//! records between the remote source and an embedded cache so work can
//! continue offline.
//!
//! Rendering, input handling, transport connectivity, and live telemetry
//! are external collaborators behind the [`remote`] and [`storage`] seams.
//!
//! ## Module Organization
//!
//! - [`models`] - Step definitions, runtime state, exclusion rules, session
//! - [`resolver`] - Pure per-group dependency ordering
//! - [`registry`] - Transition-keyed exclusion rule table
//! - [`state_machine`] - Remote-first validation lifecycle
//! - [`repository`] - Cache/remote reconciliation
//! - [`coordinator`] - Session actor owning all group/index state
//! - [`storage`] / [`remote`] - Persistence and remote service seams
//! - [`config`] / [`logging`] / [`error`] - Ambient concerns
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use changeover_core::{
//!     BeginChangeover, ChangeoverCoordinator, ExclusionRuleRegistry,
//!     MemoryStore, StepRepository,
//! };
//! # use changeover_core::remote::RemoteStepService;
//!
//! # async fn example(remote: Arc<dyn RemoteStepService>) -> changeover_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let repository = Arc::new(StepRepository::new(store.clone(), remote));
//! let registry = Arc::new(ExclusionRuleRegistry::open(store.clone()).await?);
//!
//! let handle = ChangeoverCoordinator::spawn(repository, registry, store);
//! let plan = handle
//!     .begin(BeginChangeover {
//!         from_config: 12,
//!         to_config: 16,
//!         zone: "line-3".into(),
//!         intervention_type: "planned".into(),
//!         process_scope: "full".into(),
//!     })
//!     .await?;
//!
//! for group in plan.group_names() {
//!     println!("{group}: {} steps", plan.groups[group].len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod models;
pub mod registry;
pub mod remote;
pub mod repository;
pub mod resolver;
pub mod state_machine;
pub mod storage;

pub use config::ChangeoverConfig;
pub use coordinator::{BeginChangeover, ChangeoverCoordinator, CoordinatorHandle, WorkPlan};
pub use error::{ChangeoverError, Result};
pub use models::{
    ChangeoverSession, ExclusionTable, StepDefinition, StepRuntimeState, TransitionKey,
};
pub use registry::{default_rules, ExclusionRuleRegistry};
pub use remote::RemoteStepService;
pub use repository::StepRepository;
pub use resolver::{order_steps, order_steps_strict};
pub use state_machine::{StepLifecycle, StepValidationStateMachine, ValidationEvent};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StepCache};
