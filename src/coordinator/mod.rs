//! # Changeover Session Coordinator
//!
//! Single owner of all session, work-group, and position state for one
//! in-progress changeover. Runs as a command-queue actor: callers hold a
//! cloneable [`CoordinatorHandle`] whose async methods enqueue a command
//! and await the reply, and the coordinator task processes one command at a
//! time. That queue is the serialization guarantee — two concurrent
//! validate calls against the same step cannot race, independent of any UI
//! framework's execution model.

pub mod commands;
pub mod coordinator;

pub use commands::{BeginChangeover, WorkPlan};
pub use coordinator::{ChangeoverCoordinator, CoordinatorHandle};
