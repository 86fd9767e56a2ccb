//! # Persistence Seams
//!
//! Two storage traits back the engine: a string key-value store (exclusion
//! rule table, session record) and a row-oriented step cache (definitions
//! and runtime state). Both are async seams injected by the application
//! root, with two shipped implementations:
//!
//! - [`SqliteStore`] — embedded SQLite via sqlx; the production offline
//!   cache. Batch upserts run inside one transaction so readers never
//!   observe a torn mix of old and new rows.
//! - [`MemoryStore`] — `parking_lot`-guarded maps; ephemeral fallback and
//!   the default test double.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{StepDefinition, StepRuntimeState};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persistent string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Embedded row-oriented cache for step definitions and runtime state.
#[async_trait]
pub trait StepCache: Send + Sync {
    /// All cached step definitions, ordered by id.
    async fn all_definitions(&self) -> Result<Vec<StepDefinition>>;

    async fn definition_by_id(&self, id: i64) -> Result<Option<StepDefinition>>;

    /// Full-record upsert by id for the whole batch; never a partial field
    /// merge, and never observable half-applied.
    async fn upsert_definitions(&self, definitions: &[StepDefinition]) -> Result<()>;

    /// Remove one cached definition. Returns whether a row existed.
    async fn delete_definition(&self, id: i64) -> Result<bool>;

    async fn runtime_state(&self, step_id: i64) -> Result<Option<StepRuntimeState>>;

    async fn upsert_runtime_state(&self, state: &StepRuntimeState) -> Result<()>;
}
