use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use super::{KeyValueStore, StepCache};
use crate::error::{ChangeoverError, Result};
use crate::models::{StepDefinition, StepRuntimeState};
use crate::state_machine::StepLifecycle;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS step_definitions (
        id INTEGER PRIMARY KEY,
        label TEXT NOT NULL,
        work_group TEXT NOT NULL,
        role TEXT NOT NULL,
        phase TEXT NOT NULL,
        estimated_secs INTEGER NOT NULL,
        description TEXT NOT NULL,
        predecessors TEXT NOT NULL,
        successors TEXT NOT NULL,
        precondition TEXT
    )",
    "CREATE TABLE IF NOT EXISTS step_runtime_states (
        step_id INTEGER PRIMARY KEY,
        lifecycle TEXT NOT NULL,
        elapsed_secs INTEGER NOT NULL,
        comment TEXT NOT NULL,
        last_displayed_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS kv_entries (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
];

/// Embedded SQLite store backing both the step cache and the key-value
/// entries. Self-initializing: the schema is created on connect.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Raw `step_definitions` row; id lists are JSON-encoded columns.
#[derive(FromRow)]
struct DefinitionRow {
    id: i64,
    label: String,
    work_group: String,
    role: String,
    phase: String,
    estimated_secs: i64,
    description: String,
    predecessors: String,
    successors: String,
    precondition: Option<String>,
}

impl DefinitionRow {
    fn into_model(self) -> Result<StepDefinition> {
        let predecessors = serde_json::from_str(&self.predecessors)
            .map_err(|e| ChangeoverError::serialization("step_definition.predecessors", e))?;
        let successors = serde_json::from_str(&self.successors)
            .map_err(|e| ChangeoverError::serialization("step_definition.successors", e))?;
        Ok(StepDefinition {
            id: self.id,
            label: self.label,
            work_group: self.work_group,
            role: self.role,
            phase: self.phase,
            estimated_secs: self.estimated_secs,
            description: self.description,
            predecessors,
            successors,
            precondition: self.precondition,
        })
    }
}

#[derive(FromRow)]
struct RuntimeStateRow {
    step_id: i64,
    lifecycle: String,
    elapsed_secs: i64,
    comment: String,
    last_displayed_at: Option<DateTime<Utc>>,
}

impl RuntimeStateRow {
    fn into_model(self) -> Result<StepRuntimeState> {
        let lifecycle: StepLifecycle = self
            .lifecycle
            .parse()
            .map_err(|e| ChangeoverError::serialization("step_runtime_state.lifecycle", e))?;
        Ok(StepRuntimeState {
            step_id: self.step_id,
            lifecycle,
            elapsed_secs: self.elapsed_secs,
            comment: self.comment,
            last_displayed_at: self.last_displayed_at,
        })
    }
}

impl SqliteStore {
    /// Connect to a SQLite database URL (e.g. `sqlite://changeover_cache.db`),
    /// creating the file and schema when missing.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database. One connection: each SQLite `:memory:`
    /// connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Cache schema ready");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv_entries WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl StepCache for SqliteStore {
    async fn all_definitions(&self) -> Result<Vec<StepDefinition>> {
        let rows: Vec<DefinitionRow> =
            sqlx::query_as("SELECT * FROM step_definitions ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(DefinitionRow::into_model).collect()
    }

    async fn definition_by_id(&self, id: i64) -> Result<Option<StepDefinition>> {
        let row: Option<DefinitionRow> =
            sqlx::query_as("SELECT * FROM step_definitions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(DefinitionRow::into_model).transpose()
    }

    async fn upsert_definitions(&self, definitions: &[StepDefinition]) -> Result<()> {
        // One transaction per batch: readers see pre- or post-batch rows,
        // never a mix.
        let mut tx = self.pool.begin().await?;
        for definition in definitions {
            let predecessors = serde_json::to_string(&definition.predecessors)
                .map_err(|e| ChangeoverError::serialization("step_definition.predecessors", e))?;
            let successors = serde_json::to_string(&definition.successors)
                .map_err(|e| ChangeoverError::serialization("step_definition.successors", e))?;
            sqlx::query(
                "INSERT INTO step_definitions
                   (id, label, work_group, role, phase, estimated_secs,
                    description, predecessors, successors, precondition)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO UPDATE SET
                   label = excluded.label,
                   work_group = excluded.work_group,
                   role = excluded.role,
                   phase = excluded.phase,
                   estimated_secs = excluded.estimated_secs,
                   description = excluded.description,
                   predecessors = excluded.predecessors,
                   successors = excluded.successors,
                   precondition = excluded.precondition",
            )
            .bind(definition.id)
            .bind(&definition.label)
            .bind(&definition.work_group)
            .bind(&definition.role)
            .bind(&definition.phase)
            .bind(definition.estimated_secs)
            .bind(&definition.description)
            .bind(predecessors)
            .bind(successors)
            .bind(&definition.precondition)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_definition(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM step_definitions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn runtime_state(&self, step_id: i64) -> Result<Option<StepRuntimeState>> {
        let row: Option<RuntimeStateRow> =
            sqlx::query_as("SELECT * FROM step_runtime_states WHERE step_id = ?1")
                .bind(step_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(RuntimeStateRow::into_model).transpose()
    }

    async fn upsert_runtime_state(&self, state: &StepRuntimeState) -> Result<()> {
        sqlx::query(
            "INSERT INTO step_runtime_states
               (step_id, lifecycle, elapsed_secs, comment, last_displayed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(step_id) DO UPDATE SET
               lifecycle = excluded.lifecycle,
               elapsed_secs = excluded.elapsed_secs,
               comment = excluded.comment,
               last_displayed_at = excluded.last_displayed_at",
        )
        .bind(state.step_id)
        .bind(state.lifecycle.to_string())
        .bind(state.elapsed_secs)
        .bind(&state.comment)
        .bind(state.last_displayed_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
