use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{KeyValueStore, StepCache};
use crate::error::Result;
use crate::models::{StepDefinition, StepRuntimeState};

/// In-memory implementation of both storage seams.
///
/// Ephemeral: suitable for tests and for running without a cache file.
/// Writes take the lock for the whole batch, so reads are batch-consistent
/// like the SQLite transaction behavior.
#[derive(Default)]
pub struct MemoryStore {
    kv: RwLock<HashMap<String, String>>,
    definitions: RwLock<BTreeMap<i64, StepDefinition>>,
    runtime_states: RwLock<HashMap<i64, StepRuntimeState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.kv.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl StepCache for MemoryStore {
    async fn all_definitions(&self) -> Result<Vec<StepDefinition>> {
        Ok(self.definitions.read().values().cloned().collect())
    }

    async fn definition_by_id(&self, id: i64) -> Result<Option<StepDefinition>> {
        Ok(self.definitions.read().get(&id).cloned())
    }

    async fn upsert_definitions(&self, definitions: &[StepDefinition]) -> Result<()> {
        let mut map = self.definitions.write();
        for definition in definitions {
            map.insert(definition.id, definition.clone());
        }
        Ok(())
    }

    async fn delete_definition(&self, id: i64) -> Result<bool> {
        Ok(self.definitions.write().remove(&id).is_some())
    }

    async fn runtime_state(&self, step_id: i64) -> Result<Option<StepRuntimeState>> {
        Ok(self.runtime_states.read().get(&step_id).cloned())
    }

    async fn upsert_runtime_state(&self, state: &StepRuntimeState) -> Result<()> {
        self.runtime_states.write().insert(state.step_id, state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: i64) -> StepDefinition {
        StepDefinition {
            id,
            label: format!("step-{id}"),
            work_group: "press".into(),
            role: "operator".into(),
            phase: "internal".into(),
            estimated_secs: 60,
            description: String::new(),
            predecessors: vec![],
            successors: vec![],
            precondition: None,
        }
    }

    #[tokio::test]
    async fn test_kv_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".into()));
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".into()));
    }

    #[tokio::test]
    async fn test_definition_upsert_replaces_whole_record() {
        let store = MemoryStore::new();
        store.upsert_definitions(&[step(1), step(2)]).await.unwrap();

        let mut edited = step(1);
        edited.label = "renamed".into();
        edited.predecessors = vec![2];
        store.upsert_definitions(&[edited.clone()]).await.unwrap();

        assert_eq!(store.definition_by_id(1).await.unwrap(), Some(edited));
        assert_eq!(store.all_definitions().await.unwrap().len(), 2);
        assert!(store.delete_definition(2).await.unwrap());
        assert!(!store.delete_definition(2).await.unwrap());
    }

    #[tokio::test]
    async fn test_runtime_state_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.runtime_state(5).await.unwrap(), None);

        let state = StepRuntimeState::new(5);
        store.upsert_runtime_state(&state).await.unwrap();
        assert_eq!(store.runtime_state(5).await.unwrap(), Some(state));
    }
}
