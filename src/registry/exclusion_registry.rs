use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::constants::EXCLUSION_RULES_KEY;
use crate::error::{ChangeoverError, Result};
use crate::models::{ExclusionTable, TransitionKey};
use crate::storage::KeyValueStore;

/// Shipped rule table: the four known transitions between the two line
/// configurations. Cross-configuration changeovers skip the steps that only
/// make sense when staying on the same configuration, and vice versa.
pub fn default_rules() -> ExclusionTable {
    let mut table = BTreeMap::new();
    table.insert(TransitionKey::new(12, 16), BTreeSet::from([30, 31, 72]));
    table.insert(TransitionKey::new(16, 12), BTreeSet::from([30, 31, 72]));
    table.insert(
        TransitionKey::new(12, 12),
        BTreeSet::from([29, 68, 69, 70, 71, 75]),
    );
    table.insert(
        TransitionKey::new(16, 16),
        BTreeSet::from([29, 68, 69, 70, 71, 75]),
    );
    table
}

/// Transition-keyed registry of excluded step ids.
///
/// The table is owned whole: reads come from an in-memory `Arc` snapshot,
/// and [`save_rules`](Self::save_rules) replaces the persisted entry and the
/// snapshot atomically, so concurrent readers observe either the pre- or
/// post-replace table, never a mix. Editing one transition means loading the
/// table, mutating it in memory, and saving the whole table back.
pub struct ExclusionRuleRegistry {
    store: Arc<dyn KeyValueStore>,
    table: RwLock<Arc<ExclusionTable>>,
}

impl ExclusionRuleRegistry {
    /// Open the registry over its persistence handle, installing the
    /// default table on first use.
    pub async fn open(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let registry = Self {
            store,
            table: RwLock::new(Arc::new(ExclusionTable::new())),
        };
        registry.load_rules().await?;
        Ok(registry)
    }

    /// Return the persisted table, installing and returning the default
    /// table if nothing has been persisted yet. A malformed persisted table
    /// falls back to the defaults, non-fatally.
    pub async fn load_rules(&self) -> Result<ExclusionTable> {
        let table = match self.store.get(EXCLUSION_RULES_KEY).await? {
            Some(payload) => match serde_json::from_str::<ExclusionTable>(&payload) {
                Ok(table) => table,
                Err(err) => {
                    warn!(
                        error = %err,
                        "Persisted exclusion rule table is malformed, falling back to defaults"
                    );
                    default_rules()
                }
            },
            None => {
                debug!("No persisted exclusion rules, installing default table");
                let defaults = default_rules();
                self.persist(&defaults).await?;
                defaults
            }
        };
        *self.table.write() = Arc::new(table.clone());
        Ok(table)
    }

    /// Atomic whole-table replace: one serialized write, then one snapshot
    /// swap. No partial-key patch operation exists.
    pub async fn save_rules(&self, table: ExclusionTable) -> Result<()> {
        self.persist(&table).await?;
        *self.table.write() = Arc::new(table);
        Ok(())
    }

    /// Excluded step ids for a transition. Empty when either configuration
    /// is absent or the transition has no entry.
    pub fn get_excluded_steps(&self, from_config: Option<u32>, to_config: Option<u32>) -> BTreeSet<i64> {
        let (Some(from), Some(to)) = (from_config, to_config) else {
            return BTreeSet::new();
        };
        self.table
            .read()
            .get(&TransitionKey::new(from, to))
            .cloned()
            .unwrap_or_default()
    }

    /// Current in-memory snapshot, without touching persistence.
    pub fn current_table(&self) -> Arc<ExclusionTable> {
        Arc::clone(&self.table.read())
    }

    async fn persist(&self, table: &ExclusionTable) -> Result<()> {
        let payload = serde_json::to_string(table)
            .map_err(|e| ChangeoverError::serialization("exclusion_rules", e))?;
        self.store.set(EXCLUSION_RULES_KEY, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_default_table_transitions() {
        let registry = ExclusionRuleRegistry::open(Arc::new(MemoryStore::new()))
            .await
            .unwrap();

        assert_eq!(
            registry.get_excluded_steps(Some(12), Some(16)),
            BTreeSet::from([30, 31, 72])
        );
        assert_eq!(
            registry.get_excluded_steps(Some(16), Some(12)),
            BTreeSet::from([30, 31, 72])
        );
        assert_eq!(
            registry.get_excluded_steps(Some(12), Some(12)),
            BTreeSet::from([29, 68, 69, 70, 71, 75])
        );
        assert!(registry.get_excluded_steps(None, Some(16)).is_empty());
        assert!(registry.get_excluded_steps(Some(12), None).is_empty());
        assert!(registry.get_excluded_steps(Some(1), Some(2)).is_empty());
    }

    #[tokio::test]
    async fn test_rules_persist_across_instances() {
        let store = Arc::new(MemoryStore::new());

        let registry = ExclusionRuleRegistry::open(Arc::clone(&store) as Arc<dyn KeyValueStore>)
            .await
            .unwrap();
        let mut table = registry.load_rules().await.unwrap();
        table.insert(TransitionKey::new(16, 18), BTreeSet::from([101]));
        registry.save_rules(table).await.unwrap();

        let reopened = ExclusionRuleRegistry::open(store).await.unwrap();
        assert_eq!(
            reopened.get_excluded_steps(Some(16), Some(18)),
            BTreeSet::from([101])
        );
        // The defaults survive the edit untouched.
        assert_eq!(
            reopened.get_excluded_steps(Some(12), Some(16)),
            BTreeSet::from([30, 31, 72])
        );
    }

    #[tokio::test]
    async fn test_malformed_persisted_table_falls_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set(EXCLUSION_RULES_KEY, "{not json").await.unwrap();

        let registry = ExclusionRuleRegistry::open(store).await.unwrap();
        assert_eq!(
            registry.get_excluded_steps(Some(12), Some(16)),
            BTreeSet::from([30, 31, 72])
        );
    }
}
