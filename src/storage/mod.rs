/*!
 * Persistent key/value storage for provider credentials.
 *
 * Adapters only need three operations (`get`, `set`, `remove`) over string
 * keys and values. Two backends are provided:
 * - `MemoryStore`: process-local map, used by tests and as a fallback
 * - `SqliteStore`: SQLite file under the user's data directory
 */

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Key/value store shared with the surrounding application
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Fetch the given keys; missing keys are absent from the result
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>>;

    /// Insert or replace every pair in `items`
    async fn set(&self, items: HashMap<String, String>) -> Result<()>;

    /// Delete the given keys; unknown keys are ignored
    async fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given pairs
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let values = self.values.read();
        Ok(keys
            .iter()
            .filter_map(|key| values.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    async fn set(&self, items: HashMap<String, String>) -> Result<()> {
        self.values.write().extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut values = self.values.write();
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
