use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

// Infrastructure layer: key-value backends and the collection façade
pub mod database;
pub use database::{Batch, Database};

pub mod file_store;
pub use file_store::JsonFileKeyValueStore;

pub mod postgres_store;
pub use postgres_store::PostgresKeyValueStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database has not been initialized")]
    NotReady,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Collection '{key}' is corrupt: {source}")]
    CorruptCollection {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A persistent mapping from string keys to JSON values.
///
/// Values are read and replaced whole. `put_many` must apply every entry or
/// none of them.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;
    async fn put_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()>;
    async fn keys(&self) -> StoreResult<Vec<String>>;

    async fn put(&self, key: &str, value: Value) -> StoreResult<()> {
        self.put_many(vec![(key.to_string(), value)]).await
    }
}

pub struct InMemoryKeyValueStore {
    pub entries: Mutex<HashMap<String, Value>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn put_many(&self, batch: Vec<(String, Value)>) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.extend(batch);
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
