//! Durable key-value storage for the wardrobe collections.
//!
//! Each collection is one record holding a JSON array, keyed by name
//! (`locations`, `clothes`). Backends only deal in strings; typed access goes
//! through [`CollectionStore`].

pub mod json_store;
pub mod memory;
pub mod sqlite_store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite_store::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt record '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write several records. Backends that support transactions override this
    /// so either every record lands or none does. The default writes in order
    /// and stops at the first failure, leaving earlier records written.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }
}

/// Typed view over a [`KeyValueStore`] holding JSON-encoded sequences.
#[derive(Clone)]
pub struct CollectionStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CollectionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the sequence stored under `key`. A missing key is an empty sequence.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        match self.kv.get(key).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = encode(key, items)?;
        self.kv.set(key, &raw).await
    }

    /// Persist two collections in one write. Without a transactional backend
    /// `first` may land alone.
    pub async fn save_pair<A: Serialize, B: Serialize>(
        &self,
        first: (&str, &[A]),
        second: (&str, &[B]),
    ) -> Result<(), StoreError> {
        let entries = [
            (first.0, encode(first.0, first.1)?),
            (second.0, encode(second.0, second.1)?),
        ];
        self.kv.set_many(&entries).await
    }
}

fn encode<T: Serialize>(key: &str, items: &[T]) -> Result<String, StoreError> {
    serde_json::to_string(items).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}
