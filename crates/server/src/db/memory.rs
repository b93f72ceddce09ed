use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{Record, StorageBackend, StoreResult};

#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load(&self, collection: &str) -> StoreResult<Vec<Record>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn append(&self, collection: &str, record: &Record) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn overwrite(&self, collection: &str, records: &[Record]) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections.insert(collection.to_string(), records.to_vec());
        Ok(())
    }
}
