use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex};

use super::ObjectStore;
use crate::error::{PipelineError, PipelineResult};

/// Object store held in a map keyed by `(bucket, name)`.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object names in `bucket`, sorted.
    pub fn names(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, n)| n.clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, bucket: &str, name: &str, data: Vec<u8>) -> PipelineResult<()> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((bucket.to_string(), name.to_string()), data);
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> PipelineResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(bucket.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| PipelineError::storage(bucket, name, "no such object"))
    }

    async fn delete(&self, bucket: &str, name: &str) -> PipelineResult<()> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(bucket.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| PipelineError::storage(bucket, name, "no such object"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryObjectStore::new();
        store.put("b", "x.csv", b"a\n".to_vec()).await.unwrap();
        store.put("b", "x.csv", b"b\n".to_vec()).await.unwrap();
        assert_eq!(store.get("b", "x.csv").await.unwrap(), b"b\n".to_vec());
        assert_eq!(store.names("b"), vec!["x.csv"]);
        store.delete("b", "x.csv").await.unwrap();
        assert!(matches!(
            store.get("b", "x.csv").await,
            Err(PipelineError::Storage { .. })
        ));
    }
}
