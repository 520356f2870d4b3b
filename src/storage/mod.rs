// src/storage/mod.rs

pub mod gcs;
pub mod memory;

use async_trait::async_trait;

use crate::error::PipelineResult;

pub use gcs::GcsStore;
pub use memory::MemoryObjectStore;

/// Blob store keyed by bucket + object name.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite `name` in `bucket`.
    async fn put(&self, bucket: &str, name: &str, data: Vec<u8>) -> PipelineResult<()>;

    async fn get(&self, bucket: &str, name: &str) -> PipelineResult<Vec<u8>>;

    async fn delete(&self, bucket: &str, name: &str) -> PipelineResult<()>;
}

/// `gs://<bucket>/<name>`
pub fn object_uri(bucket: &str, name: &str) -> String {
    format!("gs://{}/{}", bucket, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_has_no_prefix() {
        assert_eq!(object_uri("b", "source1.csv"), "gs://b/source1.csv");
    }
}
