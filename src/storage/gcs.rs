use anyhow::{Context, Result};
use async_trait::async_trait;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::objects::{
        delete::DeleteObjectRequest,
        download::Range,
        get::GetObjectRequest,
        upload::{Media, UploadObjectRequest, UploadType},
    },
};
use tracing::{debug, instrument};

use super::ObjectStore;
use crate::error::{PipelineError, PipelineResult};

/// Google Cloud Storage, authenticated with application default credentials.
pub struct GcsStore {
    client: Client,
}

impl GcsStore {
    pub async fn connect() -> Result<Self> {
        let cfg = ClientConfig::default()
            .with_auth()
            .await
            .context("authenticating to GCS")?;
        Ok(Self {
            client: Client::new(cfg),
        })
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    #[instrument(level = "debug", skip(self, data), fields(bytes = data.len()))]
    async fn put(&self, bucket: &str, name: &str, data: Vec<u8>) -> PipelineResult<()> {
        let mut media = Media::new(name.to_string());
        media.content_type = "text/csv".into();
        media.content_length = Some(data.len() as u64);
        let request = UploadObjectRequest {
            bucket: bucket.to_string(),
            ..Default::default()
        };
        self.client
            .upload_object(&request, data, &UploadType::Simple(media))
            .await
            .map_err(|e| PipelineError::storage(bucket, name, e))?;
        debug!("uploaded object");
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> PipelineResult<Vec<u8>> {
        let request = GetObjectRequest {
            bucket: bucket.to_string(),
            object: name.to_string(),
            ..Default::default()
        };
        self.client
            .download_object(&request, &Range::default())
            .await
            .map_err(|e| PipelineError::storage(bucket, name, e))
    }

    async fn delete(&self, bucket: &str, name: &str) -> PipelineResult<()> {
        let request = DeleteObjectRequest {
            bucket: bucket.to_string(),
            object: name.to_string(),
            ..Default::default()
        };
        self.client
            .delete_object(&request)
            .await
            .map_err(|e| PipelineError::storage(bucket, name, e))
    }
}
