use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use shared_types::DocumentKey;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::StorageConfig;
use crate::traits::ObjectClient;

/// [`ObjectClient`] over the `object_store` crate.
///
/// A store is built per container on demand, so one client serves any
/// number of buckets (or directories, for the local backend).
pub struct ObjectStoreClient {
    config: StorageConfig,
}

impl ObjectStoreClient {
    pub fn from_config(config: StorageConfig) -> Self {
        Self { config }
    }

    fn container_dir(root: &std::path::Path, container: &str) -> Result<PathBuf> {
        if container.is_empty()
            || container == "."
            || container == ".."
            || container.contains(['/', '\\'])
        {
            bail!("Invalid container name: {container:?}");
        }
        Ok(root.join(container))
    }

    fn store_for(&self, container: &str) -> Result<Arc<dyn ObjectStore>> {
        let store: Arc<dyn ObjectStore> = match &self.config {
            StorageConfig::Local { path } => {
                let dir = Self::container_dir(path, container)?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(&dir)
                        .with_context(|| format!("Failed to open container at {}", dir.display()))?,
                )
            }
            StorageConfig::S3 {
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                allow_http,
            } => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(container)
                    .with_allow_http(*allow_http);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(access_key_id) = access_key_id {
                    builder = builder.with_access_key_id(access_key_id);
                }
                if let Some(secret_access_key) = secret_access_key {
                    builder = builder.with_secret_access_key(secret_access_key);
                }
                Arc::new(builder.build()?)
            }
        };
        Ok(store)
    }

    fn document_path(key: &DocumentKey) -> Path {
        Path::from(key.document.as_str())
    }
}

/// S3 reports a missing bucket on listing as a generic client error, so the
/// error code in the response body is checked as well.
fn is_missing_bucket(err: &object_store::Error) -> bool {
    matches!(err, object_store::Error::NotFound { .. }) || err.to_string().contains("NoSuchBucket")
}

#[async_trait]
impl ObjectClient for ObjectStoreClient {
    #[instrument(skip(self))]
    async fn container_exists(&self, container: &str) -> Result<bool> {
        match &self.config {
            StorageConfig::Local { path } => {
                let dir = Self::container_dir(path, container)?;
                match tokio::fs::metadata(&dir).await {
                    Ok(meta) => Ok(meta.is_dir()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                    Err(e) => Err(e.into()),
                }
            }
            StorageConfig::S3 { .. } => {
                let store = self.store_for(container)?;
                match store.list_with_delimiter(None).await {
                    Ok(_) => Ok(true),
                    Err(e) if is_missing_bucket(&e) => Ok(false),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn document_exists(&self, key: &DocumentKey) -> Result<bool> {
        let store = self.store_for(&key.container)?;
        match store.head(&Self::document_path(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn download(&self, key: &DocumentKey) -> Result<Bytes> {
        let store = self.store_for(&key.container)?;
        let result = store
            .get(&Self::document_path(key))
            .await
            .with_context(|| format!("Failed to read document {key}"))?;
        let body = result.bytes().await?;
        debug!(bytes = body.len(), "Downloaded document");
        Ok(body)
    }

    #[instrument(skip(self, body), fields(bytes = body.len()))]
    async fn upload(&self, key: &DocumentKey, body: Bytes) -> Result<()> {
        let store = self.store_for(&key.container)?;
        store
            .put(&Self::document_path(key), PutPayload::from(body))
            .await
            .with_context(|| format!("Failed to write document {key}"))?;
        Ok(())
    }
}
