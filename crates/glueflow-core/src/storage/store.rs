//! `object_store` backed implementation of [`ObjectStorage`].

use crate::config::{AwsConfig, StorageBackend, StorageConfig};
use crate::error::StorageError;
use crate::storage::ObjectStorage;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::StreamExt;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Object storage over S3, the local filesystem or memory.
///
/// One store is created per bucket on first use and cached.
pub struct ObjectStoreStorage {
    config: StorageConfig,
    aws: AwsConfig,
    stores: DashMap<String, Arc<dyn ObjectStore>>,
}

impl ObjectStoreStorage {
    /// Create storage for the configured backend.
    pub fn new(config: StorageConfig, aws: AwsConfig) -> Self {
        info!(backend = ?config.backend, "Object storage initialized");
        Self {
            config,
            aws,
            stores: DashMap::new(),
        }
    }

    /// Create in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(
            StorageConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            AwsConfig::default(),
        )
    }

    fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        if let Some(store) = self.stores.get(bucket) {
            return Ok(Arc::clone(store.value()));
        }

        let entry = self
            .stores
            .entry(bucket.to_string())
            .or_try_insert_with(|| self.create_store(bucket))?;
        Ok(Arc::clone(entry.value()))
    }

    /// Create object store based on configuration.
    fn create_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        validate_bucket(bucket)?;

        match self.config.backend {
            StorageBackend::S3 => self.create_s3_store(bucket),
            StorageBackend::Local => self.create_local_store(bucket),
            StorageBackend::Memory => Ok(Arc::new(InMemory::new())),
        }
    }

    fn create_s3_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        use object_store::aws::AmazonS3Builder;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        if let Some(ref region) = self.aws.region {
            builder = builder.with_region(region);
        }

        if let Some(ref access_key) = self.aws.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(ref secret_key) = self.aws.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if let Some(ref endpoint) = self.aws.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder.build().map_err(|e| StorageError::Open {
            bucket: bucket.to_string(),
            message: e.to_string(),
        })?;

        debug!(bucket = %bucket, "Created S3 store");
        Ok(Arc::new(store))
    }

    fn create_local_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        use object_store::local::LocalFileSystem;

        let path = self.config.local_root.join(bucket);

        // Create directory if it doesn't exist
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| StorageError::Open {
                bucket: bucket.to_string(),
                message: format!("Failed to create local bucket directory: {}", e),
            })?;
        }

        let store = LocalFileSystem::new_with_prefix(&path).map_err(|e| StorageError::Open {
            bucket: bucket.to_string(),
            message: format!("Failed to create local file system store: {}", e),
        })?;

        debug!(bucket = %bucket, path = %path.display(), "Created local store");
        Ok(Arc::new(store))
    }
}

fn validate_bucket(bucket: &str) -> Result<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        return Err(Error::Storage(StorageError::Open {
            bucket: bucket.to_string(),
            message: "invalid bucket name".into(),
        }));
    }
    Ok(())
}

/// Directory part of a raw key prefix, used to narrow the listing.
fn list_root(prefix: &str) -> Option<ObjectPath> {
    prefix
        .rfind('/')
        .map(|idx| &prefix[..idx])
        .filter(|dir| !dir.is_empty())
        .map(ObjectPath::from)
}

#[async_trait]
impl ObjectStorage for ObjectStoreStorage {
    async fn put_file(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()> {
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| StorageError::LocalFile {
                path: local_path.display().to_string(),
                message: e.to_string(),
            })?;

        self.put(bucket, key, Bytes::from(data)).await
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()> {
        let store = self.store_for(bucket)?;
        let size = data.len();

        store
            .put(&ObjectPath::from(key), PutPayload::from_bytes(data))
            .await
            .map_err(|e| StorageError::Write {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        debug!(bucket = %bucket, key = %key, size_bytes = size, "Wrote object");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let store = self.store_for(bucket)?;
        let read_error = |e: object_store::Error| match e {
            object_store::Error::NotFound { .. } => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => StorageError::Read {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: other.to_string(),
            },
        };

        let result = store.get(&ObjectPath::from(key)).await.map_err(read_error)?;
        let bytes = result.bytes().await.map_err(read_error)?;
        Ok(bytes)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let store = self.store_for(bucket)?;
        let root = list_root(prefix);

        let mut stream = store.list(root.as_ref());
        let mut keys = Vec::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(meta) => {
                    let key = meta.location.to_string();
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
                Err(object_store::Error::NotFound { .. }) => {
                    debug!(bucket = %bucket, prefix = %prefix, "Listing target not found");
                    return Ok(Vec::new());
                }
                Err(e) => {
                    return Err(Error::Storage(StorageError::List {
                        bucket: bucket.to_string(),
                        prefix: prefix.to_string(),
                        message: e.to_string(),
                    }));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
