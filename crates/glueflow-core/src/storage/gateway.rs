//! Storage gateway used by the pipeline.
//!
//! Uploads never fail past this boundary: the caller gets `false` and the
//! cause is logged. Listings return a `Result` so an empty-but-healthy prefix
//! can be told apart from a broken store.

use crate::storage::ObjectStorage;
use crate::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A local file and the object it is uploaded to.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRef {
    /// Destination bucket
    pub bucket: String,
    /// Destination key
    pub key: String,
    /// Local source path
    pub source: PathBuf,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(
        source: impl Into<PathBuf>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Upload and listing front-end over an [`ObjectStorage`].
#[derive(Clone)]
pub struct StorageGateway {
    storage: Arc<dyn ObjectStorage>,
}

impl StorageGateway {
    /// Create a new gateway.
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self { storage }
    }

    /// Underlying storage.
    pub fn storage(&self) -> &Arc<dyn ObjectStorage> {
        &self.storage
    }

    /// Upload `local_path` to `bucket/key`.
    ///
    /// Returns `false` on any failure after logging the cause.
    pub async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> bool {
        match self.storage.put_file(local_path, bucket, key).await {
            Ok(()) => {
                info!(
                    source = %local_path.display(),
                    bucket = %bucket,
                    key = %key,
                    "Uploaded file"
                );
                true
            }
            Err(e) => {
                error!(
                    source = %local_path.display(),
                    bucket = %bucket,
                    key = %key,
                    error = %e,
                    "Upload failed"
                );
                false
            }
        }
    }

    /// Upload the file described by `object`.
    pub async fn upload_ref(&self, object: &ObjectRef) -> bool {
        self.upload(&object.source, &object.bucket, &object.key).await
    }

    /// List keys under `prefix`.
    ///
    /// `Ok(vec![])` means nothing matched; `Err` means the store could not be
    /// listed.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let keys = self.storage.list(bucket, prefix).await?;
        debug!(bucket = %bucket, prefix = %prefix, count = keys.len(), "Listed objects");
        Ok(keys)
    }
}
