//! Object storage access.
//!
//! - [`ObjectStorage`]: the seam every component talks to
//! - [`ObjectStoreStorage`]: S3 / local filesystem / in-memory backends
//! - [`StorageGateway`]: upload and listing with the pipeline's failure policy
//! - [`ObjectLocation`]: `s3://bucket/key` or local path arguments

mod gateway;
mod location;
mod store;

pub use gateway::{ObjectRef, StorageGateway};
pub use location::ObjectLocation;
pub use store::ObjectStoreStorage;

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

/// Operations against a bucket-addressed object store.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a local file to `bucket/key`, replacing any existing object.
    async fn put_file(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()>;

    /// Write bytes to `bucket/key`, replacing any existing object.
    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<()>;

    /// Read the whole object at `bucket/key`.
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// List keys starting with `prefix`, sorted.
    ///
    /// A bucket or prefix that does not exist yields an empty list.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;
}
