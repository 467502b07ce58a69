//! Subcommand implementations.

pub mod provision;
pub mod run;
pub mod transform;
pub mod verify;

use glueflow_core::config::Config;
use glueflow_core::storage::{ObjectStoreStorage, StorageGateway};
use std::sync::Arc;

/// Object storage for the configured backend.
pub fn object_storage(config: &Config) -> Arc<ObjectStoreStorage> {
    Arc::new(ObjectStoreStorage::new(
        config.storage.clone(),
        config.aws.clone(),
    ))
}

/// Storage gateway for the configured backend.
pub fn gateway(config: &Config) -> StorageGateway {
    StorageGateway::new(object_storage(config))
}
