//! glueflow core - S3 + Glue ETL pipeline
//!
//! This library provides:
//!
//! - A storage gateway for uploading raw data and listing processed output
//! - Glue crawler and job orchestration with completion polling
//! - CloudWatch alarm and CloudTrail audit trail provisioning
//! - The CSV to Parquet transformation job itself

pub mod aws;
pub mod config;
pub mod error;
pub mod glue;
pub mod monitoring;
pub mod pipeline;
pub mod storage;
pub mod transform;

// Re-export commonly used types
pub use config::Config;
pub use error::{CrawlerError, JobError, MonitoringError, StorageError, TransformError};
pub use error::{Error, Result};
