//! Error types for glueflow core library.
//!
//! Uses hierarchical domain-specific errors following the thiserror pattern.

use thiserror::Error;

/// Result type alias for glueflow operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for glueflow.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Object storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Raw data upload failed (fatal pipeline step)
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Crawler-related error
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlerError),

    /// Job-control error
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    /// Alarm or audit trail provisioning error
    #[error("Monitoring error: {0}")]
    Monitoring(#[from] MonitoringError),

    /// Transformation job error
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Could not build a store for a bucket
    #[error("Failed to open bucket {bucket}: {message}")]
    Open { bucket: String, message: String },

    /// Object or bucket does not exist
    #[error("Not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Write failed
    #[error("Failed to write s3://{bucket}/{key}: {message}")]
    Write {
        bucket: String,
        key: String,
        message: String,
    },

    /// Read failed
    #[error("Failed to read s3://{bucket}/{key}: {message}")]
    Read {
        bucket: String,
        key: String,
        message: String,
    },

    /// Listing failed
    #[error("Failed to list s3://{bucket}/{prefix}: {message}")]
    List {
        bucket: String,
        prefix: String,
        message: String,
    },

    /// Local source file could not be read
    #[error("Failed to read local file {path}: {message}")]
    LocalFile { path: String, message: String },
}

/// Glue crawler errors.
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// StartCrawler call rejected
    #[error("Failed to start crawler {name}: {message}")]
    StartFailed { name: String, message: String },

    /// GetCrawler call rejected
    #[error("Failed to query crawler {name}: {message}")]
    StatusFailed { name: String, message: String },

    /// Crawl finished unsuccessfully
    #[error("Crawler {name} finished with status {status}")]
    CrawlFailed { name: String, status: String },

    /// Crawl did not finish in time
    #[error("Timed out after {seconds}s waiting for crawler {name}")]
    Timeout { name: String, seconds: u64 },
}

/// Glue job-control errors.
#[derive(Error, Debug)]
pub enum JobError {
    /// StartJobRun call rejected
    #[error("Failed to start job {name}: {message}")]
    StartFailed { name: String, message: String },

    /// StartJobRun returned no run id
    #[error("Job {0} started without a run id")]
    MissingRunId(String),

    /// GetJobRun call rejected
    #[error("Failed to query run {run_id} of job {name}: {message}")]
    StatusFailed {
        name: String,
        run_id: String,
        message: String,
    },

    /// Run reached a terminal state other than success
    #[error("Run {run_id} of job {name} ended in state {state}")]
    RunFailed {
        name: String,
        run_id: String,
        state: String,
    },

    /// Run did not finish in time
    #[error("Timed out after {seconds}s waiting for run {run_id} of job {name}")]
    Timeout {
        name: String,
        run_id: String,
        seconds: u64,
    },
}

/// CloudWatch / CloudTrail provisioning errors.
#[derive(Error, Debug)]
pub enum MonitoringError {
    /// PutMetricAlarm failed
    #[error("Failed to put alarm {name}: {message}")]
    Alarm { name: String, message: String },

    /// Trail lookup, creation or start failed
    #[error("Trail {name}: {message}")]
    Trail { name: String, message: String },
}

/// Transformation job errors.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Required job argument was not supplied
    #[error("Missing required job argument --{0}")]
    MissingArgument(String),

    /// Input has no header row
    #[error("Input has no header row")]
    MissingHeader,

    /// CSV could not be parsed
    #[error("CSV parse error: {0}")]
    Csv(String),

    /// Arrow conversion failed
    #[error("Arrow conversion error: {0}")]
    Arrow(String),

    /// Parquet encoding failed
    #[error("Parquet write error: {0}")]
    ParquetWrite(String),

    /// Invalid input or output location
    #[error("Invalid location: {0}")]
    Location(String),

    /// Row width differs from the header width
    #[error("Row {row} has {found} fields, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Input files under one prefix disagree on the header
    #[error("Header of {source_file} is {found:?}, expected {expected:?}")]
    HeaderMismatch {
        source_file: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Two columns map to the same lowercase name
    #[error("Columns {first} and {second} both become {lowercase}")]
    DuplicateColumn {
        first: String,
        second: String,
        lowercase: String,
    },
}

// Conversion implementations for external error types

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<csv::Error> for TransformError {
    fn from(err: csv::Error) -> Self {
        TransformError::Csv(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for TransformError {
    fn from(err: arrow::error::ArrowError) -> Self {
        TransformError::Arrow(err.to_string())
    }
}

impl From<parquet::errors::ParquetError> for TransformError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        TransformError::ParquetWrite(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("invalid value".into());
        assert_eq!(err.to_string(), "Configuration error: invalid value");

        let storage_err = StorageError::NotFound {
            bucket: "raw".into(),
            key: "input/data.csv".into(),
        };
        let err: Error = storage_err.into();
        assert_eq!(
            err.to_string(),
            "Storage error: Not found: s3://raw/input/data.csv"
        );
    }

    #[test]
    fn test_crawler_error() {
        let err = CrawlerError::Timeout {
            name: "raw-data-crawler".into(),
            seconds: 900,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 900s waiting for crawler raw-data-crawler"
        );
    }

    #[test]
    fn test_job_error() {
        let err: Error = JobError::RunFailed {
            name: "etl".into(),
            run_id: "jr_1".into(),
            state: "FAILED".into(),
        }
        .into();
        assert!(err.to_string().starts_with("Job error:"));
        assert!(err.to_string().contains("FAILED"));
    }

    #[test]
    fn test_transform_error() {
        let err = TransformError::MissingArgument("input_path".into());
        assert_eq!(err.to_string(), "Missing required job argument --input_path");
    }
}
