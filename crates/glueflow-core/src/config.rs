//! Configuration structures for glueflow.
//!
//! Configuration is loaded from an optional TOML file, then overridden by the
//! environment variables the deployment scripts export, then by CLI flags.
//! The resulting [`Config`] is passed explicitly into every component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// AWS client configuration
    #[serde(default)]
    pub aws: AwsConfig,

    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Monitoring provisioning configuration
    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Transformation job configuration
    #[serde(default)]
    pub transform: TransformConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// AWS SDK configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AwsConfig {
    /// AWS region (falls back to the default provider chain)
    #[serde(default)]
    pub region: Option<String>,

    /// AWS access key ID
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// AWS secret access key
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Endpoint override (LocalStack, MinIO)
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Object storage backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Amazon S3 (default)
    #[default]
    S3,
    /// Local filesystem, one directory per bucket
    Local,
    /// In-process memory store
    Memory,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the local backend
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_root: default_local_root(),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Bucket receiving the raw input file
    #[serde(default = "default_raw_bucket")]
    pub raw_bucket: String,

    /// Bucket the transformation job writes to
    #[serde(default = "default_processed_bucket")]
    pub processed_bucket: String,

    /// Local raw data file to upload
    #[serde(default = "default_raw_data_file")]
    pub raw_data_file: PathBuf,

    /// Object key of the uploaded raw file
    #[serde(default = "default_raw_key")]
    pub raw_key: String,

    /// Prefix under the processed bucket holding job output
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Crawler settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Transformation job settings
    #[serde(default)]
    pub job: JobConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_bucket: default_raw_bucket(),
            processed_bucket: default_processed_bucket(),
            raw_data_file: default_raw_data_file(),
            raw_key: default_raw_key(),
            output_prefix: default_output_prefix(),
            crawler: CrawlerConfig::default(),
            job: JobConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Location the transformation job reads from.
    pub fn input_location(&self) -> String {
        format!("s3://{}/{}", self.raw_bucket, self.raw_key)
    }

    /// Location the transformation job writes to.
    pub fn output_location(&self) -> String {
        format!("s3://{}/{}", self.processed_bucket, self.output_prefix)
    }
}

/// Glue crawler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Crawler name
    #[serde(default = "default_crawler_name")]
    pub name: String,

    /// Wait for the crawl to finish before starting the job
    #[serde(default = "default_true")]
    pub wait_for_completion: bool,

    /// Interval between status polls in milliseconds
    #[serde(default = "default_crawler_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting after this many seconds
    #[serde(default = "default_crawler_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            name: default_crawler_name(),
            wait_for_completion: default_true(),
            poll_interval_ms: default_crawler_poll_interval_ms(),
            timeout_seconds: default_crawler_timeout_seconds(),
        }
    }
}

/// Glue job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobConfig {
    /// Job name
    #[serde(default = "default_job_name")]
    pub name: String,

    /// Wait for the run to reach a terminal state before verifying
    #[serde(default)]
    pub wait_for_completion: bool,

    /// Interval between status polls in milliseconds
    #[serde(default = "default_job_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting after this many seconds
    #[serde(default = "default_job_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: default_job_name(),
            wait_for_completion: false,
            poll_interval_ms: default_job_poll_interval_ms(),
            timeout_seconds: default_job_timeout_seconds(),
        }
    }
}

/// CloudWatch alarm and CloudTrail configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitoringConfig {
    /// Region alarms and trails are created in
    #[serde(default = "default_monitoring_region")]
    pub region: String,

    /// Bucket size alarm threshold in GB
    #[serde(default = "default_size_threshold_gb")]
    pub bucket_size_threshold_gb: u64,

    /// Athena workgroup watched for query failures
    #[serde(default = "default_workgroup")]
    pub workgroup: String,

    /// Audit trail name
    #[serde(default = "default_trail_name")]
    pub trail_name: String,

    /// Bucket receiving trail logs (defaults to the raw bucket)
    #[serde(default)]
    pub trail_bucket: Option<String>,

    /// Alarm action ARNs (e.g. SNS topics)
    #[serde(default)]
    pub alarm_actions: Vec<String>,

    /// Whether alarm actions fire
    #[serde(default)]
    pub actions_enabled: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            region: default_monitoring_region(),
            bucket_size_threshold_gb: default_size_threshold_gb(),
            workgroup: default_workgroup(),
            trail_name: default_trail_name(),
            trail_bucket: None,
            alarm_actions: Vec::new(),
            actions_enabled: false,
        }
    }
}

/// Parquet compression codec.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    /// Snappy compression (default, good balance)
    #[default]
    Snappy,
    /// Zstd compression (better ratio)
    Zstd,
    /// LZ4 compression (faster)
    Lz4,
    /// Gzip compression
    Gzip,
    /// No compression
    None,
}

impl ParquetCompression {
    /// Codec tag used in output file names.
    pub fn file_tag(&self) -> &'static str {
        match self {
            ParquetCompression::Snappy => "snappy",
            ParquetCompression::Zstd => "zstd",
            ParquetCompression::Lz4 => "lz4",
            ParquetCompression::Gzip => "gz",
            ParquetCompression::None => "uncompressed",
        }
    }
}

/// Transformation job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransformConfig {
    /// Parquet compression
    #[serde(default)]
    pub compression: ParquetCompression,

    /// Field delimiter of the raw input
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Maximum rows per Parquet row group
    #[serde(default = "default_max_row_group_size")]
    pub max_row_group_size: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::default(),
            delimiter: default_delimiter(),
            max_row_group_size: default_max_row_group_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default)]
    pub level: LogLevel,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    #[default]
    Info,
    /// Warn level
    Warn,
    /// Error level
    Error,
}

impl LogLevel {
    /// Directive string for an env filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Plain text format (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

// Default value functions
fn default_local_root() -> PathBuf {
    PathBuf::from("./buckets")
}
fn default_raw_bucket() -> String {
    "your-raw-bucket-name".to_string()
}
fn default_processed_bucket() -> String {
    "your-processed-bucket-name".to_string()
}
fn default_raw_data_file() -> PathBuf {
    PathBuf::from("data/raw/test_data.csv")
}
fn default_raw_key() -> String {
    "input/test_data.csv".to_string()
}
fn default_output_prefix() -> String {
    "output/".to_string()
}
fn default_crawler_name() -> String {
    "raw-data-crawler".to_string()
}
fn default_job_name() -> String {
    "supplychain-etl-job".to_string()
}
fn default_true() -> bool {
    true
}
fn default_crawler_poll_interval_ms() -> u64 {
    15_000
}
fn default_crawler_timeout_seconds() -> u64 {
    900
}
fn default_job_poll_interval_ms() -> u64 {
    30_000
}
fn default_job_timeout_seconds() -> u64 {
    3600
}
fn default_monitoring_region() -> String {
    "us-west-2".to_string()
}
fn default_size_threshold_gb() -> u64 {
    10
}
fn default_workgroup() -> String {
    "supplychain-analytics-wg".to_string()
}
fn default_trail_name() -> String {
    "supplychain-trail".to_string()
}
fn default_delimiter() -> char {
    ','
}
fn default_max_row_group_size() -> usize {
    128 * 1024
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from an optional file plus the process environment,
    /// then validate it.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("RAW_DATA_BUCKET") {
            self.pipeline.raw_bucket = v;
        }
        if let Some(v) = get("PROCESSED_DATA_BUCKET") {
            self.pipeline.processed_bucket = v;
        }
        if let Some(v) = get("RAW_DATA_FILE") {
            self.pipeline.raw_data_file = PathBuf::from(v);
        }
        if let Some(v) = get("S3_RAW_KEY") {
            self.pipeline.raw_key = v;
        }
        if let Some(v) = get("PROCESSED_DATA_PREFIX") {
            self.pipeline.output_prefix = v;
        }
        if let Some(v) = get("GLUE_CRAWLER_NAME") {
            self.pipeline.crawler.name = v;
        }
        if let Some(v) = get("GLUE_JOB_NAME") {
            self.pipeline.job.name = v;
        }
        if let Some(v) = get("ATHENA_WORKGROUP") {
            self.monitoring.workgroup = v;
        }
        if let Some(v) = get("CLOUDTRAIL_NAME") {
            self.monitoring.trail_name = v;
        }
        if let Some(v) = get("CLOUDTRAIL_BUCKET") {
            self.monitoring.trail_bucket = Some(v);
        }
        if let Some(v) = get("AWS_REGION") {
            self.aws.region = Some(v);
        }
    }

    /// Bucket the audit trail writes to.
    pub fn trail_bucket(&self) -> &str {
        self.monitoring
            .trail_bucket
            .as_deref()
            .unwrap_or(&self.pipeline.raw_bucket)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        let required = [
            ("pipeline.raw_bucket", &self.pipeline.raw_bucket),
            ("pipeline.processed_bucket", &self.pipeline.processed_bucket),
            ("pipeline.raw_key", &self.pipeline.raw_key),
            ("pipeline.crawler.name", &self.pipeline.crawler.name),
            ("pipeline.job.name", &self.pipeline.job.name),
            ("monitoring.region", &self.monitoring.region),
            ("monitoring.workgroup", &self.monitoring.workgroup),
            ("monitoring.trail_name", &self.monitoring.trail_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(crate::Error::Config(format!("{} is required", field)));
            }
        }

        if self.pipeline.raw_key.starts_with('/') {
            return Err(crate::Error::Config(
                "pipeline.raw_key must not start with '/'".into(),
            ));
        }

        if self.pipeline.crawler.wait_for_completion && self.pipeline.crawler.poll_interval_ms == 0
        {
            return Err(crate::Error::Config(
                "pipeline.crawler.poll_interval_ms must be positive".into(),
            ));
        }

        if self.pipeline.job.wait_for_completion && self.pipeline.job.poll_interval_ms == 0 {
            return Err(crate::Error::Config(
                "pipeline.job.poll_interval_ms must be positive".into(),
            ));
        }

        if self.monitoring.bucket_size_threshold_gb == 0 {
            return Err(crate::Error::Config(
                "monitoring.bucket_size_threshold_gb must be positive".into(),
            ));
        }

        if self.transform.max_row_group_size == 0 {
            return Err(crate::Error::Config(
                "transform.max_row_group_size must be positive".into(),
            ));
        }

        if !self.transform.delimiter.is_ascii() {
            return Err(crate::Error::Config(
                "transform.delimiter must be a single ASCII character".into(),
            ));
        }

        if self.monitoring.actions_enabled && self.monitoring.alarm_actions.is_empty() {
            tracing::warn!("Alarm actions are enabled but no action ARNs are configured");
        }

        Ok(())
    }
}
