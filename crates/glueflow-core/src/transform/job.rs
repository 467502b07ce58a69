//! The CSV to Parquet transformation job.

use crate::config::TransformConfig;
use crate::error::{Error, StorageError};
use crate::storage::{ObjectLocation, ObjectStorage};
use crate::transform::writer::convert_to_parquet;
use crate::transform::{JobArguments, RecordSet};
use crate::Result;
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Name of the marker written after the data file.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Counts from one transformation run.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStats {
    /// Rows read from the input
    pub input_rows: usize,
    /// Rows removed for having a null field
    pub dropped_rows: usize,
    /// Rows written
    pub output_rows: usize,
    /// Output column names
    pub columns: Vec<String>,
    /// Location of the Parquet file
    pub output_file: String,
    /// Size of the Parquet file in bytes
    pub bytes_written: usize,
    /// Wall-clock duration
    pub duration: Duration,
}

/// Reads raw CSV, drops incomplete rows, normalizes column names and writes
/// Parquet.
pub struct TransformJob {
    storage: Arc<dyn ObjectStorage>,
    config: TransformConfig,
}

impl TransformJob {
    /// Create a job reading and writing `s3://` locations through `storage`.
    pub fn new(storage: Arc<dyn ObjectStorage>, config: TransformConfig) -> Self {
        Self { storage, config }
    }

    /// Run with resolved job arguments.
    pub async fn run(&self, args: &JobArguments) -> Result<TransformStats> {
        let job_name = args.require("JOB_NAME")?;
        let input = ObjectLocation::parse(args.require("input_path")?)?;
        let output = ObjectLocation::parse(args.require("output_path")?)?;

        info!(job = %job_name, input = %input, output = %output, "Starting transformation");
        self.transform(&input, &output).await
    }

    /// Transform `input` into a Parquet file under `output`.
    pub async fn transform(
        &self,
        input: &ObjectLocation,
        output: &ObjectLocation,
    ) -> Result<TransformStats> {
        let started = Instant::now();

        let records = self.load(input).await?;
        let input_rows = records.num_rows();
        info!(rows = input_rows, columns = records.columns().len(), "Loaded input");

        let records = records.drop_nulls();
        let output_rows = records.num_rows();
        info!(
            rows = output_rows,
            dropped = input_rows - output_rows,
            "Dropped rows with null fields"
        );

        let records = records.lowercase_columns()?;
        debug!(columns = ?records.columns(), "Lowercased column names");

        let batch = records.to_record_batch()?;
        let parquet = convert_to_parquet(
            &batch,
            &self.config.compression,
            self.config.max_row_group_size,
        )?;
        let bytes_written = parquet.len();

        let file_name = format!(
            "part-00000-{}.{}.parquet",
            uuid::Uuid::new_v4(),
            self.config.compression.file_tag()
        );
        let data_file = output.child(&file_name);
        self.write(&data_file, parquet).await?;
        self.write(&output.child(SUCCESS_MARKER), Bytes::new()).await?;

        let duration = started.elapsed();
        info!(
            output_file = %data_file,
            rows = output_rows,
            bytes = bytes_written,
            duration_ms = duration.as_millis() as u64,
            "Transformation committed"
        );

        Ok(TransformStats {
            input_rows,
            dropped_rows: input_rows - output_rows,
            output_rows,
            columns: records.columns().to_vec(),
            output_file: data_file.to_string(),
            bytes_written,
            duration,
        })
    }

    fn delimiter(&self) -> Result<u8> {
        u8::try_from(self.config.delimiter).map_err(|_| {
            Error::Config(format!(
                "delimiter {:?} is not a single-byte character",
                self.config.delimiter
            ))
        })
    }

    /// Parse every input file into one record set.
    async fn load(&self, input: &ObjectLocation) -> Result<RecordSet> {
        let delimiter = self.delimiter()?;
        let mut files = self.read(input).await?.into_iter();

        let Some((first_name, first)) = files.next() else {
            return Err(not_found(input));
        };
        let mut records = RecordSet::from_csv(&first, delimiter)?;
        debug!(file = %first_name, rows = records.num_rows(), "Parsed input file");

        for (name, data) in files {
            let more = RecordSet::from_csv(&data, delimiter)?;
            debug!(file = %name, rows = more.num_rows(), "Parsed input file");
            records.append(more, &name)?;
        }
        Ok(records)
    }

    /// Read a single object or file, or every data file directly under a
    /// prefix or directory, in name order.
    async fn read(&self, location: &ObjectLocation) -> Result<Vec<(String, Bytes)>> {
        match location {
            ObjectLocation::Object { bucket, key } => {
                if key.is_empty() || key.ends_with('/') {
                    return self.read_prefix(bucket, key).await;
                }
                match self.storage.get(bucket, key).await {
                    Ok(data) => Ok(vec![(location.to_string(), data)]),
                    Err(Error::Storage(StorageError::NotFound { .. })) => {
                        self.read_prefix(bucket, &format!("{}/", key)).await
                    }
                    Err(e) => Err(e),
                }
            }
            ObjectLocation::Local(path) => {
                let local_error = |e: std::io::Error| StorageError::LocalFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                };

                let metadata = tokio::fs::metadata(path).await.map_err(local_error)?;
                if !metadata.is_dir() {
                    let data = tokio::fs::read(path).await.map_err(local_error)?;
                    return Ok(vec![(path.display().to_string(), Bytes::from(data))]);
                }

                let mut entries = tokio::fs::read_dir(path).await.map_err(local_error)?;
                let mut paths = Vec::new();
                while let Some(entry) = entries.next_entry().await.map_err(local_error)? {
                    let is_file = entry.file_type().await.map_err(local_error)?.is_file();
                    if is_file && is_data_file(&entry.file_name().to_string_lossy()) {
                        paths.push(entry.path());
                    }
                }
                paths.sort();

                let mut files = Vec::with_capacity(paths.len());
                for file in paths {
                    let data = tokio::fs::read(&file).await.map_err(local_error)?;
                    if !data.is_empty() {
                        files.push((file.display().to_string(), Bytes::from(data)));
                    }
                }
                Ok(files)
            }
        }
    }

    async fn read_prefix(&self, bucket: &str, prefix: &str) -> Result<Vec<(String, Bytes)>> {
        let keys = self.storage.list(bucket, prefix).await?;
        let mut files = Vec::new();
        for key in keys {
            let name = key.strip_prefix(prefix).unwrap_or(&key);
            if name.contains('/') || !is_data_file(name) {
                continue;
            }
            let data = self.storage.get(bucket, &key).await?;
            if !data.is_empty() {
                files.push((format!("s3://{}/{}", bucket, key), data));
            }
        }
        debug!(bucket = %bucket, prefix = %prefix, files = files.len(), "Listed input prefix");
        Ok(files)
    }

    async fn write(&self, location: &ObjectLocation, data: Bytes) -> Result<()> {
        match location {
            ObjectLocation::Object { bucket, key } => self.storage.put(bucket, key, data).await,
            ObjectLocation::Local(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(path, &data).await?;
                Ok(())
            }
        }
    }
}

/// Marker and hidden files such as `_SUCCESS` or `.crc` are not data.
fn is_data_file(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('_') && !name.starts_with('.')
}

fn not_found(location: &ObjectLocation) -> Error {
    match location {
        ObjectLocation::Object { bucket, key } => StorageError::NotFound {
            bucket: bucket.clone(),
            key: key.clone(),
        }
        .into(),
        ObjectLocation::Local(path) => StorageError::LocalFile {
            path: path.display().to_string(),
            message: "no input files".into(),
        }
        .into(),
    }
}
