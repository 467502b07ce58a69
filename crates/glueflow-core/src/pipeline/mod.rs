//! End-to-end pipeline orchestration.
//!
//! One run uploads the raw file, refreshes the catalog with the crawler,
//! starts the transformation job and checks the processed prefix. Every
//! step is awaited before the next one starts; the first fatal failure ends
//! the run in [`PipelineState::Failed`].

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::glue::{
    wait_for_crawler, wait_for_job_run, JobControl, JobRunId, JobRunState, PollSettings,
};
use crate::storage::{ObjectRef, StorageGateway};
use crate::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Pipeline lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Uploading,
    Crawling,
    Transforming,
    Verifying,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Uploading => "uploading",
            PipelineState::Crawling => "crawling",
            PipelineState::Transforming => "transforming",
            PipelineState::Verifying => "verifying",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What verification found under the processed prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    /// Keys found
    Found(Vec<String>),
    /// Listing worked but nothing is there yet
    Empty,
    /// Listing failed
    Unavailable(String),
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Raw object that was uploaded
    pub uploaded: ObjectRef,
    /// Run id of the transformation job
    pub run_id: JobRunId,
    /// Final job state, when the run was waited for
    pub job_state: Option<JobRunState>,
    /// Verification outcome
    pub verify: VerifyOutcome,
    /// Every state the run went through, in order
    pub states: Vec<PipelineState>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration
    pub elapsed: Duration,
}

struct StepResults {
    uploaded: ObjectRef,
    run_id: JobRunId,
    job_state: Option<JobRunState>,
    verify: VerifyOutcome,
}

/// Drives one pipeline run against storage and the job-control services.
pub struct Pipeline {
    config: PipelineConfig,
    gateway: StorageGateway,
    job_control: Arc<dyn JobControl>,
    history: Mutex<Vec<PipelineState>>,
}

impl Pipeline {
    /// Create a new pipeline.
    pub fn new(
        config: PipelineConfig,
        gateway: StorageGateway,
        job_control: Arc<dyn JobControl>,
    ) -> Self {
        Self {
            config,
            gateway,
            job_control,
            history: Mutex::new(vec![PipelineState::Idle]),
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.history
            .lock()
            .last()
            .copied()
            .unwrap_or(PipelineState::Idle)
    }

    /// States visited by the latest run, including the current one.
    pub fn history(&self) -> Vec<PipelineState> {
        self.history.lock().clone()
    }

    fn enter(&self, state: PipelineState) {
        let mut history = self.history.lock();
        let from = history.last().copied().unwrap_or(PipelineState::Idle);
        history.push(state);
        info!(from = %from, to = %state, "Pipeline state changed");
    }

    /// Run every step in order.
    pub async fn run(&self) -> Result<PipelineReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        *self.history.lock() = vec![PipelineState::Idle];

        match self.execute().await {
            Ok(steps) => {
                self.enter(PipelineState::Done);
                let elapsed = started.elapsed();
                info!(elapsed_ms = elapsed.as_millis() as u64, "Pipeline finished");
                Ok(PipelineReport {
                    uploaded: steps.uploaded,
                    run_id: steps.run_id,
                    job_state: steps.job_state,
                    verify: steps.verify,
                    states: self.history(),
                    started_at,
                    elapsed,
                })
            }
            Err(e) => {
                let failed_in = self.state();
                self.enter(PipelineState::Failed);
                error!(step = %failed_in, error = %e, "Pipeline failed");
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<StepResults> {
        self.enter(PipelineState::Uploading);
        let uploaded = self.upload_raw_data().await?;

        self.enter(PipelineState::Crawling);
        self.trigger_crawl().await?;

        self.enter(PipelineState::Transforming);
        let run_id = self.trigger_transform_job().await?;
        let job_state = if self.config.job.wait_for_completion {
            Some(self.wait_for_transform_job(&run_id).await?)
        } else {
            None
        };

        self.enter(PipelineState::Verifying);
        let verify = self.verify_output().await;

        Ok(StepResults {
            uploaded,
            run_id,
            job_state,
            verify,
        })
    }

    /// Upload the raw data file to the raw bucket.
    pub async fn upload_raw_data(&self) -> Result<ObjectRef> {
        let object = ObjectRef::new(
            &self.config.raw_data_file,
            &self.config.raw_bucket,
            &self.config.raw_key,
        );

        if !self.gateway.upload_ref(&object).await {
            return Err(Error::Upload(format!(
                "{} -> {}",
                object.source.display(),
                object
            )));
        }
        Ok(object)
    }

    /// Start the crawler, then wait for it when configured to.
    pub async fn trigger_crawl(&self) -> Result<()> {
        let crawler = &self.config.crawler;
        let requested_at = Utc::now();
        self.job_control.start_crawler(&crawler.name).await?;
        info!(crawler = %crawler.name, "Started crawler");

        if crawler.wait_for_completion {
            let poll = PollSettings::new(crawler.poll_interval_ms, crawler.timeout_seconds);
            wait_for_crawler(self.job_control.as_ref(), &crawler.name, requested_at, poll)
                .await?;
        }
        Ok(())
    }

    /// Arguments passed to the transformation job.
    pub fn job_arguments(&self) -> HashMap<String, String> {
        HashMap::from([
            ("--input_path".to_string(), self.config.input_location()),
            ("--output_path".to_string(), self.config.output_location()),
        ])
    }

    /// Start the transformation job.
    pub async fn trigger_transform_job(&self) -> Result<JobRunId> {
        let job = &self.config.job.name;
        let run_id = self
            .job_control
            .start_job_run(job, &self.job_arguments())
            .await?;
        info!(job = %job, run_id = %run_id, "Started job run");
        Ok(run_id)
    }

    /// Wait for a job run to reach a terminal state.
    pub async fn wait_for_transform_job(&self, run_id: &JobRunId) -> Result<JobRunState> {
        let job = &self.config.job;
        let poll = PollSettings::new(job.poll_interval_ms, job.timeout_seconds);
        wait_for_job_run(self.job_control.as_ref(), &job.name, run_id, poll).await
    }

    /// List the processed prefix. Never fails the run.
    pub async fn verify_output(&self) -> VerifyOutcome {
        let bucket = &self.config.processed_bucket;
        let prefix = &self.config.output_prefix;

        match self.gateway.list_objects(bucket, prefix).await {
            Ok(keys) if keys.is_empty() => {
                warn!(bucket = %bucket, prefix = %prefix, "No processed data found");
                VerifyOutcome::Empty
            }
            Ok(keys) => {
                for key in &keys {
                    info!(bucket = %bucket, key = %key, "Processed object");
                }
                VerifyOutcome::Found(keys)
            }
            Err(e) => {
                error!(bucket = %bucket, prefix = %prefix, error = %e, "Failed to verify output");
                VerifyOutcome::Unavailable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CrawlerError, JobError, StorageError};
    use crate::glue::{CrawlOutcome, CrawlerState, CrawlerStatus};
    use crate::storage::{ObjectStorage, ObjectStoreStorage};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeJobControl {
        calls: Mutex<Vec<String>>,
        job_arguments: Mutex<Option<HashMap<String, String>>>,
        fail_crawler: bool,
        job_state: Option<&'static str>,
    }

    #[async_trait]
    impl JobControl for FakeJobControl {
        async fn start_crawler(&self, name: &str) -> Result<()> {
            self.calls.lock().push(format!("start_crawler:{}", name));
            if self.fail_crawler {
                return Err(CrawlerError::StartFailed {
                    name: name.to_string(),
                    message: "EntityNotFoundException".into(),
                }
                .into());
            }
            Ok(())
        }

        async fn crawler_status(&self, _name: &str) -> Result<CrawlerStatus> {
            Ok(CrawlerStatus {
                state: CrawlerState::Ready,
                last_crawl: Some(CrawlOutcome::Succeeded),
                last_error: None,
                last_crawl_started: Some(Utc::now()),
            })
        }

        async fn start_job_run(
            &self,
            job_name: &str,
            arguments: &HashMap<String, String>,
        ) -> Result<JobRunId> {
            self.calls.lock().push(format!("start_job_run:{}", job_name));
            *self.job_arguments.lock() = Some(arguments.clone());
            Ok(JobRunId("jr_0001".into()))
        }

        async fn job_run_state(&self, _job_name: &str, _run_id: &JobRunId) -> Result<JobRunState> {
            Ok(JobRunState::from(self.job_state.unwrap_or("SUCCEEDED")))
        }
    }

    struct UnreachableStorage;

    #[async_trait]
    impl ObjectStorage for UnreachableStorage {
        async fn put_file(&self, _local_path: &Path, bucket: &str, key: &str) -> Result<()> {
            Err(StorageError::Write {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "connection refused".into(),
            }
            .into())
        }

        async fn put(&self, bucket: &str, key: &str, _data: Bytes) -> Result<()> {
            Err(StorageError::Write {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "connection refused".into(),
            }
            .into())
        }

        async fn get(&self, bucket: &str, key: &str) -> Result<Bytes> {
            Err(StorageError::Read {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: "connection refused".into(),
            }
            .into())
        }

        async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
            Err(StorageError::List {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                message: "connection refused".into(),
            }
            .into())
        }
    }

    fn config(temp_dir: &TempDir) -> PipelineConfig {
        let raw_data_file = temp_dir.path().join("test_data.csv");
        std::fs::write(&raw_data_file, "Name,Value\nwidget,3\n").unwrap();

        let mut config = PipelineConfig {
            raw_bucket: "raw".into(),
            processed_bucket: "processed".into(),
            raw_data_file,
            ..Default::default()
        };
        config.crawler.poll_interval_ms = 1;
        config.job.poll_interval_ms = 1;
        config
    }

    fn memory_gateway() -> StorageGateway {
        StorageGateway::new(Arc::new(ObjectStoreStorage::in_memory()))
    }

    #[tokio::test]
    async fn test_run_happy_path() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = memory_gateway();
        let control = Arc::new(FakeJobControl::default());
        let pipeline = Pipeline::new(config(&temp_dir), gateway.clone(), control.clone());

        let report = pipeline.run().await.unwrap();

        assert_eq!(
            report.states,
            vec![
                PipelineState::Idle,
                PipelineState::Uploading,
                PipelineState::Crawling,
                PipelineState::Transforming,
                PipelineState::Verifying,
                PipelineState::Done,
            ]
        );
        assert_eq!(pipeline.state(), PipelineState::Done);
        assert_eq!(report.uploaded.to_string(), "s3://raw/input/test_data.csv");
        assert_eq!(report.run_id, JobRunId("jr_0001".into()));
        assert_eq!(report.job_state, None);
        assert_eq!(report.verify, VerifyOutcome::Empty);

        let keys = gateway.list_objects("raw", "input/").await.unwrap();
        assert_eq!(keys, vec!["input/test_data.csv"]);
        assert_eq!(
            *control.calls.lock(),
            vec![
                "start_crawler:raw-data-crawler".to_string(),
                "start_job_run:supplychain-etl-job".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_job_arguments_passed() {
        let temp_dir = TempDir::new().unwrap();
        let control = Arc::new(FakeJobControl::default());
        let pipeline = Pipeline::new(config(&temp_dir), memory_gateway(), control.clone());

        pipeline.run().await.unwrap();

        let arguments = control.job_arguments.lock().clone().unwrap();
        assert_eq!(arguments["--input_path"], "s3://raw/input/test_data.csv");
        assert_eq!(arguments["--output_path"], "s3://processed/output/");
    }

    #[tokio::test]
    async fn test_unreachable_storage_fails_before_crawl() {
        let temp_dir = TempDir::new().unwrap();
        let control = Arc::new(FakeJobControl::default());
        let gateway = StorageGateway::new(Arc::new(UnreachableStorage));
        let pipeline = Pipeline::new(config(&temp_dir), gateway, control.clone());

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, Error::Upload(_)));
        assert_eq!(
            pipeline.history(),
            vec![
                PipelineState::Idle,
                PipelineState::Uploading,
                PipelineState::Failed,
            ]
        );
        assert!(control.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_crawler_failure_skips_job() {
        let temp_dir = TempDir::new().unwrap();
        let control = Arc::new(FakeJobControl {
            fail_crawler: true,
            ..Default::default()
        });
        let pipeline = Pipeline::new(config(&temp_dir), memory_gateway(), control.clone());

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, Error::Crawler(CrawlerError::StartFailed { .. })));
        assert_eq!(pipeline.history().last(), Some(&PipelineState::Failed));
        assert_eq!(control.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_failed_job_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config(&temp_dir);
        config.job.wait_for_completion = true;
        let control = Arc::new(FakeJobControl {
            job_state: Some("FAILED"),
            ..Default::default()
        });
        let pipeline = Pipeline::new(config, memory_gateway(), control);

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, Error::Job(JobError::RunFailed { .. })));
        assert_eq!(
            pipeline.history(),
            vec![
                PipelineState::Idle,
                PipelineState::Uploading,
                PipelineState::Crawling,
                PipelineState::Transforming,
                PipelineState::Failed,
            ]
        );
    }

    #[tokio::test]
    async fn test_wait_for_succeeded_job() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config(&temp_dir);
        config.job.wait_for_completion = true;
        let pipeline = Pipeline::new(
            config,
            memory_gateway(),
            Arc::new(FakeJobControl::default()),
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.job_state, Some(JobRunState::Succeeded));
    }

    #[tokio::test]
    async fn test_verify_output_outcomes() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = memory_gateway();
        let pipeline = Pipeline::new(
            config(&temp_dir),
            gateway.clone(),
            Arc::new(FakeJobControl::default()),
        );
        assert_eq!(pipeline.verify_output().await, VerifyOutcome::Empty);

        gateway
            .storage()
            .put("processed", "output/part-00000.snappy.parquet", Bytes::from("x"))
            .await
            .unwrap();
        assert_eq!(
            pipeline.verify_output().await,
            VerifyOutcome::Found(vec!["output/part-00000.snappy.parquet".to_string()])
        );

        let broken = Pipeline::new(
            config(&temp_dir),
            StorageGateway::new(Arc::new(UnreachableStorage)),
            Arc::new(FakeJobControl::default()),
        );
        assert!(matches!(
            broken.verify_output().await,
            VerifyOutcome::Unavailable(_)
        ));
    }
}
