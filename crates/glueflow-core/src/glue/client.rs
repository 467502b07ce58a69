//! AWS Glue implementation of [`JobControl`].

use crate::aws::load_sdk_config;
use crate::config::AwsConfig;
use crate::error::{CrawlerError, JobError};
use crate::glue::{CrawlOutcome, CrawlerState, CrawlerStatus, JobControl, JobRunId, JobRunState};
use crate::Result;
use async_trait::async_trait;
use chrono::DateTime;
use aws_sdk_glue::error::DisplayErrorContext;
use aws_sdk_glue::Client as GlueClient;
use std::collections::HashMap;
use tracing::{debug, info};

/// Glue crawler and job client.
pub struct GlueJobControl {
    client: GlueClient,
}

impl GlueJobControl {
    /// Create a new Glue client from configuration.
    pub async fn new(aws: &AwsConfig) -> Self {
        let sdk_config = load_sdk_config(aws, None).await;
        info!(
            region = ?sdk_config.region().map(|r| r.as_ref().to_string()),
            "AWS Glue client initialized"
        );
        Self::from_client(GlueClient::new(&sdk_config))
    }

    /// Wrap an existing Glue client.
    pub fn from_client(client: GlueClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JobControl for GlueJobControl {
    async fn start_crawler(&self, name: &str) -> Result<()> {
        self.client
            .start_crawler()
            .name(name)
            .send()
            .await
            .map_err(|e| CrawlerError::StartFailed {
                name: name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(crawler = %name, "StartCrawler accepted");
        Ok(())
    }

    async fn crawler_status(&self, name: &str) -> Result<CrawlerStatus> {
        let output = self
            .client
            .get_crawler()
            .name(name)
            .send()
            .await
            .map_err(|e| CrawlerError::StatusFailed {
                name: name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let crawler = output.crawler().ok_or_else(|| CrawlerError::StatusFailed {
            name: name.to_string(),
            message: "response did not include the crawler".into(),
        })?;

        let state = crawler
            .state()
            .map(|s| CrawlerState::from(s.as_str()))
            .unwrap_or_else(|| CrawlerState::Unknown("UNSET".into()));
        let last_crawl = crawler.last_crawl();

        Ok(CrawlerStatus {
            state,
            last_crawl: last_crawl
                .and_then(|l| l.status())
                .map(|s| CrawlOutcome::from(s.as_str())),
            last_error: last_crawl
                .and_then(|l| l.error_message())
                .map(|s| s.to_string()),
            last_crawl_started: last_crawl
                .and_then(|l| l.start_time())
                .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        })
    }

    async fn start_job_run(
        &self,
        job_name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<JobRunId> {
        let arguments = if arguments.is_empty() {
            None
        } else {
            Some(arguments.clone())
        };

        let output = self
            .client
            .start_job_run()
            .job_name(job_name)
            .set_arguments(arguments)
            .send()
            .await
            .map_err(|e| JobError::StartFailed {
                name: job_name.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let run_id = output
            .job_run_id()
            .ok_or_else(|| JobError::MissingRunId(job_name.to_string()))?;

        Ok(JobRunId(run_id.to_string()))
    }

    async fn job_run_state(&self, job_name: &str, run_id: &JobRunId) -> Result<JobRunState> {
        let output = self
            .client
            .get_job_run()
            .job_name(job_name)
            .run_id(run_id.as_str())
            .send()
            .await
            .map_err(|e| JobError::StatusFailed {
                name: job_name.to_string(),
                run_id: run_id.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(output
            .job_run()
            .and_then(|run| run.job_run_state())
            .map(|s| JobRunState::from(s.as_str()))
            .unwrap_or_else(|| JobRunState::Unknown("UNSET".into())))
    }
}
