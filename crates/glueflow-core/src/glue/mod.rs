//! Glue crawler and job control.
//!
//! [`JobControl`] abstracts the two managed services the pipeline drives: the
//! crawler that refreshes the Data Catalog and the job runner that executes
//! the transformation. [`GlueJobControl`] implements it with `aws-sdk-glue`.

mod client;
mod wait;

pub use client::GlueJobControl;
pub use wait::{wait_for_crawler, wait_for_job_run, PollSettings};

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of one job execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobRunId(pub String);

impl JobRunId {
    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Crawler lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlerState {
    /// Idle, ready to run
    Ready,
    /// Crawl in progress
    Running,
    /// Crawl finishing
    Stopping,
    /// State string not known to this client
    Unknown(String),
}

impl From<&str> for CrawlerState {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "READY" => CrawlerState::Ready,
            "RUNNING" => CrawlerState::Running,
            "STOPPING" => CrawlerState::Stopping,
            other => CrawlerState::Unknown(other.to_string()),
        }
    }
}

/// Outcome of the most recent crawl.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlOutcome {
    /// Crawl succeeded
    Succeeded,
    /// Crawl was cancelled
    Cancelled,
    /// Crawl failed
    Failed,
    /// Status string not known to this client
    Unknown(String),
}

impl From<&str> for CrawlOutcome {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "SUCCEEDED" => CrawlOutcome::Succeeded,
            "CANCELLED" => CrawlOutcome::Cancelled,
            "FAILED" => CrawlOutcome::Failed,
            other => CrawlOutcome::Unknown(other.to_string()),
        }
    }
}

/// Snapshot of a crawler as reported by the catalog service.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlerStatus {
    /// Current state
    pub state: CrawlerState,
    /// Outcome of the last completed crawl, if any
    pub last_crawl: Option<CrawlOutcome>,
    /// Error message of the last crawl, if any
    pub last_error: Option<String>,
    /// When the last crawl started, if known
    pub last_crawl_started: Option<DateTime<Utc>>,
}

/// Job run lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub enum JobRunState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Succeeded,
    Failed,
    Timeout,
    Error,
    Waiting,
    Expired,
    /// State string not known to this client
    Unknown(String),
}

impl JobRunState {
    /// Whether the run will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobRunState::Stopped
                | JobRunState::Succeeded
                | JobRunState::Failed
                | JobRunState::Timeout
                | JobRunState::Error
                | JobRunState::Expired
        )
    }
}

impl From<&str> for JobRunState {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "STARTING" => JobRunState::Starting,
            "RUNNING" => JobRunState::Running,
            "STOPPING" => JobRunState::Stopping,
            "STOPPED" => JobRunState::Stopped,
            "SUCCEEDED" => JobRunState::Succeeded,
            "FAILED" => JobRunState::Failed,
            "TIMEOUT" => JobRunState::Timeout,
            "ERROR" => JobRunState::Error,
            "WAITING" => JobRunState::Waiting,
            "EXPIRED" => JobRunState::Expired,
            other => JobRunState::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for JobRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobRunState::Starting => "STARTING",
            JobRunState::Running => "RUNNING",
            JobRunState::Stopping => "STOPPING",
            JobRunState::Stopped => "STOPPED",
            JobRunState::Succeeded => "SUCCEEDED",
            JobRunState::Failed => "FAILED",
            JobRunState::Timeout => "TIMEOUT",
            JobRunState::Error => "ERROR",
            JobRunState::Waiting => "WAITING",
            JobRunState::Expired => "EXPIRED",
            JobRunState::Unknown(s) => s,
        };
        f.write_str(s)
    }
}

/// Operations on the crawler and job-control services.
#[async_trait]
pub trait JobControl: Send + Sync {
    /// Start the named crawler. Does not wait for the crawl.
    async fn start_crawler(&self, name: &str) -> Result<()>;

    /// Current status of the named crawler.
    async fn crawler_status(&self, name: &str) -> Result<CrawlerStatus>;

    /// Start a run of the named job with `--key value` arguments.
    async fn start_job_run(
        &self,
        job_name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<JobRunId>;

    /// Current state of a job run.
    async fn job_run_state(&self, job_name: &str, run_id: &JobRunId) -> Result<JobRunState>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawler_state_from_str() {
        assert_eq!(CrawlerState::from("READY"), CrawlerState::Ready);
        assert_eq!(CrawlerState::from("running"), CrawlerState::Running);
        assert_eq!(
            CrawlerState::from("PAUSED"),
            CrawlerState::Unknown("PAUSED".into())
        );
    }

    #[test]
    fn test_crawl_outcome_from_str() {
        assert_eq!(CrawlOutcome::from("SUCCEEDED"), CrawlOutcome::Succeeded);
        assert_eq!(CrawlOutcome::from("FAILED"), CrawlOutcome::Failed);
        assert_eq!(CrawlOutcome::from("CANCELLED"), CrawlOutcome::Cancelled);
    }

    #[test]
    fn test_job_run_state_terminal() {
        for state in ["STOPPED", "SUCCEEDED", "FAILED", "TIMEOUT", "ERROR", "EXPIRED"] {
            assert!(JobRunState::from(state).is_terminal(), "{}", state);
        }
        for state in ["STARTING", "RUNNING", "STOPPING", "WAITING"] {
            assert!(!JobRunState::from(state).is_terminal(), "{}", state);
        }
    }

    #[test]
    fn test_job_run_state_display_round_trip() {
        let state = JobRunState::from("SUCCEEDED");
        assert_eq!(state.to_string(), "SUCCEEDED");
        assert_eq!(JobRunId("jr_abc".into()).to_string(), "jr_abc");
    }
}
