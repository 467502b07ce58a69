//! Polling until a crawl or job run finishes.

use crate::error::{CrawlerError, JobError};
use crate::glue::{CrawlOutcome, CrawlerState, CrawlerStatus, JobControl, JobRunId, JobRunState};
use crate::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Poll interval and overall deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    /// Delay between status requests
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl PollSettings {
    /// Create poll settings from config units.
    pub fn new(interval_ms: u64, timeout_seconds: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

/// Wait until the crawl requested at `requested_at` has finished.
///
/// `Ready` only counts once this wait has seen the crawler running, or when
/// the last crawl started in or after the second of `requested_at`. Before that the status
/// still describes an earlier crawl and polling continues. A failed or
/// cancelled crawl is an error, as is running past the deadline.
pub async fn wait_for_crawler(
    control: &dyn JobControl,
    name: &str,
    requested_at: DateTime<Utc>,
    poll: PollSettings,
) -> Result<CrawlerStatus> {
    let deadline = Instant::now() + poll.timeout;
    let mut seen_active = false;

    loop {
        let status = control.crawler_status(name).await?;

        match status.state {
            CrawlerState::Running | CrawlerState::Stopping => seen_active = true,
            CrawlerState::Ready => {
                let current = seen_active
                    || status.last_crawl_started.is_some_and(|started| {
                        started.timestamp() >= requested_at.timestamp()
                    });
                if current {
                    return finished_crawl(name, status);
                }
                debug!(crawler = %name, "Crawler still reports the previous crawl");
            }
            CrawlerState::Unknown(_) => {}
        }

        if Instant::now() >= deadline {
            return Err(CrawlerError::Timeout {
                name: name.to_string(),
                seconds: poll.timeout.as_secs(),
            }
            .into());
        }

        debug!(crawler = %name, state = ?status.state, "Waiting for crawler");
        tokio::time::sleep(poll.interval).await;
    }
}

fn finished_crawl(name: &str, status: CrawlerStatus) -> Result<CrawlerStatus> {
    let failed = matches!(
        status.last_crawl,
        Some(CrawlOutcome::Failed | CrawlOutcome::Cancelled)
    );
    if !failed {
        info!(crawler = %name, "Crawl finished");
        return Ok(status);
    }

    let mut text =
        format!("{:?}", status.last_crawl.unwrap_or(CrawlOutcome::Failed)).to_uppercase();
    if let Some(message) = status.last_error {
        text.push_str(": ");
        text.push_str(&message);
    }
    Err(CrawlerError::CrawlFailed {
        name: name.to_string(),
        status: text,
    }
    .into())
}

/// Wait until a job run reaches a terminal state; only `Succeeded` is `Ok`.
pub async fn wait_for_job_run(
    control: &dyn JobControl,
    job_name: &str,
    run_id: &JobRunId,
    poll: PollSettings,
) -> Result<JobRunState> {
    let deadline = Instant::now() + poll.timeout;

    loop {
        let state = control.job_run_state(job_name, run_id).await?;

        if state == JobRunState::Succeeded {
            info!(job = %job_name, run_id = %run_id, "Job run succeeded");
            return Ok(state);
        }

        if state.is_terminal() {
            return Err(JobError::RunFailed {
                name: job_name.to_string(),
                run_id: run_id.to_string(),
                state: state.to_string(),
            }
            .into());
        }

        if Instant::now() >= deadline {
            return Err(JobError::Timeout {
                name: job_name.to_string(),
                run_id: run_id.to_string(),
                seconds: poll.timeout.as_secs(),
            }
            .into());
        }

        debug!(job = %job_name, run_id = %run_id, state = %state, "Waiting for job run");
        tokio::time::sleep(poll.interval).await;
    }
}
