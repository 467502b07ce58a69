//! CloudWatch alarm and CloudTrail provisioning.
//!
//! Alarm definitions are plain values built by [`alarms`]; the services that
//! register them sit behind [`AlarmService`] and [`TrailService`].

pub mod alarms;
mod cloudtrail;
mod cloudwatch;
mod provisioner;

pub use alarms::{
    bucket_size_alarm, job_failure_alarm, query_failure_alarm, AlarmDefinition, AlarmDimension,
    ComparisonOperator, Statistic, BYTES_PER_GB,
};
pub use cloudtrail::CloudTrailTrails;
pub use cloudwatch::CloudWatchAlarms;
pub use provisioner::{MonitoringProvisioner, ProvisionReport, TrailOutcome};

use crate::Result;
use async_trait::async_trait;

/// Result of a trail creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailCreation {
    /// Trail was created
    Created,
    /// Provider reported a trail with that name already exists
    AlreadyExists,
}

/// Metric alarm registration. `put_alarm` is an upsert keyed by alarm name.
#[async_trait]
pub trait AlarmService: Send + Sync {
    /// Create or replace an alarm.
    async fn put_alarm(&self, alarm: &AlarmDefinition) -> Result<()>;
}

/// Audit trail management.
#[async_trait]
pub trait TrailService: Send + Sync {
    /// Whether a trail with this name exists.
    async fn trail_exists(&self, name: &str) -> Result<bool>;

    /// Create a trail delivering to `bucket`.
    async fn create_trail(&self, name: &str, bucket: &str, multi_region: bool)
        -> Result<TrailCreation>;

    /// Start logging for a trail.
    async fn start_logging(&self, name: &str) -> Result<()>;
}
