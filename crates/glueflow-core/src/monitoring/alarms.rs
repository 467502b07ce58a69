//! Alarm definitions watching the pipeline's storage, job and queries.

use std::fmt;

/// Bytes in one gigabyte (1024³).
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Statistic applied to the metric over each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Average,
    Sum,
}

impl Statistic {
    /// CloudWatch wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
        }
    }
}

/// Comparison between the statistic and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    GreaterThanThreshold,
    GreaterThanOrEqualToThreshold,
}

impl ComparisonOperator {
    /// CloudWatch wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThanThreshold => "GreaterThanThreshold",
            ComparisonOperator::GreaterThanOrEqualToThreshold => "GreaterThanOrEqualToThreshold",
        }
    }
}

/// Metric dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmDimension {
    pub name: String,
    pub value: String,
}

impl AlarmDimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Everything `PutMetricAlarm` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmDefinition {
    /// Alarm name, unique per account and region
    pub name: String,
    /// Metric name
    pub metric_name: String,
    /// Metric namespace
    pub namespace: String,
    /// Statistic
    pub statistic: Statistic,
    /// Period in seconds
    pub period_seconds: i32,
    /// Number of periods evaluated
    pub evaluation_periods: i32,
    /// Threshold value
    pub threshold: f64,
    /// Comparison operator
    pub comparison: ComparisonOperator,
    /// Metric dimensions
    pub dimensions: Vec<AlarmDimension>,
    /// Action ARNs notified when the alarm fires
    pub actions: Vec<String>,
    /// Whether actions fire
    pub actions_enabled: bool,
}

impl AlarmDefinition {
    /// Attach notification actions.
    pub fn with_actions(mut self, actions: Vec<String>, enabled: bool) -> Self {
        self.actions = actions;
        self.actions_enabled = enabled;
        self
    }
}

impl fmt::Display for AlarmDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{} {} {} {} over {}s x{})",
            self.name,
            self.namespace,
            self.metric_name,
            self.statistic.as_str(),
            self.comparison.as_str(),
            self.threshold,
            self.period_seconds,
            self.evaluation_periods
        )
    }
}

/// Average bucket size over one day above `threshold_gb`.
pub fn bucket_size_alarm(bucket: &str, threshold_gb: u64) -> AlarmDefinition {
    AlarmDefinition {
        name: format!("S3-{}-Size-Alarm", bucket),
        metric_name: "BucketSizeBytes".to_string(),
        namespace: "AWS/S3".to_string(),
        statistic: Statistic::Average,
        period_seconds: 86_400,
        evaluation_periods: 1,
        threshold: threshold_gb as f64 * BYTES_PER_GB,
        comparison: ComparisonOperator::GreaterThanThreshold,
        dimensions: vec![
            AlarmDimension::new("BucketName", bucket),
            AlarmDimension::new("StorageType", "StandardStorage"),
        ],
        actions: Vec::new(),
        actions_enabled: false,
    }
}

/// At least one failed run of `job_name` within five minutes.
pub fn job_failure_alarm(job_name: &str) -> AlarmDefinition {
    AlarmDefinition {
        name: format!("Glue-{}-Failure-Alarm", job_name),
        metric_name: "FailedJobs".to_string(),
        namespace: "AWS/Glue".to_string(),
        statistic: Statistic::Sum,
        period_seconds: 300,
        evaluation_periods: 1,
        threshold: 1.0,
        comparison: ComparisonOperator::GreaterThanOrEqualToThreshold,
        dimensions: vec![AlarmDimension::new("JobName", job_name)],
        actions: Vec::new(),
        actions_enabled: false,
    }
}

/// At least one failed query in `workgroup` within five minutes.
pub fn query_failure_alarm(workgroup: &str) -> AlarmDefinition {
    AlarmDefinition {
        name: format!("Athena-{}-QueryFailure-Alarm", workgroup),
        metric_name: "QueryFailed".to_string(),
        namespace: "AWS/Athena".to_string(),
        statistic: Statistic::Sum,
        period_seconds: 300,
        evaluation_periods: 1,
        threshold: 1.0,
        comparison: ComparisonOperator::GreaterThanOrEqualToThreshold,
        dimensions: vec![AlarmDimension::new("WorkGroup", workgroup)],
        actions: Vec::new(),
        actions_enabled: false,
    }
}
