//! CloudWatch implementation of [`AlarmService`].

use crate::aws::load_sdk_config;
use crate::config::AwsConfig;
use crate::error::MonitoringError;
use crate::monitoring::{AlarmDefinition, AlarmService};
use crate::Result;
use async_trait::async_trait;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::types::{ComparisonOperator, Dimension, Statistic};
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use tracing::{debug, info};

/// Metric alarm client.
pub struct CloudWatchAlarms {
    client: CloudWatchClient,
}

impl CloudWatchAlarms {
    /// Create a client for `region`, which overrides the region in `aws`.
    pub async fn new(aws: &AwsConfig, region: &str) -> Self {
        let sdk_config = load_sdk_config(aws, Some(region)).await;
        info!(region = %region, "CloudWatch client initialized");
        Self::from_client(CloudWatchClient::new(&sdk_config))
    }

    /// Wrap an existing CloudWatch client.
    pub fn from_client(client: CloudWatchClient) -> Self {
        Self { client }
    }
}

fn alarm_error(alarm: &AlarmDefinition, message: String) -> MonitoringError {
    MonitoringError::Alarm {
        name: alarm.name.clone(),
        message,
    }
}

fn sdk_dimensions(alarm: &AlarmDefinition) -> Vec<Dimension> {
    alarm
        .dimensions
        .iter()
        .map(|d| Dimension::builder().name(&d.name).value(&d.value).build())
        .collect()
}

#[async_trait]
impl AlarmService for CloudWatchAlarms {
    async fn put_alarm(&self, alarm: &AlarmDefinition) -> Result<()> {
        let dimensions = sdk_dimensions(alarm);

        let actions = if alarm.actions.is_empty() {
            None
        } else {
            Some(alarm.actions.clone())
        };

        self.client
            .put_metric_alarm()
            .alarm_name(&alarm.name)
            .metric_name(&alarm.metric_name)
            .namespace(&alarm.namespace)
            .statistic(Statistic::from(alarm.statistic.as_str()))
            .period(alarm.period_seconds)
            .evaluation_periods(alarm.evaluation_periods)
            .threshold(alarm.threshold)
            .comparison_operator(ComparisonOperator::from(alarm.comparison.as_str()))
            .set_dimensions(Some(dimensions))
            .set_alarm_actions(actions)
            .actions_enabled(alarm.actions_enabled)
            .send()
            .await
            .map_err(|e| alarm_error(alarm, DisplayErrorContext(&e).to_string()))?;

        debug!(alarm = %alarm.name, "PutMetricAlarm accepted");
        Ok(())
    }
}
