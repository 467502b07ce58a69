//! CloudTrail implementation of [`TrailService`].

use crate::aws::load_sdk_config;
use crate::config::AwsConfig;
use crate::error::MonitoringError;
use crate::monitoring::{TrailCreation, TrailService};
use crate::Result;
use async_trait::async_trait;
use aws_sdk_cloudtrail::error::DisplayErrorContext;
use aws_sdk_cloudtrail::Client as CloudTrailClient;
use tracing::{debug, info};

/// Audit trail client.
pub struct CloudTrailTrails {
    client: CloudTrailClient,
}

impl CloudTrailTrails {
    /// Create a client for `region`, which overrides the region in `aws`.
    pub async fn new(aws: &AwsConfig, region: &str) -> Self {
        let sdk_config = load_sdk_config(aws, Some(region)).await;
        info!(region = %region, "CloudTrail client initialized");
        Self::from_client(CloudTrailClient::new(&sdk_config))
    }

    /// Wrap an existing CloudTrail client.
    pub fn from_client(client: CloudTrailClient) -> Self {
        Self { client }
    }
}

fn trail_error(name: &str, message: String) -> MonitoringError {
    MonitoringError::Trail {
        name: name.to_string(),
        message,
    }
}

#[async_trait]
impl TrailService for CloudTrailTrails {
    async fn trail_exists(&self, name: &str) -> Result<bool> {
        let output = self
            .client
            .describe_trails()
            .trail_name_list(name)
            .include_shadow_trails(false)
            .send()
            .await
            .map_err(|e| trail_error(name, DisplayErrorContext(&e).to_string()))?;

        Ok(output
            .trail_list()
            .iter()
            .any(|t| t.name() == Some(name)))
    }

    async fn create_trail(
        &self,
        name: &str,
        bucket: &str,
        multi_region: bool,
    ) -> Result<TrailCreation> {
        let result = self
            .client
            .create_trail()
            .name(name)
            .s3_bucket_name(bucket)
            .is_multi_region_trail(multi_region)
            .send()
            .await;

        match result {
            Ok(output) => {
                debug!(trail = %name, arn = ?output.trail_arn(), "CreateTrail accepted");
                Ok(TrailCreation::Created)
            }
            Err(e) => {
                let exists = e
                    .as_service_error()
                    .map(|se| se.is_trail_already_exists_exception())
                    .unwrap_or(false);
                if exists {
                    Ok(TrailCreation::AlreadyExists)
                } else {
                    Err(trail_error(name, DisplayErrorContext(&e).to_string()).into())
                }
            }
        }
    }

    async fn start_logging(&self, name: &str) -> Result<()> {
        self.client
            .start_logging()
            .name(name)
            .send()
            .await
            .map_err(|e| trail_error(name, DisplayErrorContext(&e).to_string()))?;

        debug!(trail = %name, "StartLogging accepted");
        Ok(())
    }
}
