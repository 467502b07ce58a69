//! Provision command implementation.

use anyhow::Result;
use glueflow_core::monitoring::{CloudTrailTrails, CloudWatchAlarms, MonitoringProvisioner};
use glueflow_core::Config;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Create the pipeline's alarms and audit trail.
pub async fn run(
    mut config: Config,
    region: Option<String>,
    threshold_gb: Option<u64>,
    trail_bucket: Option<String>,
) -> Result<()> {
    if let Some(region) = region {
        config.monitoring.region = region;
    }
    if let Some(threshold) = threshold_gb {
        config.monitoring.bucket_size_threshold_gb = threshold;
    }
    if trail_bucket.is_some() {
        config.monitoring.trail_bucket = trail_bucket;
    }
    config.validate()?;

    let monitoring = &config.monitoring;
    info!(
        region = %monitoring.region,
        trail = %monitoring.trail_name,
        trail_bucket = %config.trail_bucket(),
        "Provisioning monitoring"
    );

    let alarms = Arc::new(CloudWatchAlarms::new(&config.aws, &monitoring.region).await);
    let trails = Arc::new(CloudTrailTrails::new(&config.aws, &monitoring.region).await);
    let provisioner = MonitoringProvisioner::new(alarms, trails)
        .with_actions(monitoring.alarm_actions.clone(), monitoring.actions_enabled);

    let report = provisioner
        .provision_all(monitoring, &config.pipeline)
        .await?;

    let summary = json!({
        "alarms": report.alarms,
        "trail": report.trail,
        "trail_outcome": format!("{:?}", report.trail_outcome),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
