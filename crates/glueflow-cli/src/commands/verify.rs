//! Verify command implementation.

use anyhow::Result;
use glueflow_core::Config;
use tracing::warn;

/// List the processed output prefix.
///
/// An empty prefix is reported but is not an error; a listing failure is.
pub async fn run(config: Config, bucket: Option<String>, prefix: Option<String>) -> Result<()> {
    let bucket = bucket.unwrap_or_else(|| config.pipeline.processed_bucket.clone());
    let prefix = prefix.unwrap_or_else(|| config.pipeline.output_prefix.clone());

    let keys = super::gateway(&config)
        .list_objects(&bucket, &prefix)
        .await?;

    if keys.is_empty() {
        warn!(bucket = %bucket, prefix = %prefix, "No processed data found");
        println!("No objects under s3://{}/{}", bucket, prefix);
        return Ok(());
    }

    for key in &keys {
        println!("s3://{}/{}", bucket, key);
    }
    Ok(())
}
