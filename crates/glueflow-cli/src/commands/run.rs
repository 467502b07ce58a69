//! Run command implementation.

use anyhow::Result;
use glueflow_core::glue::GlueJobControl;
use glueflow_core::pipeline::{Pipeline, VerifyOutcome};
use glueflow_core::Config;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line overrides for a pipeline run.
#[derive(Debug, Default)]
pub struct RunOverrides {
    pub raw_bucket: Option<String>,
    pub processed_bucket: Option<String>,
    pub raw_data_file: Option<PathBuf>,
    pub raw_key: Option<String>,
    pub wait_for_job: bool,
    pub no_crawler_wait: bool,
}

impl RunOverrides {
    fn apply(self, config: &mut Config) {
        let pipeline = &mut config.pipeline;
        if let Some(bucket) = self.raw_bucket {
            pipeline.raw_bucket = bucket;
        }
        if let Some(bucket) = self.processed_bucket {
            pipeline.processed_bucket = bucket;
        }
        if let Some(file) = self.raw_data_file {
            pipeline.raw_data_file = file;
        }
        if let Some(key) = self.raw_key {
            pipeline.raw_key = key;
        }
        if self.wait_for_job {
            pipeline.job.wait_for_completion = true;
        }
        if self.no_crawler_wait {
            pipeline.crawler.wait_for_completion = false;
        }
    }
}

/// Run the full pipeline once.
pub async fn run(mut config: Config, overrides: RunOverrides) -> Result<()> {
    overrides.apply(&mut config);
    config.validate()?;

    info!(
        raw_bucket = %config.pipeline.raw_bucket,
        processed_bucket = %config.pipeline.processed_bucket,
        crawler = %config.pipeline.crawler.name,
        job = %config.pipeline.job.name,
        "Starting pipeline"
    );

    let gateway = super::gateway(&config);
    let job_control = Arc::new(GlueJobControl::new(&config.aws).await);
    let pipeline = Pipeline::new(config.pipeline.clone(), gateway, job_control);

    let report = pipeline.run().await?;

    let (verify, keys) = match &report.verify {
        VerifyOutcome::Found(keys) => ("found", keys.clone()),
        VerifyOutcome::Empty => ("empty", Vec::new()),
        VerifyOutcome::Unavailable(_) => ("unavailable", Vec::new()),
    };
    let summary = json!({
        "uploaded": report.uploaded.to_string(),
        "run_id": report.run_id.to_string(),
        "job_state": report.job_state.as_ref().map(|s| s.to_string()),
        "verify": verify,
        "processed_objects": keys,
        "states": report.states.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "started_at": report.started_at.to_rfc3339(),
        "elapsed_ms": report.elapsed.as_millis() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
