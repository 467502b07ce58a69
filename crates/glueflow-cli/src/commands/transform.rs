//! Transform command implementation.

use anyhow::Result;
use glueflow_core::transform::{JobArguments, TransformJob, REQUIRED_ARGUMENTS};
use glueflow_core::Config;
use serde_json::json;

/// Run the transformation job with the arguments the job runner passed.
pub async fn run(config: Config, argv: &[String]) -> Result<()> {
    let args = JobArguments::resolve(argv, &REQUIRED_ARGUMENTS)?;

    let storage = super::object_storage(&config);
    let job = TransformJob::new(storage, config.transform.clone());
    let stats = job.run(&args).await?;

    let summary = json!({
        "input_rows": stats.input_rows,
        "dropped_rows": stats.dropped_rows,
        "output_rows": stats.output_rows,
        "columns": stats.columns,
        "output_file": stats.output_file,
        "bytes_written": stats.bytes_written,
        "duration_ms": stats.duration.as_millis() as u64,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
