//! glueflow CLI - S3 + Glue ETL pipeline tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use glueflow_core::config::LogFormat;
use glueflow_core::Config;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit codes for CLI operations.
///
/// Following Unix conventions:
/// - 0: Success
/// - 1-127: Application errors
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// Configuration error (invalid config file, missing required fields)
    ConfigError = 1,
    /// Storage error (upload, listing, bucket access)
    StorageError = 2,
    /// Crawler failed to start, failed or timed out
    CrawlerError = 3,
    /// Job run failed to start, failed or timed out
    JobError = 4,
    /// Alarm or audit trail provisioning failed
    MonitoringError = 5,
    /// Transformation job failed
    TransformError = 6,
    /// General runtime error
    RuntimeError = 10,
}

impl ExitCode {
    /// Convert an error to an exit code.
    ///
    /// Core errors map by variant; anything else falls back to inspecting
    /// the message.
    fn from_error(error: &anyhow::Error) -> Self {
        use glueflow_core::Error;

        if let Some(core) = error.downcast_ref::<Error>() {
            return match core {
                Error::Config(_) => ExitCode::ConfigError,
                Error::Storage(_) | Error::Upload(_) => ExitCode::StorageError,
                Error::Crawler(_) => ExitCode::CrawlerError,
                Error::Job(_) => ExitCode::JobError,
                Error::Monitoring(_) => ExitCode::MonitoringError,
                Error::Transform(_) => ExitCode::TransformError,
                Error::Io(_) => ExitCode::RuntimeError,
            };
        }

        let error_str = error.to_string().to_lowercase();
        if error_str.contains("config") || error_str.contains("toml") || error_str.contains("parse")
        {
            ExitCode::ConfigError
        } else if error_str.contains("storage")
            || error_str.contains("s3")
            || error_str.contains("object_store")
        {
            ExitCode::StorageError
        } else {
            ExitCode::RuntimeError
        }
    }
}

mod commands;

#[derive(Parser)]
#[command(name = "glueflow")]
#[command(about = "S3 + Glue ETL pipeline CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload raw data, crawl it, start the transformation job and verify
    Run {
        /// Override the raw data bucket
        #[arg(long)]
        raw_bucket: Option<String>,

        /// Override the processed data bucket
        #[arg(long)]
        processed_bucket: Option<String>,

        /// Override the local raw data file
        #[arg(long)]
        raw_data_file: Option<PathBuf>,

        /// Override the raw object key
        #[arg(long)]
        raw_key: Option<String>,

        /// Wait for the job run to finish
        #[arg(long)]
        wait_for_job: bool,

        /// Do not wait for the crawler to finish
        #[arg(long)]
        no_crawler_wait: bool,
    },

    /// Create CloudWatch alarms and the CloudTrail audit trail
    Provision {
        /// Override the monitoring region
        #[arg(long)]
        region: Option<String>,

        /// Override the bucket size alarm threshold (GB)
        #[arg(long)]
        threshold_gb: Option<u64>,

        /// Override the trail bucket
        #[arg(long)]
        trail_bucket: Option<String>,
    },

    /// Run the transformation job with job-runner arguments
    /// (--JOB_NAME, --input_path, --output_path)
    Transform {
        /// Arguments as passed by the job runner
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List processed output
    Verify {
        /// Override the processed data bucket
        #[arg(long)]
        bucket: Option<String>,

        /// Override the output prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() {
    let exit_code = run_cli().await;
    std::process::exit(exit_code as i32);
}

/// Main CLI execution logic with proper error handling.
async fn run_cli() -> ExitCode {
    let cli = Cli::parse();

    // Log settings come from the config file when it parses; falls back to defaults
    let logging = cli
        .config
        .as_deref()
        .and_then(|path| Config::from_file(path).ok())
        .map(|config| config.logging)
        .unwrap_or_default();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new(logging.level.as_str()),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    match logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .init();
        }
    }

    match execute_command(cli).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            ExitCode::from_error(&e)
        }
    }
}

/// Execute the CLI command.
async fn execute_command(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            raw_bucket,
            processed_bucket,
            raw_data_file,
            raw_key,
            wait_for_job,
            no_crawler_wait,
        } => {
            let overrides = commands::run::RunOverrides {
                raw_bucket,
                processed_bucket,
                raw_data_file,
                raw_key,
                wait_for_job,
                no_crawler_wait,
            };
            commands::run::run(config, overrides).await?;
        }

        Commands::Provision {
            region,
            threshold_gb,
            trail_bucket,
        } => {
            commands::provision::run(config, region, threshold_gb, trail_bucket).await?;
        }

        Commands::Transform { args } => {
            commands::transform::run(config, &args).await?;
        }

        Commands::Verify { bucket, prefix } => {
            commands::verify::run(config, bucket, prefix).await?;
        }

        Commands::Validate => {
            config.validate()?;
            println!("Configuration is valid");
        }
    }

    Ok(())
}

/// Load the config file (if any) with environment overrides applied.
fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(Config::load(path)?)
}
