//! mb command - Make bucket
//!
//! Creates the upload target bucket, named on the command line or taken from
//! the config file.

use std::path::Path;

use clap::Args;
use serde::Serialize;
use sup_core::{Error, ObjectStore as _};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a bucket
#[derive(Args, Debug)]
pub struct MbArgs {
    /// Bucket to create (defaults to the configured bucket)
    #[arg(short, long, env = "SUP_BUCKET")]
    pub bucket: Option<String>,

    /// Ignore error if bucket already exists
    #[arg(short = 'p', long)]
    pub ignore_existing: bool,
}

#[derive(Debug, Serialize)]
struct MbOutput {
    status: &'static str,
    bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Execute the mb command
pub async fn execute(
    args: MbArgs,
    config_path: Option<&Path>,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (config, client) = match super::setup(config_path, &formatter).await {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    let bucket = match resolve_bucket(args.bucket.as_deref(), &config.bucket) {
        Ok(b) => b,
        Err(e) => {
            formatter.error(&e);
            return ExitCode::UsageError;
        }
    };

    if args.ignore_existing {
        match client.bucket_exists(&bucket).await {
            Ok(true) => {
                report_existing(&formatter, &bucket);
                return ExitCode::Success;
            }
            Ok(false) => {}
            Err(e) => {
                formatter.error(&format!("Failed to check bucket existence: {e}"));
                return ExitCode::from_error(&e);
            }
        }
    }

    match client.create_bucket(&bucket).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&MbOutput {
                    status: "success",
                    bucket,
                    message: None,
                });
            } else {
                formatter.success(&format!("Bucket '{bucket}' created successfully."));
            }
            ExitCode::Success
        }
        Err(Error::Conflict(_)) if args.ignore_existing => {
            report_existing(&formatter, &bucket);
            ExitCode::Success
        }
        Err(e @ Error::Conflict(_)) => {
            formatter.error(&format!("Bucket '{bucket}' already exists: {e}"));
            ExitCode::Conflict
        }
        Err(e @ Error::Auth(_)) => {
            formatter.error(&format!("Access denied: cannot create bucket '{bucket}': {e}"));
            ExitCode::AuthError
        }
        Err(e) => {
            formatter.error(&format!("Failed to create bucket: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

fn report_existing(formatter: &Formatter, bucket: &str) {
    if formatter.is_json() {
        formatter.json(&MbOutput {
            status: "success",
            bucket: bucket.to_string(),
            message: Some("Bucket already exists".to_string()),
        });
    } else {
        formatter.success(&format!("Bucket '{bucket}' already exists."));
    }
}

/// Pick the bucket name from the argument or the config and check its length
fn resolve_bucket(arg: Option<&str>, configured: &str) -> Result<String, String> {
    let bucket = arg.unwrap_or(configured).trim_end_matches('/');

    if bucket.is_empty() {
        return Err("No bucket given and none configured".to_string());
    }

    if bucket.len() < 3 || bucket.len() > 63 {
        return Err("Bucket name must be between 3 and 63 characters".to_string());
    }

    Ok(bucket.to_string())
}
