//! ls command - List buckets and objects
//!
//! Lists buckets when no bucket is given, or lists the objects in a bucket.

use std::path::Path;

use clap::Args;
use serde::Serialize;
use sup_core::{Error, ObjectInfo, ObjectStore};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Bucket to list; lists all buckets when omitted
    pub bucket: Option<String>,

    /// Only list keys starting with this prefix
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    items: Vec<ObjectInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(items: &[ObjectInfo]) -> Self {
        let total_size: u64 = items.iter().filter_map(|i| i.size_bytes).sum();
        Self {
            total_objects: items.len(),
            total_size_bytes: total_size,
            total_size_human: humansize::format_size(total_size, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(
    args: LsArgs,
    config_path: Option<&Path>,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (_, client) = match super::setup(config_path, &formatter).await {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    match &args.bucket {
        None => list_buckets(&client, &formatter, args.summarize).await,
        Some(bucket) => match collect_objects(&client, bucket, &args.prefix).await {
            Ok(items) => {
                print_objects(&formatter, items, args.summarize);
                ExitCode::Success
            }
            Err(e @ Error::NotFound(_)) => {
                formatter.error(&format!("Bucket not found: {bucket}: {e}"));
                ExitCode::NotFound
            }
            Err(e) => {
                formatter.error(&format!("Failed to list objects: {e}"));
                ExitCode::from_error(&e)
            }
        },
    }
}

async fn list_buckets(client: &impl ObjectStore, formatter: &Formatter, summarize: bool) -> ExitCode {
    match client.list_buckets().await {
        Ok(buckets) => {
            if formatter.is_json() {
                let summary = summarize.then(|| Summary::of(&buckets));
                formatter.json(&LsOutput {
                    items: buckets,
                    summary,
                });
            } else {
                for bucket in &buckets {
                    formatter.println(&format!("[{}]     0B {}/", date(bucket), bucket.key));
                }
                if summarize {
                    formatter.println(&format!("\nTotal: {} buckets", buckets.len()));
                }
            }
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to list buckets: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

/// Page through a bucket listing until no continuation token is returned
async fn collect_objects(
    client: &impl ObjectStore,
    bucket: &str,
    prefix: &str,
) -> sup_core::Result<Vec<ObjectInfo>> {
    let mut items = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let page = client
            .list_objects(bucket, prefix, continuation_token.take())
            .await?;
        items.extend(page.items);

        match page.continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    Ok(items)
}

fn print_objects(formatter: &Formatter, items: Vec<ObjectInfo>, summarize: bool) {
    if formatter.is_json() {
        let summary = summarize.then(|| Summary::of(&items));
        formatter.json(&LsOutput { items, summary });
        return;
    }

    for item in &items {
        let size = item.size_human.as_deref().unwrap_or("0 B");
        formatter.println(&format!("[{}] {:>10} {}", date(item), size, item.key));
    }

    if summarize {
        let summary = Summary::of(&items);
        formatter.println(&format!(
            "\nTotal: {} objects, {}",
            summary.total_objects, summary.total_size_human
        ));
    }
}

fn date(item: &ObjectInfo) -> String {
    item.last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| " ".repeat(19))
}
