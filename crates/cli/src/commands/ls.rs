//! ls command - List buckets and objects
//!
//! Lists all buckets when called without arguments, or one directory
//! level of a bucket (delimiter `/`) when given a bucket and an
//! optional prefix.

use clap::Args;
use serde::Serialize;

use osc_s3::{ListOptions, S3Client};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail, format_timestamp};

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Bucket to list; omit to list all buckets
    pub bucket: Option<String>,

    /// Prefix (folder path) to list under
    pub prefix: Option<String>,

    /// Print totals after the listing
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Serialize)]
struct BucketsOutput {
    buckets: Vec<BucketRow>,
}

#[derive(Debug, Serialize)]
struct BucketRow {
    name: String,
    created: String,
}

#[derive(Debug, Serialize)]
struct ObjectsOutput {
    prefixes: Vec<String>,
    objects: Vec<ObjectRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct ObjectRow {
    key: String,
    size_bytes: u64,
    size_human: String,
    last_modified: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_objects: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    match &args.bucket {
        None => list_buckets(&client, &formatter, args.summarize).await,
        Some(bucket) => {
            list_objects(
                &client,
                bucket,
                args.prefix.as_deref(),
                args.summarize,
                &formatter,
            )
            .await
        }
    }
}

async fn list_buckets(client: &S3Client, formatter: &Formatter, summarize: bool) -> ExitCode {
    let buckets = match client.list_buckets().await {
        Ok(buckets) => buckets,
        Err(e) => return fail(formatter, &e),
    };

    if formatter.is_json() {
        let output = BucketsOutput {
            buckets: buckets
                .iter()
                .map(|bucket| BucketRow {
                    name: bucket.name.clone(),
                    created: bucket.creation_date.clone(),
                })
                .collect(),
        };
        formatter.json(&output);
    } else {
        for bucket in &buckets {
            formatter.println(&format!(
                "[{}] {}/",
                format_timestamp(&bucket.creation_date),
                bucket.name
            ));
        }
        if summarize {
            formatter.println(&format!("\nTotal: {} buckets", buckets.len()));
        }
    }

    ExitCode::Success
}

async fn list_objects(
    client: &S3Client,
    bucket: &str,
    prefix: Option<&str>,
    summarize: bool,
    formatter: &Formatter,
) -> ExitCode {
    let prefix = prefix.map(dir_prefix);

    let mut prefixes = Vec::new();
    let mut objects = Vec::new();
    let mut token: Option<String> = None;

    // Paginate through all results
    loop {
        let options = ListOptions {
            prefix: prefix.clone(),
            delimiter: Some("/".to_string()),
            continuation_token: token.take(),
            max_keys: Some(1000),
        };

        let page = match client.list_objects(bucket, options).await {
            Ok(page) => page,
            Err(e) => return fail(formatter, &e),
        };

        prefixes.extend(page.common_prefixes.into_iter().map(|p| p.prefix));
        objects.extend(page.contents);

        match (page.is_truncated, page.next_continuation_token) {
            (true, Some(next)) => token = Some(next),
            _ => break,
        }
    }

    let total_objects = objects.len();
    let total_size: u64 = objects.iter().map(|o| o.size).sum();

    if formatter.is_json() {
        let output = ObjectsOutput {
            prefixes,
            objects: objects
                .iter()
                .map(|object| ObjectRow {
                    key: object.key.clone(),
                    size_bytes: object.size,
                    size_human: humansize::format_size(object.size, humansize::BINARY),
                    last_modified: object.last_modified.clone(),
                })
                .collect(),
            summary: summarize.then(|| Summary {
                total_objects,
                total_size_bytes: total_size,
                total_size_human: humansize::format_size(total_size, humansize::BINARY),
            }),
        };
        formatter.json(&output);
    } else {
        for prefix in &prefixes {
            // Common prefixes carry no date or size
            formatter.println(&format!("[{:19}] {:>10} {prefix}", "", "DIR"));
        }
        for object in &objects {
            formatter.println(&format!(
                "[{}] {:>10} {}",
                format_timestamp(&object.last_modified),
                humansize::format_size(object.size, humansize::BINARY),
                object.key
            ));
        }
        if summarize {
            formatter.println(&format!(
                "\nTotal: {} objects, {}",
                total_objects,
                humansize::format_size(total_size, humansize::BINARY)
            ));
        }
    }

    ExitCode::Success
}

/// Folder prefixes always end in a slash on the wire
fn dir_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}
