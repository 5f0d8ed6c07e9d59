//! stat command - Show object metadata
//!
//! One HEAD request; prints whatever metadata the service reports.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail, format_timestamp};

/// Show object metadata
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Bucket name
    pub bucket: String,

    /// Object key
    pub key: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    bucket: String,
    key: String,
    size_bytes: u64,
    size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encryption: Option<String>,
}

/// Execute the stat command
pub async fn execute(args: StatArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let meta = match client.head_object(&args.bucket, &args.key).await {
        Ok(meta) => meta,
        Err(e) => {
            if e.is_not_found() {
                formatter.error(&format!("Object not found: {}/{}", args.bucket, args.key));
                return ExitCode::NotFound;
            }
            return fail(&formatter, &e);
        }
    };

    if formatter.is_json() {
        let output = StatOutput {
            bucket: args.bucket,
            key: args.key,
            size_bytes: meta.size,
            size_human: humansize::format_size(meta.size, humansize::BINARY),
            etag: meta.etag,
            content_type: meta.content_type,
            last_modified: meta.last_modified,
            version_id: meta.version_id,
            encryption: meta.sse,
        };
        formatter.json(&output);
    } else {
        formatter.println(&format!("Name         : {}/{}", args.bucket, args.key));
        formatter.println(&format!(
            "Size         : {} ({} bytes)",
            humansize::format_size(meta.size, humansize::BINARY),
            meta.size
        ));
        if let Some(etag) = &meta.etag {
            formatter.println(&format!("ETag         : {etag}"));
        }
        if let Some(content_type) = &meta.content_type {
            formatter.println(&format!("Content-Type : {content_type}"));
        }
        if let Some(modified) = &meta.last_modified {
            formatter.println(&format!("Modified     : {}", format_timestamp(modified)));
        }
        if let Some(version_id) = &meta.version_id {
            formatter.println(&format!("Version      : {version_id}"));
        }
        if let Some(sse) = &meta.sse {
            formatter.println(&format!("Encryption   : {sse}"));
        }
    }

    ExitCode::Success
}
