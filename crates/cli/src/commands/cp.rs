//! cp command - Copy an object server-side
//!
//! One `x-amz-copy-source` request; the bytes never leave the service.
//! Local transfers are the upload and download commands.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail};

/// Copy an object server-side
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source bucket name
    pub source_bucket: String,

    /// Source object key
    pub source_key: String,

    /// Destination bucket name
    pub dest_bucket: String,

    /// Destination object key
    pub dest_key: String,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    source: String,
    target: String,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let source = format!("{}/{}", args.source_bucket, args.source_key);
    let target = format!("{}/{}", args.dest_bucket, args.dest_key);

    if let Err(e) = client
        .copy_object(
            &args.source_bucket,
            &args.source_key,
            &args.dest_bucket,
            &args.dest_key,
        )
        .await
    {
        if e.is_not_found() {
            formatter.error(&format!("Source not found: {source}"));
            return ExitCode::NotFound;
        }
        return fail(&formatter, &e);
    }

    if formatter.is_json() {
        let output = CpOutput {
            status: "success",
            source,
            target,
        };
        formatter.json(&output);
    } else {
        formatter.success(&format!("Copied {source} -> {target}"));
    }

    ExitCode::Success
}
