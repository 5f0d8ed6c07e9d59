//! mv command - Move an object server-side
//!
//! Copy then delete. The two failure modes are reported differently:
//! a failed copy leaves everything as it was, while a failed delete
//! means the copy already exists at the destination.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail};

/// Move an object server-side
#[derive(Args, Debug)]
pub struct MvArgs {
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
struct MvOutput {
    status: &'static str,
    source: String,
    target: String,
}

/// Execute the mv command
pub async fn execute(args: MvArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
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

    if let Err(e) = client
        .delete_object(&args.source_bucket, &args.source_key, None)
        .await
    {
        // The copy already landed; only the source cleanup failed
        formatter.error(&format!("Copied but failed to delete source: {e}"));
        formatter.warning(&format!("Copy exists at {target}"));
        return ExitCode::from(&e);
    }

    if formatter.is_json() {
        let output = MvOutput {
            status: "success",
            source,
            target,
        };
        formatter.json(&output);
    } else {
        formatter.success(&format!("Moved {source} -> {target}"));
    }

    ExitCode::Success
}
