//! rmdir command - Remove a folder and everything under it
//!
//! Lists the full prefix and deletes every key found, including the
//! folder placeholder itself.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail};

/// Remove a folder and its contents
#[derive(Args, Debug)]
pub struct RmdirArgs {
    /// Bucket name
    pub bucket: String,

    /// Folder path to remove
    pub folder: String,
}

#[derive(Debug, Serialize)]
struct RmdirOutput {
    status: &'static str,
    bucket: String,
    folder: String,
    deleted: Vec<String>,
    total: usize,
}

/// Execute the rmdir command
pub async fn execute(args: RmdirArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let deleted = match client.rmdir(&args.bucket, &args.folder).await {
        Ok(deleted) => deleted,
        Err(e) => return fail(&formatter, &e),
    };

    if formatter.is_json() {
        let total = deleted.len();
        let output = RmdirOutput {
            status: "success",
            bucket: args.bucket,
            folder: args.folder,
            deleted,
            total,
        };
        formatter.json(&output);
        return ExitCode::Success;
    }

    if deleted.is_empty() {
        formatter.warning(&format!(
            "Folder {}/{} is empty or does not exist",
            args.bucket, args.folder
        ));
        return ExitCode::Success;
    }

    for key in &deleted {
        formatter.println(&format!("Removed {}/{key}", args.bucket));
    }
    formatter.success(&format!("Removed {} object(s)", deleted.len()));

    ExitCode::Success
}
