//! mkdir command - Create a folder placeholder
//!
//! S3 has no real directories; this writes a zero-byte object whose
//! key ends in a slash, which browsers and listings treat as a folder.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail};

/// Create a folder placeholder
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Bucket name
    pub bucket: String,

    /// Folder path to create
    pub folder: String,
}

#[derive(Debug, Serialize)]
struct MkdirOutput {
    status: &'static str,
    bucket: String,
    folder: String,
}

/// Execute the mkdir command
pub async fn execute(args: MkdirArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let folder = match client.mkdir(&args.bucket, &args.folder).await {
        Ok(folder) => folder,
        Err(e) => return fail(&formatter, &e),
    };

    if formatter.is_json() {
        let output = MkdirOutput {
            status: "success",
            bucket: args.bucket,
            folder,
        };
        formatter.json(&output);
    } else {
        formatter.success(&format!("Created folder {}/{}", args.bucket, folder));
    }

    ExitCode::Success
}
