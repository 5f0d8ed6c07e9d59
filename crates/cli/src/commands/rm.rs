//! rm command - Remove an object
//!
//! Deletes a single object, or one specific version of it when
//! `--version-id` is given.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail};

/// Remove an object
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Bucket name
    pub bucket: String,

    /// Object key to remove
    pub key: String,

    /// Remove only this version of the object
    #[arg(long)]
    pub version_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    bucket: String,
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_id: Option<String>,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    if let Err(e) = client
        .delete_object(&args.bucket, &args.key, args.version_id.as_deref())
        .await
    {
        return fail(&formatter, &e);
    }

    if formatter.is_json() {
        let output = RmOutput {
            status: "success",
            bucket: args.bucket,
            key: args.key,
            version_id: args.version_id,
        };
        formatter.json(&output);
    } else {
        match &args.version_id {
            Some(version_id) => formatter.success(&format!(
                "Removed version {version_id} of {}/{}",
                args.bucket, args.key
            )),
            None => formatter.success(&format!("Removed {}/{}", args.bucket, args.key)),
        }
    }

    ExitCode::Success
}
