//! versions command - List object versions and delete markers
//!
//! One `GET ?versions` request, optionally narrowed by a prefix.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail, format_timestamp};

/// List object versions and delete markers
#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Bucket name
    pub bucket: String,

    /// Prefix (folder path) to list under
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize)]
struct VersionsOutput {
    versions: Vec<VersionRow>,
    delete_markers: Vec<DeleteMarkerRow>,
}

#[derive(Debug, Serialize)]
struct VersionRow {
    key: String,
    version_id: String,
    is_latest: bool,
    size_bytes: u64,
    last_modified: String,
}

#[derive(Debug, Serialize)]
struct DeleteMarkerRow {
    key: String,
    version_id: String,
    is_latest: bool,
    last_modified: String,
}

/// Execute the versions command
pub async fn execute(args: VersionsArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let listing = match client
        .list_versions(&args.bucket, args.prefix.as_deref())
        .await
    {
        Ok(listing) => listing,
        Err(e) => return fail(&formatter, &e),
    };

    if formatter.is_json() {
        let output = VersionsOutput {
            versions: listing
                .versions
                .iter()
                .map(|v| VersionRow {
                    key: v.key.clone(),
                    version_id: v.version_id.clone(),
                    is_latest: v.is_latest,
                    size_bytes: v.size,
                    last_modified: v.last_modified.clone(),
                })
                .collect(),
            delete_markers: listing
                .delete_markers
                .iter()
                .map(|m| DeleteMarkerRow {
                    key: m.key.clone(),
                    version_id: m.version_id.clone(),
                    is_latest: m.is_latest,
                    last_modified: m.last_modified.clone(),
                })
                .collect(),
        };
        formatter.json(&output);
        return ExitCode::Success;
    }

    for version in &listing.versions {
        let latest = if version.is_latest { " (latest)" } else { "" };
        formatter.println(&format!(
            "[{}] {:>10} {} version={}{latest}",
            format_timestamp(&version.last_modified),
            humansize::format_size(version.size, humansize::BINARY),
            version.key,
            version.version_id,
        ));
    }
    for marker in &listing.delete_markers {
        let latest = if marker.is_latest { " (latest)" } else { "" };
        formatter.println(&format!(
            "[{}] {:>10} {} version={}{latest}",
            format_timestamp(&marker.last_modified),
            "DELETED",
            marker.key,
            marker.version_id,
        ));
    }

    if listing.versions.is_empty() && listing.delete_markers.is_empty() {
        formatter.println(&format!("No versions found in {}", args.bucket));
    }

    ExitCode::Success
}
