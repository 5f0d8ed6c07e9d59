//! download command - Download an object
//!
//! Probes the object size with HEAD, then fetches it in one GET or as
//! ranged chunks, with flags to force either path.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use osc_core::{decide, ForcedMode, TransferMode, TransferPlan, DEFAULT_CHUNK_SIZE, DEFAULT_WORKERS};
use osc_s3::{Downloader, Sse};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{client_for, fail};

const MIB: u64 = 1024 * 1024;

/// Download an object
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Source bucket name
    pub bucket: String,

    /// Source object key
    pub key: String,

    /// Local destination path
    pub local_path: PathBuf,

    /// Download a specific version of the object
    #[arg(long)]
    pub version_id: Option<String>,

    /// Chunk size in MiB for chunked downloads
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE / MIB)]
    pub chunk_size: u64,

    /// Parallel chunk downloads (1 downloads sequentially)
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Always download in ranged chunks, regardless of size
    #[arg(long, conflicts_with = "force_single")]
    pub force_chunked: bool,

    /// Always download in one request, regardless of size
    #[arg(long)]
    pub force_single: bool,

    /// Encryption key the object was stored with (SSE-C)
    #[arg(long)]
    pub sse_customer_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct DownloadOutput {
    status: &'static str,
    bucket: String,
    key: String,
    local_path: String,
    size_bytes: u64,
    size_human: String,
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_id: Option<String>,
}

/// Execute the download command
pub async fn execute(args: DownloadArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if args.chunk_size == 0 {
        formatter.error("Chunk size must be at least 1 MiB");
        return ExitCode::UsageError;
    }

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let mut downloader =
        Downloader::new(client.transport(), args.bucket.as_str(), args.key.as_str());
    if let Some(version_id) = &args.version_id {
        downloader = downloader.version_id(version_id.clone());
    }
    if let Some(key) = &args.sse_customer_key {
        downloader = downloader.sse(Sse::Customer { key: key.clone() });
    }

    let size = match downloader.probe_size().await {
        Ok(size) => size,
        Err(e) => {
            if e.is_not_found() {
                formatter.error(&format!("Object not found: {}/{}", args.bucket, args.key));
                return ExitCode::NotFound;
            }
            return fail(&formatter, &e);
        }
    };

    let chunk_size = args.chunk_size * MIB;
    let mode = decide(size, chunk_size, forced_mode(&args));

    let bar = ProgressBar::new(output_config, size);
    let progress = bar.clone();
    let downloader = downloader.on_progress(move |bytes| progress.inc(bytes));

    let (result, chunks) = match mode {
        TransferMode::Single => (downloader.run_single(&args.local_path).await, None),
        TransferMode::Chunked => {
            let plan = TransferPlan::new(size, chunk_size, args.workers);
            let chunks = plan.chunk_count();
            (
                downloader.run_chunked(&args.local_path, &plan).await,
                Some(chunks),
            )
        }
    };
    bar.finish_and_clear();

    let written = match result {
        Ok(written) => written,
        Err(e) => return fail(&formatter, &e),
    };

    if formatter.is_json() {
        let output = DownloadOutput {
            status: "success",
            bucket: args.bucket,
            key: args.key,
            local_path: args.local_path.display().to_string(),
            size_bytes: written,
            size_human: humansize::format_size(written, humansize::BINARY),
            mode: mode_name(mode),
            chunks,
            version_id: args.version_id,
        };
        formatter.json(&output);
    } else {
        formatter.success(&format!(
            "Downloaded {}/{} to {} ({})",
            args.bucket,
            args.key,
            args.local_path.display(),
            humansize::format_size(written, humansize::BINARY)
        ));
    }

    ExitCode::Success
}

fn forced_mode(args: &DownloadArgs) -> Option<ForcedMode> {
    if args.force_chunked {
        Some(ForcedMode::Chunked)
    } else if args.force_single {
        Some(ForcedMode::Single)
    } else {
        None
    }
}

fn mode_name(mode: TransferMode) -> &'static str {
    match mode {
        TransferMode::Single => "single",
        TransferMode::Chunked => "chunked",
    }
}
