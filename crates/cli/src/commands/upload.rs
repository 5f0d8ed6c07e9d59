//! upload command - Upload a local file
//!
//! Picks single-shot or multipart from the file size and chunk size,
//! with flags to force either path. Multipart parts go through the
//! worker pool when `--workers` is above one.

use std::path::PathBuf;

use bytes::Bytes;
use clap::Args;
use serde::Serialize;

use osc_core::{
    decide, Error, ForcedMode, Result, TransferMode, TransferPlan, DEFAULT_CHUNK_SIZE,
    DEFAULT_WORKERS, MIN_PART_SIZE,
};
use osc_s3::{MultipartUploader, S3Client, Sse};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{client_for, fail};

const MIB: u64 = 1024 * 1024;

/// Upload a local file
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file path
    pub local_path: PathBuf,

    /// Destination bucket name
    pub bucket: String,

    /// Destination object key
    pub key: String,

    /// Chunk size in MiB for multipart uploads
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE / MIB)]
    pub chunk_size: u64,

    /// Parallel part uploads (1 uploads sequentially)
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Always use multipart, regardless of size
    #[arg(long, conflicts_with = "force_single")]
    pub force_multipart: bool,

    /// Always upload in one request, regardless of size
    #[arg(long)]
    pub force_single: bool,

    /// Content type; guessed from the file extension when omitted
    #[arg(long)]
    pub content_type: Option<String>,

    /// Server-side encryption mode
    #[arg(long, value_enum)]
    pub sse: Option<SseMode>,

    /// KMS key id for --sse aws-kms
    #[arg(long)]
    pub sse_kms_key_id: Option<String>,

    /// Encryption key for --sse customer
    #[arg(long)]
    pub sse_customer_key: Option<String>,
}

/// Server-side encryption modes selectable on the command line
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum SseMode {
    /// Service-managed keys (SSE-S3)
    Aes256,
    /// KMS-managed keys (SSE-KMS)
    AwsKms,
    /// Caller-provided key (SSE-C)
    Customer,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    status: &'static str,
    bucket: String,
    key: String,
    size_bytes: u64,
    size_human: String,
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let metadata = match tokio::fs::metadata(&args.local_path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => {
            formatter.error(&format!("{} is not a file", args.local_path.display()));
            return ExitCode::UsageError;
        }
        Err(e) => {
            formatter.error(&format!("Cannot read {}: {e}", args.local_path.display()));
            return ExitCode::GeneralError;
        }
    };
    let size = metadata.len();

    let chunk_size = args.chunk_size * MIB;
    let mode = decide(size, chunk_size, forced_mode(&args));

    if mode == TransferMode::Chunked && chunk_size < MIN_PART_SIZE {
        formatter.error(&format!(
            "Chunk size must be at least {} MiB for multipart uploads",
            MIN_PART_SIZE / MIB
        ));
        return ExitCode::UsageError;
    }

    let sse = match build_sse(&args) {
        Ok(sse) => sse,
        Err(e) => return fail(&formatter, &e),
    };

    let content_type = args.content_type.clone().or_else(|| {
        mime_guess::from_path(&args.local_path)
            .first()
            .map(|m| m.essence_str().to_string())
    });

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let bar = ProgressBar::new(output_config, size);

    let (result, parts) = match mode {
        TransferMode::Single => {
            let result = upload_single(&client, &args, content_type.as_deref(), &sse, &bar).await;
            (result, None)
        }
        TransferMode::Chunked => {
            let plan = TransferPlan::new(size, chunk_size, args.workers);
            let parts = plan.chunk_count();
            let result =
                upload_multipart(&client, &args, content_type.as_deref(), &sse, &bar, &plan).await;
            (result, Some(parts))
        }
    };
    bar.finish_and_clear();

    let etag = match result {
        Ok(etag) => etag,
        Err(e) => return fail(&formatter, &e),
    };

    if formatter.is_json() {
        let output = UploadOutput {
            status: "success",
            bucket: args.bucket,
            key: args.key,
            size_bytes: size,
            size_human: humansize::format_size(size, humansize::BINARY),
            mode: mode_name(mode),
            parts,
            etag,
            content_type,
        };
        formatter.json(&output);
    } else {
        let detail = match parts {
            Some(parts) => format!(
                "{} in {parts} parts",
                humansize::format_size(size, humansize::BINARY)
            ),
            None => humansize::format_size(size, humansize::BINARY),
        };
        formatter.success(&format!(
            "Uploaded {} to {}/{} ({detail})",
            args.local_path.display(),
            args.bucket,
            args.key
        ));
    }

    ExitCode::Success
}

async fn upload_single(
    client: &S3Client,
    args: &UploadArgs,
    content_type: Option<&str>,
    sse: &Sse,
    bar: &ProgressBar,
) -> Result<Option<String>> {
    let body = tokio::fs::read(&args.local_path).await?;
    let len = body.len() as u64;

    let etag = client
        .put_object(&args.bucket, &args.key, Bytes::from(body), content_type, sse)
        .await?;
    bar.inc(len);
    Ok(etag)
}

async fn upload_multipart(
    client: &S3Client,
    args: &UploadArgs,
    content_type: Option<&str>,
    sse: &Sse,
    bar: &ProgressBar,
    plan: &TransferPlan,
) -> Result<Option<String>> {
    let progress = bar.clone();
    let mut uploader =
        MultipartUploader::new(client.transport(), args.bucket.as_str(), args.key.as_str())
            .sse(sse.clone())
            .on_progress(move |bytes| progress.inc(bytes));
    if let Some(content_type) = content_type {
        uploader = uploader.content_type(content_type);
    }

    let etag = uploader.run(&args.local_path, plan).await?;
    Ok(Some(etag))
}

fn forced_mode(args: &UploadArgs) -> Option<ForcedMode> {
    if args.force_multipart {
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
        TransferMode::Chunked => "multipart",
    }
}

fn build_sse(args: &UploadArgs) -> std::result::Result<Sse, Error> {
    match args.sse {
        None => Ok(Sse::None),
        Some(SseMode::Aes256) => Ok(Sse::Aes256),
        Some(SseMode::AwsKms) => Ok(Sse::AwsKms {
            key_id: args.sse_kms_key_id.clone(),
        }),
        Some(SseMode::Customer) => match &args.sse_customer_key {
            Some(key) if !key.is_empty() => Ok(Sse::Customer { key: key.clone() }),
            _ => Err(Error::Config(
                "--sse customer requires --sse-customer-key".to_string(),
            )),
        },
    }
}
