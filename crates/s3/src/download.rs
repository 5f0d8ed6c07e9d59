//! Object download engine
//!
//! Two execution paths: a single GET for small objects, and a ranged
//! chunk plan for large ones. Chunked downloads preallocate the
//! destination and write each chunk at its own offset, so parallel
//! workers never contend for position. A failed download leaves the
//! partially written file on disk.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use osc_core::{ChunkSpec, Error, Result, TransferPlan};

use crate::pool::WorkerPool;
use crate::sse::Sse;
use crate::transport::{S3Request, Transport};
use crate::upload::ProgressFn;

/// State shared with chunk fetch tasks
struct ChunkContext {
    transport: Arc<dyn Transport>,
    bucket: String,
    key: String,
    version_id: Option<String>,
    read_headers: Vec<(String, String)>,
    dest: PathBuf,
}

/// Downloads one object to a local file.
pub struct Downloader {
    transport: Arc<dyn Transport>,
    bucket: String,
    key: String,
    version_id: Option<String>,
    sse: Sse,
    progress: Option<ProgressFn>,
}

impl Downloader {
    pub fn new(
        transport: Arc<dyn Transport>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            bucket: bucket.into(),
            key: key.into(),
            version_id: None,
            sse: Sse::None,
            progress: None,
        }
    }

    pub fn version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    pub fn sse(mut self, sse: Sse) -> Self {
        self.sse = sse;
        self
    }

    pub fn on_progress(mut self, progress: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Size of the remote object, from a HEAD request.
    pub async fn probe_size(&self) -> Result<u64> {
        let response = self
            .transport
            .execute(self.request(Method::HEAD))
            .await?
            .check()?;
        let length = response
            .header("content-length")
            .ok_or_else(|| Error::Xml("HEAD response has no Content-Length header".into()))?;
        length
            .parse()
            .map_err(|_| Error::Xml(format!("invalid Content-Length: {length}")))
    }

    /// Fetch the whole object with one request and write it to `dest`.
    /// Returns the number of bytes written.
    pub async fn run_single(&self, dest: &Path) -> Result<u64> {
        let response = self
            .transport
            .execute(self.request(Method::GET))
            .await?
            .check()?;

        tokio::fs::write(dest, &response.body).await?;
        let written = response.body.len() as u64;
        self.report_progress(written);
        debug!(bytes = written, dest = %dest.display(), "single-shot download complete");
        Ok(written)
    }

    /// Fetch the object as ranged chunks per `plan` and assemble it at
    /// `dest`. Returns the number of bytes written.
    pub async fn run_chunked(&self, dest: &Path, plan: &TransferPlan) -> Result<u64> {
        let ctx = Arc::new(ChunkContext {
            transport: Arc::clone(&self.transport),
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            version_id: self.version_id.clone(),
            read_headers: self.sse.read_headers(),
            dest: dest.to_path_buf(),
        });

        let written = if plan.workers() == 1 {
            self.fetch_sequential(ctx, plan).await?
        } else {
            self.fetch_parallel(ctx, plan).await?
        };

        debug!(bytes = written, dest = %dest.display(), "chunked download complete");
        Ok(written)
    }

    /// Chunks arrive in offset order and are appended, so a failure
    /// leaves a clean prefix of the object on disk.
    async fn fetch_sequential(&self, ctx: Arc<ChunkContext>, plan: &TransferPlan) -> Result<u64> {
        let mut file = tokio::fs::File::create(&ctx.dest).await?;
        let mut written = 0;
        for chunk in plan.chunks() {
            let body = fetch_range(&ctx, chunk).await?;
            file.write_all(&body).await?;
            self.report_progress(chunk.len);
            written += chunk.len;
        }
        file.flush().await?;
        Ok(written)
    }

    async fn fetch_parallel(&self, ctx: Arc<ChunkContext>, plan: &TransferPlan) -> Result<u64> {
        // Preallocate so every chunk can land at its own offset
        let file = tokio::fs::File::create(&ctx.dest).await?;
        file.set_len(plan.size()).await?;
        drop(file);

        let pool = WorkerPool::new(plan.workers());
        let chunks = plan.chunks();
        let expected = chunks.len();

        let task_ctx = Arc::clone(&ctx);
        let mut rx = pool.dispatch(chunks, move |chunk| {
            fetch_chunk(Arc::clone(&task_ctx), chunk)
        });

        let mut written = 0;
        let mut done = 0;
        while done < expected {
            match rx.recv().await {
                Some(Ok(bytes)) => {
                    self.report_progress(bytes);
                    written += bytes;
                    done += 1;
                }
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(Error::General(
                        "chunk download workers stopped unexpectedly".into(),
                    ))
                }
            }
        }
        Ok(written)
    }

    fn request(&self, method: Method) -> S3Request {
        let mut request = S3Request::new(method).bucket(&self.bucket).key(&self.key);
        if let Some(version_id) = &self.version_id {
            request = request.query("versionId", version_id);
        }
        for (name, value) in self.sse.read_headers() {
            request = request.header(name, value);
        }
        request
    }

    fn report_progress(&self, bytes: u64) {
        if let Some(progress) = &self.progress {
            progress(bytes);
        }
    }
}

/// Fetch one chunk and write it at its offset in the destination file.
/// Returns the chunk length.
async fn fetch_chunk(ctx: Arc<ChunkContext>, chunk: ChunkSpec) -> Result<u64> {
    let body = fetch_range(&ctx, chunk).await?;

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .open(&ctx.dest)
        .await?;
    file.seek(SeekFrom::Start(chunk.offset)).await?;
    file.write_all(&body).await?;
    file.flush().await?;

    debug!(part = chunk.part_number(), bytes = chunk.len, "chunk downloaded");
    Ok(chunk.len)
}

/// Ranged GET for one chunk, validated against the expected length
async fn fetch_range(ctx: &ChunkContext, chunk: ChunkSpec) -> Result<Bytes> {
    let mut request = S3Request::new(Method::GET).bucket(&ctx.bucket).key(&ctx.key);
    if let Some(version_id) = &ctx.version_id {
        request = request.query("versionId", version_id);
    }
    if let Some(range) = chunk.http_range() {
        request = request.header("range", range);
    }
    for (name, value) in &ctx.read_headers {
        request = request.header(name.clone(), value.clone());
    }

    let response = ctx.transport.execute(request).await?;
    // Servers answer ranged reads with 206, or 200 when the range
    // covers the whole object. Anything else is a failure.
    if response.status != 200 && response.status != 206 {
        return Err(response.into_error());
    }
    if response.body.len() as u64 != chunk.len {
        return Err(Error::Xml(format!(
            "range response returned {} bytes, expected {}",
            response.body.len(),
            chunk.len
        )));
    }
    Ok(response.body)
}
