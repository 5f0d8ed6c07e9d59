//! Multipart upload orchestration
//!
//! Drives one multipart session from initiate through part uploads to
//! completion. The failure contract is strict: a part failure aborts
//! the session exactly once and never attempts completion, while a
//! failed completion after all parts succeeded is reported as its own
//! error because the session is still alive server-side.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

use osc_core::{ChunkSpec, Error, Result, TransferPlan, MAX_PARTS};

use crate::pool::WorkerPool;
use crate::sse::Sse;
use crate::transport::{S3Request, Transport};
use crate::xml::{
    self, CompleteMultipartUpload, CompleteMultipartUploadResult, CompletedPart,
    InitiateMultipartUploadResult,
};

/// Callback invoked with the byte count of each finished chunk
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// State shared with part upload tasks
struct PartContext {
    transport: Arc<dyn Transport>,
    bucket: String,
    key: String,
    upload_id: String,
    part_headers: Vec<(String, String)>,
    source: PathBuf,
}

/// Uploads one local file as a multipart session.
pub struct MultipartUploader {
    transport: Arc<dyn Transport>,
    bucket: String,
    key: String,
    content_type: Option<String>,
    sse: Sse,
    progress: Option<ProgressFn>,
}

impl MultipartUploader {
    pub fn new(
        transport: Arc<dyn Transport>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            bucket: bucket.into(),
            key: key.into(),
            content_type: None,
            sse: Sse::None,
            progress: None,
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
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

    /// Upload `source` according to `plan`. Returns the ETag of the
    /// assembled object.
    pub async fn run(&self, source: &Path, plan: &TransferPlan) -> Result<String> {
        let chunk_count = plan.chunk_count();
        if chunk_count > MAX_PARTS {
            return Err(Error::Config(format!(
                "upload would need {chunk_count} parts but the limit is {MAX_PARTS}; \
                 increase the chunk size"
            )));
        }

        let upload_id = self.initiate().await?;
        debug!(upload_id, parts = chunk_count, "multipart upload initiated");

        let ctx = Arc::new(PartContext {
            transport: Arc::clone(&self.transport),
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            upload_id: upload_id.clone(),
            part_headers: self.sse.read_headers(),
            source: source.to_path_buf(),
        });

        let parts = match self.upload_parts(ctx, plan).await {
            Ok(parts) => parts,
            Err(err) => {
                match self.abort(&upload_id).await {
                    Ok(()) => debug!(upload_id, "multipart upload aborted"),
                    Err(abort_err) => {
                        warn!(upload_id, error = %abort_err, "failed to abort multipart upload")
                    }
                }
                return Err(err);
            }
        };

        self.complete(&upload_id, parts).await
    }

    async fn initiate(&self) -> Result<String> {
        let mut request = S3Request::new(Method::POST)
            .bucket(&self.bucket)
            .key(&self.key)
            .query("uploads", "");
        if let Some(content_type) = &self.content_type {
            request = request.header("content-type", content_type);
        }
        for (name, value) in self.sse.write_headers() {
            request = request.header(name, value);
        }

        let response = self.transport.execute(request).await?.check()?;
        let result: InitiateMultipartUploadResult = xml::parse(&response.text())?;
        Ok(result.upload_id)
    }

    async fn upload_parts(
        &self,
        ctx: Arc<PartContext>,
        plan: &TransferPlan,
    ) -> Result<Vec<CompletedPart>> {
        if plan.workers() == 1 {
            self.upload_parts_sequential(ctx, plan).await
        } else {
            self.upload_parts_parallel(ctx, plan).await
        }
    }

    async fn upload_parts_sequential(
        &self,
        ctx: Arc<PartContext>,
        plan: &TransferPlan,
    ) -> Result<Vec<CompletedPart>> {
        let mut parts = Vec::with_capacity(plan.chunk_count());
        for chunk in plan.chunks() {
            let (part, len) = upload_part(Arc::clone(&ctx), chunk).await?;
            self.report_progress(len);
            parts.push(part);
        }
        Ok(parts)
    }

    async fn upload_parts_parallel(
        &self,
        ctx: Arc<PartContext>,
        plan: &TransferPlan,
    ) -> Result<Vec<CompletedPart>> {
        let pool = WorkerPool::new(plan.workers());
        let chunks = plan.chunks();
        let expected = chunks.len();

        let task_ctx = Arc::clone(&ctx);
        let mut rx = pool.dispatch(chunks, move |chunk| {
            upload_part(Arc::clone(&task_ctx), chunk)
        });

        let mut parts = Vec::with_capacity(expected);
        while parts.len() < expected {
            match rx.recv().await {
                Some(Ok((part, len))) => {
                    self.report_progress(len);
                    parts.push(part);
                }
                // Dropping the receiver here stops parts that have not
                // started; in-flight parts finish and are discarded.
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(Error::General(
                        "part upload workers stopped unexpectedly".into(),
                    ))
                }
            }
        }
        Ok(parts)
    }

    async fn complete(&self, upload_id: &str, parts: Vec<CompletedPart>) -> Result<String> {
        let body = CompleteMultipartUpload::new(parts).to_xml()?;

        let request = S3Request::new(Method::POST)
            .bucket(&self.bucket)
            .key(&self.key)
            .query("uploadId", upload_id)
            .header("content-type", "application/xml")
            .body(body);

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(Error::CompleteFailed {
                upload_id: upload_id.to_string(),
                status: response.status,
                body: response.text(),
            });
        }

        let result: CompleteMultipartUploadResult = xml::parse(&response.text())?;
        debug!(upload_id, etag = %result.etag, "multipart upload completed");
        Ok(result.etag)
    }

    async fn abort(&self, upload_id: &str) -> Result<()> {
        let request = S3Request::new(Method::DELETE)
            .bucket(&self.bucket)
            .key(&self.key)
            .query("uploadId", upload_id);
        self.transport.execute(request).await?.check()?;
        Ok(())
    }

    fn report_progress(&self, bytes: u64) {
        if let Some(progress) = &self.progress {
            progress(bytes);
        }
    }
}

/// Upload a single part and return its entry for the completion doc
async fn upload_part(ctx: Arc<PartContext>, chunk: ChunkSpec) -> Result<(CompletedPart, u64)> {
    let body = read_chunk(&ctx.source, chunk).await?;
    let part_number = chunk.part_number();

    let mut request = S3Request::new(Method::PUT)
        .bucket(&ctx.bucket)
        .key(&ctx.key)
        .query("partNumber", part_number.to_string())
        .query("uploadId", &ctx.upload_id)
        .body(body);
    for (name, value) in &ctx.part_headers {
        request = request.header(name.clone(), value.clone());
    }

    let response = ctx.transport.execute(request).await?.check()?;
    let etag = response
        .etag()
        .ok_or_else(|| Error::Xml(format!("part {part_number} response has no ETag header")))?
        .to_string();

    debug!(part_number, bytes = chunk.len, "part uploaded");
    Ok((CompletedPart { part_number, etag }, chunk.len))
}

/// Read one chunk of the source file
async fn read_chunk(path: &Path, chunk: ChunkSpec) -> Result<Bytes> {
    let mut file = tokio::fs::File::open(path).await?;
    file.seek(SeekFrom::Start(chunk.offset)).await?;
    let mut buf = vec![0u8; chunk.len as usize];
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}
