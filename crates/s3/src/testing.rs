//! Test support: a scripted transport and response builders.
//!
//! The mock answers each request through a handler closure keyed off
//! the request itself, so tests stay deterministic even when the
//! worker pool completes parts out of order. Every request is recorded
//! for later assertions.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use osc_core::Result;

use crate::transport::{S3Request, S3Response, Transport};

type Handler = Box<dyn Fn(&S3Request) -> Result<S3Response> + Send + Sync>;
type DelayFn = Box<dyn Fn(&S3Request) -> Duration + Send + Sync>;

pub(crate) struct MockTransport {
    handler: Handler,
    delay: Option<DelayFn>,
    requests: Mutex<Vec<S3Request>>,
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&S3Request) -> Result<S3Response> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Delay each response by a request-dependent amount, to force
    /// out-of-order completion in parallel tests.
    pub(crate) fn with_delay(
        mut self,
        delay: impl Fn(&S3Request) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub(crate) fn requests(&self) -> Vec<S3Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: S3Request) -> Result<S3Response> {
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(&request)).await;
        }
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }
}

/// Value of a query parameter on a recorded request
pub(crate) fn query_value<'a>(request: &'a S3Request, name: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

/// Value of a header on a recorded request
pub(crate) fn header_value<'a>(request: &'a S3Request, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub(crate) fn response(status: u16, body: &str) -> S3Response {
    S3Response {
        status,
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

pub(crate) fn response_with_headers(
    status: u16,
    headers: &[(&str, &str)],
    body: &[u8],
) -> S3Response {
    S3Response {
        status,
        headers: headers
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect(),
        body: Bytes::copy_from_slice(body),
    }
}

pub(crate) fn etag_response(etag: &str) -> S3Response {
    response_with_headers(200, &[("etag", etag)], b"")
}

pub(crate) fn initiate_response(upload_id: &str) -> S3Response {
    let body = format!(
        "<InitiateMultipartUploadResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <Bucket>bucket</Bucket><Key>key</Key>\
         <UploadId>{upload_id}</UploadId>\
         </InitiateMultipartUploadResult>"
    );
    response(200, &body)
}

pub(crate) fn complete_response(etag: &str) -> S3Response {
    let body = format!(
        "<CompleteMultipartUploadResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
         <Location>http://example</Location><Bucket>bucket</Bucket><Key>key</Key>\
         <ETag>{etag}</ETag>\
         </CompleteMultipartUploadResult>"
    );
    response(200, &body)
}
