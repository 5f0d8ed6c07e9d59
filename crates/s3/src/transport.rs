//! Signed HTTP transport
//!
//! One round trip per call: build the URL, stamp the signing headers,
//! send, and hand the response back untouched. Retries, XML parsing,
//! and transfer orchestration all live above this layer. The
//! [`Transport`] trait is the seam the orchestrator tests mock.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use jiff::Timestamp;
use reqwest::Method;
use tracing::debug;

use osc_core::{Credentials, Error, Result};

use crate::sign::{
    canonical_query_string, encode_key, sha256_hex, CanonicalRequest, Signer,
    EMPTY_PAYLOAD_SHA256,
};

/// One request against the object store, in service terms rather than
/// URL terms. The transport turns it into a signed HTTP call.
#[derive(Debug, Clone)]
pub struct S3Request {
    pub method: Method,
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl S3Request {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            bucket: None,
            key: None,
            query: Vec::new(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// A raw response: status, headers (lowercase names), and body bytes.
#[derive(Debug, Clone)]
pub struct S3Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl S3Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header by name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The ETag header as sent by the service (quotes included)
    pub fn etag(&self) -> Option<&str> {
        self.header("etag")
    }

    /// Body as text, for XML parsing and error reporting
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-success response into the service error it represents
    pub fn into_error(self) -> Error {
        Error::Protocol {
            status: self.status,
            body: self.text(),
        }
    }

    /// Pass a success response through, or fail with the service error
    pub fn check(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }
}

/// The seam between orchestrators and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: S3Request) -> Result<S3Response>;
}

/// Transport that signs every request and performs exactly one HTTP
/// round trip per call. No retries; TLS verification stays at the
/// client default.
pub struct SignedTransport {
    http: reqwest::Client,
    credentials: Credentials,
    signer: Signer,
}

impl SignedTransport {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let signer = Signer::new(&credentials)?;
        Ok(Self {
            http: reqwest::Client::new(),
            credentials,
            signer,
        })
    }

    /// Request path: `/`, `/bucket`, or `/bucket/encoded-key`
    fn request_path(request: &S3Request) -> String {
        let mut path = String::from("/");
        if let Some(bucket) = &request.bucket {
            path.push_str(bucket);
            if let Some(key) = &request.key {
                path.push('/');
                path.push_str(&encode_key(key));
            }
        }
        path
    }

    /// Host header value: hostname plus any non-default port
    fn host_header(&self) -> Result<String> {
        let endpoint = &self.credentials.endpoint;
        let host = endpoint
            .host_str()
            .ok_or_else(|| Error::Config(format!("endpoint {endpoint} has no host")))?;
        Ok(match endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    /// Full request URL. The query is the canonical (sorted, encoded)
    /// string, so the wire form and the signed form never disagree.
    fn build_url(&self, path: &str, query: &[(String, String)]) -> String {
        let endpoint = self.credentials.endpoint.as_str().trim_end_matches('/');
        let query_string = canonical_query_string(query);
        if query_string.is_empty() {
            format!("{endpoint}{path}")
        } else {
            format!("{endpoint}{path}?{query_string}")
        }
    }
}

#[async_trait]
impl Transport for SignedTransport {
    async fn execute(&self, request: S3Request) -> Result<S3Response> {
        let path = Self::request_path(&request);
        let url = self.build_url(&path, &request.query);

        let payload_hash = if request.body.is_empty() {
            EMPTY_PAYLOAD_SHA256.to_string()
        } else {
            sha256_hex(&request.body)
        };
        let amz_date = Timestamp::now().strftime("%Y%m%dT%H%M%SZ").to_string();

        let mut headers = request.headers.clone();
        headers.push(("host".to_string(), self.host_header()?));
        headers.push(("x-amz-date".to_string(), amz_date.clone()));
        headers.push(("x-amz-content-sha256".to_string(), payload_hash.clone()));

        let canonical = CanonicalRequest::new(
            request.method.as_str(),
            &path,
            &request.query,
            &headers,
            &payload_hash,
        );
        let authorization = self.signer.authorization(&canonical, &amz_date)?;

        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.http.request(request.method.clone(), &url);
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        builder = builder.header("authorization", authorization);

        // An explicit body (even empty) gives PUT and POST a
        // Content-Length; bodyless methods go without one.
        if !request.body.is_empty()
            || request.method == Method::PUT
            || request.method == Method::POST
        {
            builder = builder.body(request.body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let mut response_headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        debug!(status, bytes = body.len(), "response received");

        Ok(S3Response {
            status,
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn transport_for(endpoint: &str) -> SignedTransport {
        let credentials = Credentials {
            access_key: "access".to_string(),
            secret_key: "secret".to_string(),
            region: "us-east-1".to_string(),
            service: "s3".to_string(),
            endpoint: Url::parse(endpoint).unwrap(),
        };
        SignedTransport::new(credentials).unwrap()
    }

    #[test]
    fn test_request_path_forms() {
        let root = S3Request::new(Method::GET);
        assert_eq!(SignedTransport::request_path(&root), "/");

        let bucket = S3Request::new(Method::GET).bucket("mybucket");
        assert_eq!(SignedTransport::request_path(&bucket), "/mybucket");

        let object = S3Request::new(Method::GET)
            .bucket("mybucket")
            .key("photos/im age.jpg");
        assert_eq!(
            SignedTransport::request_path(&object),
            "/mybucket/photos/im%20age.jpg"
        );
    }

    #[test]
    fn test_host_header_keeps_custom_port() {
        let transport = transport_for("http://localhost:9000");
        assert_eq!(transport.host_header().unwrap(), "localhost:9000");
    }

    #[test]
    fn test_host_header_drops_default_port() {
        let transport = transport_for("https://s3.us-east-1.amazonaws.com:443");
        assert_eq!(transport.host_header().unwrap(), "s3.us-east-1.amazonaws.com");
    }

    #[test]
    fn test_build_url_with_query() {
        let transport = transport_for("http://localhost:9000");
        let query = vec![
            ("uploadId".to_string(), "abc".to_string()),
            ("partNumber".to_string(), "2".to_string()),
        ];
        assert_eq!(
            transport.build_url("/bucket/key", &query),
            "http://localhost:9000/bucket/key?partNumber=2&uploadId=abc"
        );
    }

    #[test]
    fn test_build_url_without_query() {
        let transport = transport_for("http://localhost:9000");
        assert_eq!(
            transport.build_url("/bucket", &[]),
            "http://localhost:9000/bucket"
        );
    }

    #[test]
    fn test_response_check() {
        let ok = S3Response {
            status: 206,
            headers: HashMap::new(),
            body: Bytes::from_static(b"data"),
        };
        assert!(ok.check().is_ok());

        let not_found = S3Response {
            status: 404,
            headers: HashMap::new(),
            body: Bytes::from_static(b"<Error/>"),
        };
        let err = not_found.check().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_response_header_lookup_is_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("etag".to_string(), "\"abc\"".to_string());
        let response = S3Response {
            status: 200,
            headers,
            body: Bytes::new(),
        };
        assert_eq!(response.header("ETag"), Some("\"abc\""));
        assert_eq!(response.etag(), Some("\"abc\""));
    }
}
