//! S3 client
//!
//! Typed single-call operations over the signed transport: listings,
//! stat, delete, server-side copy, folder placeholders, and version
//! listings. Transfers that need chunking live in [`crate::upload`]
//! and [`crate::download`]; everything here is one request, one
//! response.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::Method;
use tracing::debug;

use osc_core::{Credentials, Error, Result};

use crate::sign::encode_key;
use crate::sse::Sse;
use crate::transport::{S3Request, SignedTransport, Transport};
use crate::xml::{
    self, BucketEntry, ListAllMyBucketsResult, ListBucketResult, ListVersionsResult,
};

/// Options for a ListObjectsV2 call
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: Option<u32>,
}

/// Object metadata from a HEAD request
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub size: u64,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    pub version_id: Option<String>,
    pub sse: Option<String>,
}

/// Client for single-call object store operations
pub struct S3Client {
    transport: Arc<dyn Transport>,
}

impl S3Client {
    /// Create a client that signs with the given credentials
    pub fn new(credentials: Credentials) -> Result<Self> {
        let transport = SignedTransport::new(credentials)?;
        Ok(Self {
            transport: Arc::new(transport),
        })
    }

    /// Create a client over an existing transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// The underlying transport, for handing to transfer orchestrators
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// All buckets in the account
    pub async fn list_buckets(&self) -> Result<Vec<BucketEntry>> {
        let request = S3Request::new(Method::GET);
        let response = self.transport.execute(request).await?.check()?;
        let result: ListAllMyBucketsResult = xml::parse(&response.text())?;
        Ok(result.buckets().to_vec())
    }

    /// One page of a ListObjectsV2 listing
    pub async fn list_objects(
        &self,
        bucket: &str,
        options: ListOptions,
    ) -> Result<ListBucketResult> {
        let mut request = S3Request::new(Method::GET)
            .bucket(bucket)
            .query("list-type", "2");
        if let Some(prefix) = &options.prefix {
            request = request.query("prefix", prefix);
        }
        if let Some(delimiter) = &options.delimiter {
            request = request.query("delimiter", delimiter);
        }
        if let Some(token) = &options.continuation_token {
            request = request.query("continuation-token", token);
        }
        if let Some(max_keys) = options.max_keys {
            request = request.query("max-keys", max_keys.to_string());
        }

        let response = self.transport.execute(request).await?.check()?;
        xml::parse(&response.text())
    }

    /// Object metadata via HEAD
    pub async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMeta> {
        let request = S3Request::new(Method::HEAD).bucket(bucket).key(key);
        let response = self.transport.execute(request).await?.check()?;

        let size = response
            .header("content-length")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::Xml("HEAD response has no Content-Length header".into()))?;

        Ok(ObjectMeta {
            size,
            etag: response.etag().map(str::to_string),
            content_type: response.header("content-type").map(str::to_string),
            last_modified: response.header("last-modified").map(str::to_string),
            version_id: response.header("x-amz-version-id").map(str::to_string),
            sse: response
                .header("x-amz-server-side-encryption")
                .map(str::to_string),
        })
    }

    /// Single-shot PUT of an in-memory body. Returns the ETag when the
    /// service sends one.
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
        sse: &Sse,
    ) -> Result<Option<String>> {
        let mut request = S3Request::new(Method::PUT).bucket(bucket).key(key).body(body);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        for (name, value) in sse.write_headers() {
            request = request.header(name, value);
        }

        let response = self.transport.execute(request).await?.check()?;
        Ok(response.etag().map(str::to_string))
    }

    /// Delete an object, or one specific version of it
    pub async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> Result<()> {
        let mut request = S3Request::new(Method::DELETE).bucket(bucket).key(key);
        if let Some(version_id) = version_id {
            request = request.query("versionId", version_id);
        }
        self.transport.execute(request).await?.check()?;
        Ok(())
    }

    /// Server-side copy. The source key is percent-encoded into the
    /// copy-source header the same way it would be in a request path.
    pub async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()> {
        let source = format!("/{src_bucket}/{}", encode_key(src_key));
        let request = S3Request::new(Method::PUT)
            .bucket(dst_bucket)
            .key(dst_key)
            .header("x-amz-copy-source", source);
        self.transport.execute(request).await?.check()?;
        Ok(())
    }

    /// All versions and delete markers, optionally under a prefix
    pub async fn list_versions(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Result<ListVersionsResult> {
        let mut request = S3Request::new(Method::GET)
            .bucket(bucket)
            .query("versions", "");
        if let Some(prefix) = prefix {
            request = request.query("prefix", prefix);
        }
        let response = self.transport.execute(request).await?.check()?;
        xml::parse(&response.text())
    }

    /// Create a folder placeholder: a zero-byte object whose key ends
    /// in a slash. Returns the normalized key.
    pub async fn mkdir(&self, bucket: &str, folder: &str) -> Result<String> {
        let key = dir_key(folder);
        let request = S3Request::new(Method::PUT).bucket(bucket).key(&key);
        self.transport.execute(request).await?.check()?;
        Ok(key)
    }

    /// Delete a folder placeholder and everything under it. Lists the
    /// full prefix (draining continuation tokens) and deletes each key
    /// in turn. Returns the deleted keys, which is empty when the
    /// folder does not exist.
    pub async fn rmdir(&self, bucket: &str, folder: &str) -> Result<Vec<String>> {
        let prefix = dir_key(folder);

        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let options = ListOptions {
                prefix: Some(prefix.clone()),
                continuation_token: token.take(),
                ..ListOptions::default()
            };
            let page = self.list_objects(bucket, options).await?;
            keys.extend(page.contents.into_iter().map(|o| o.key));

            match (page.is_truncated, page.next_continuation_token) {
                (true, Some(next)) => token = Some(next),
                _ => break,
            }
        }

        for key in &keys {
            self.delete_object(bucket, key, None).await?;
            debug!(bucket, key = key.as_str(), "deleted");
        }
        Ok(keys)
    }
}

/// Normalize a folder name to a trailing-slash key
fn dir_key(folder: &str) -> String {
    if folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{folder}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{header_value, query_value, response, response_with_headers, MockTransport};

    fn client_with(
        handler: impl Fn(&S3Request) -> Result<crate::transport::S3Response> + Send + Sync + 'static,
    ) -> (S3Client, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(handler));
        (S3Client::with_transport(transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_list_buckets_parses_names() {
        let xml = r#"<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
<Buckets>
<Bucket><Name>alpha</Name><CreationDate>2024-01-01T00:00:00.000Z</CreationDate></Bucket>
<Bucket><Name>beta</Name><CreationDate>2024-02-01T00:00:00.000Z</CreationDate></Bucket>
</Buckets>
</ListAllMyBucketsResult>"#;
        let (client, transport) = client_with(move |_| Ok(response(200, xml)));

        let buckets = client.list_buckets().await.unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].name, "alpha");
        assert_eq!(buckets[1].name, "beta");

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert!(requests[0].bucket.is_none());
    }

    #[tokio::test]
    async fn test_list_objects_sends_all_options() {
        let xml = r#"<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>"#;
        let (client, transport) = client_with(move |_| Ok(response(200, xml)));

        client
            .list_objects(
                "bucket",
                ListOptions {
                    prefix: Some("photos/".to_string()),
                    delimiter: Some("/".to_string()),
                    continuation_token: Some("tok".to_string()),
                    max_keys: Some(50),
                },
            )
            .await
            .unwrap();

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(query_value(request, "list-type"), Some("2"));
        assert_eq!(query_value(request, "prefix"), Some("photos/"));
        assert_eq!(query_value(request, "delimiter"), Some("/"));
        assert_eq!(query_value(request, "continuation-token"), Some("tok"));
        assert_eq!(query_value(request, "max-keys"), Some("50"));
    }

    #[tokio::test]
    async fn test_head_object_builds_meta_from_headers() {
        let (client, _) = client_with(|_| {
            Ok(response_with_headers(
                200,
                &[
                    ("content-length", "1234"),
                    ("etag", "\"abc\""),
                    ("content-type", "text/plain"),
                    ("last-modified", "Mon, 01 Jan 2024 00:00:00 GMT"),
                    ("x-amz-version-id", "v7"),
                    ("x-amz-server-side-encryption", "AES256"),
                ],
                b"",
            ))
        });

        let meta = client.head_object("bucket", "key").await.unwrap();
        assert_eq!(meta.size, 1234);
        assert_eq!(meta.etag.as_deref(), Some("\"abc\""));
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));
        assert_eq!(meta.version_id.as_deref(), Some("v7"));
        assert_eq!(meta.sse.as_deref(), Some("AES256"));
    }

    #[tokio::test]
    async fn test_head_missing_object_is_not_found() {
        let (client, _) = client_with(|_| Ok(response(404, "<Error/>")));
        let err = client.head_object("bucket", "gone").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_object_returns_etag_and_sends_headers() {
        let (client, transport) =
            client_with(|_| Ok(response_with_headers(200, &[("etag", "\"pp\"")], b"")));

        let etag = client
            .put_object(
                "bucket",
                "key",
                Bytes::from_static(b"hello"),
                Some("text/plain"),
                &Sse::Aes256,
            )
            .await
            .unwrap();
        assert_eq!(etag.as_deref(), Some("\"pp\""));

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.body.as_ref(), b"hello");
        assert_eq!(header_value(request, "content-type"), Some("text/plain"));
        assert_eq!(
            header_value(request, "x-amz-server-side-encryption"),
            Some("AES256")
        );
    }

    #[tokio::test]
    async fn test_delete_object_sends_version() {
        let (client, transport) = client_with(|_| Ok(response(204, "")));
        client
            .delete_object("bucket", "key", Some("v123"))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::DELETE);
        assert_eq!(query_value(&requests[0], "versionId"), Some("v123"));
    }

    #[tokio::test]
    async fn test_copy_object_encodes_source() {
        let (client, transport) = client_with(|_| Ok(response(200, "<CopyObjectResult/>")));
        client
            .copy_object("src-bucket", "path/with space.txt", "dst-bucket", "dst.txt")
            .await
            .unwrap();

        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.bucket.as_deref(), Some("dst-bucket"));
        assert_eq!(request.key.as_deref(), Some("dst.txt"));
        assert_eq!(
            header_value(request, "x-amz-copy-source"),
            Some("/src-bucket/path/with%20space.txt")
        );
    }

    #[tokio::test]
    async fn test_list_versions_query() {
        let xml = r#"<ListVersionsResult><IsTruncated>false</IsTruncated></ListVersionsResult>"#;
        let (client, transport) = client_with(move |_| Ok(response(200, xml)));

        client.list_versions("bucket", Some("docs/")).await.unwrap();

        let requests = transport.requests();
        assert_eq!(query_value(&requests[0], "versions"), Some(""));
        assert_eq!(query_value(&requests[0], "prefix"), Some("docs/"));
    }

    #[tokio::test]
    async fn test_mkdir_normalizes_trailing_slash() {
        let (client, transport) = client_with(|_| Ok(response(200, "")));

        let key = client.mkdir("bucket", "photos").await.unwrap();
        assert_eq!(key, "photos/");

        let key = client.mkdir("bucket", "already/").await.unwrap();
        assert_eq!(key, "already/");

        let requests = transport.requests();
        assert_eq!(requests[0].key.as_deref(), Some("photos/"));
        assert!(requests[0].body.is_empty());
        assert_eq!(requests[1].key.as_deref(), Some("already/"));
    }

    #[tokio::test]
    async fn test_rmdir_drains_pages_and_deletes_each_key() {
        let page1 = r#"<ListBucketResult>
<IsTruncated>true</IsTruncated>
<NextContinuationToken>t2</NextContinuationToken>
<Contents><Key>folder/a.txt</Key><LastModified>2024-01-01T00:00:00Z</LastModified><Size>1</Size></Contents>
<Contents><Key>folder/b.txt</Key><LastModified>2024-01-01T00:00:00Z</LastModified><Size>2</Size></Contents>
</ListBucketResult>"#;
        let page2 = r#"<ListBucketResult>
<IsTruncated>false</IsTruncated>
<Contents><Key>folder/c.txt</Key><LastModified>2024-01-01T00:00:00Z</LastModified><Size>3</Size></Contents>
</ListBucketResult>"#;

        let (client, transport) = client_with(move |request: &S3Request| match request.method {
            Method::GET => match query_value(request, "continuation-token") {
                None => Ok(response(200, page1)),
                Some("t2") => Ok(response(200, page2)),
                Some(other) => Ok(response(500, &format!("bad token {other}"))),
            },
            Method::DELETE => Ok(response(204, "")),
            _ => Ok(response(500, "unexpected")),
        });

        let deleted = client.rmdir("bucket", "folder").await.unwrap();
        assert_eq!(deleted, vec!["folder/a.txt", "folder/b.txt", "folder/c.txt"]);

        let requests = transport.requests();
        let deletes: Vec<_> = requests
            .iter()
            .filter(|r| r.method == Method::DELETE)
            .collect();
        assert_eq!(deletes.len(), 3);
        assert_eq!(deletes[0].key.as_deref(), Some("folder/a.txt"));

        // Both list calls carry the normalized prefix
        for request in requests.iter().filter(|r| r.method == Method::GET) {
            assert_eq!(query_value(request, "prefix"), Some("folder/"));
        }
    }

    #[tokio::test]
    async fn test_rmdir_of_missing_folder_deletes_nothing() {
        let empty = r#"<ListBucketResult><IsTruncated>false</IsTruncated></ListBucketResult>"#;
        let (client, transport) = client_with(move |_| Ok(response(200, empty)));

        let deleted = client.rmdir("bucket", "ghost").await.unwrap();
        assert!(deleted.is_empty());

        let requests = transport.requests();
        assert!(requests.iter().all(|r| r.method == Method::GET));
    }
}
