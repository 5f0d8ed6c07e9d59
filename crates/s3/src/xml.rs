//! XML wire types
//!
//! Serde mappings for the request and response documents the service
//! speaks. The schema is fixed: a missing required field is a parse
//! error, never a silent default. Namespace declarations on response
//! roots are ignored by the deserializer, so both bare and namespaced
//! documents parse.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use osc_core::{Error, Result};

/// Parse a response body into one of the wire types
pub fn parse<T: DeserializeOwned>(xml: &str) -> Result<T> {
    quick_xml::de::from_str(xml).map_err(|e| Error::Xml(e.to_string()))
}

/// Response to initiating a multipart upload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitiateMultipartUploadResult {
    pub bucket: String,
    pub key: String,
    pub upload_id: String,
}

/// One completed part in a completion request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompletedPart {
    pub part_number: u32,
    #[serde(rename = "ETag")]
    pub etag: String,
}

/// The completion request document. Parts are kept in ascending part
/// number order regardless of the order they were collected in.
#[derive(Debug, Serialize)]
#[serde(rename = "CompleteMultipartUpload", rename_all = "PascalCase")]
pub struct CompleteMultipartUpload {
    part: Vec<CompletedPart>,
}

impl CompleteMultipartUpload {
    pub fn new(mut parts: Vec<CompletedPart>) -> Self {
        parts.sort_by_key(|p| p.part_number);
        Self { part: parts }
    }

    pub fn parts(&self) -> &[CompletedPart] {
        &self.part
    }

    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self).map_err(|e| Error::Xml(e.to_string()))
    }
}

/// Response to completing a multipart upload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompleteMultipartUploadResult {
    #[serde(rename = "ETag")]
    pub etag: String,
}

/// One object entry in a list response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: String,
    #[serde(rename = "ETag", default)]
    pub etag: Option<String>,
}

/// One common prefix ("directory") in a delimited list response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommonPrefix {
    pub prefix: String,
}

/// ListObjectsV2 response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBucketResult {
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_continuation_token: Option<String>,
    #[serde(rename = "Contents", default)]
    pub contents: Vec<ObjectEntry>,
    #[serde(rename = "CommonPrefixes", default)]
    pub common_prefixes: Vec<CommonPrefix>,
}

/// One bucket in the account listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketEntry {
    pub name: String,
    pub creation_date: String,
}

#[derive(Debug, Default, Deserialize)]
struct Buckets {
    #[serde(rename = "Bucket", default)]
    bucket: Vec<BucketEntry>,
}

/// ListBuckets response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListAllMyBucketsResult {
    #[serde(default)]
    buckets: Buckets,
}

impl ListAllMyBucketsResult {
    pub fn buckets(&self) -> &[BucketEntry] {
        &self.buckets.bucket
    }
}

/// One object version in a version listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionEntry {
    pub key: String,
    pub version_id: String,
    pub is_latest: bool,
    pub last_modified: String,
    pub size: u64,
    #[serde(rename = "ETag", default)]
    pub etag: Option<String>,
}

/// One delete marker in a version listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMarkerEntry {
    pub key: String,
    pub version_id: String,
    pub is_latest: bool,
    pub last_modified: String,
}

/// ListObjectVersions response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListVersionsResult {
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(rename = "Version", default)]
    pub versions: Vec<VersionEntry>,
    #[serde(rename = "DeleteMarker", default)]
    pub delete_markers: Vec<DeleteMarkerEntry>,
}
