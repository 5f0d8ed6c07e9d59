//! Server-side encryption headers
//!
//! Builds the x-amz-server-side-encryption-* header sets for the three
//! encryption modes. SSE-C is the only mode that also needs headers on
//! reads; the managed modes are transparent once the object is stored.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use md5::{Digest, Md5};

/// Server-side encryption mode for a transfer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Sse {
    #[default]
    None,
    /// SSE-S3: service-managed keys
    Aes256,
    /// SSE-KMS, optionally pinned to a specific key
    AwsKms { key_id: Option<String> },
    /// SSE-C: caller-provided key, sent base64-encoded with its MD5
    Customer { key: String },
}

impl Sse {
    /// Headers for write requests (PUT object, initiate, upload part)
    pub fn write_headers(&self) -> Vec<(String, String)> {
        match self {
            Sse::None => Vec::new(),
            Sse::Aes256 => vec![(
                "x-amz-server-side-encryption".to_string(),
                "AES256".to_string(),
            )],
            Sse::AwsKms { key_id } => {
                let mut headers = vec![(
                    "x-amz-server-side-encryption".to_string(),
                    "aws:kms".to_string(),
                )];
                if let Some(key_id) = key_id {
                    headers.push((
                        "x-amz-server-side-encryption-aws-kms-key-id".to_string(),
                        key_id.clone(),
                    ));
                }
                headers
            }
            Sse::Customer { key } => customer_headers(key),
        }
    }

    /// Headers for requests that touch an existing SSE-C session or
    /// object (GET, HEAD, part uploads). Only SSE-C needs the key
    /// presented again; managed modes are set at creation time.
    pub fn read_headers(&self) -> Vec<(String, String)> {
        match self {
            Sse::Customer { key } => customer_headers(key),
            _ => Vec::new(),
        }
    }
}

fn customer_headers(key: &str) -> Vec<(String, String)> {
    let key_bytes = key.as_bytes();
    let key_b64 = BASE64_STANDARD.encode(key_bytes);
    let key_md5 = BASE64_STANDARD.encode(Md5::digest(key_bytes));
    vec![
        (
            "x-amz-server-side-encryption-customer-algorithm".to_string(),
            "AES256".to_string(),
        ),
        (
            "x-amz-server-side-encryption-customer-key".to_string(),
            key_b64,
        ),
        (
            "x-amz-server-side-encryption-customer-key-md5".to_string(),
            key_md5,
        ),
    ]
}
