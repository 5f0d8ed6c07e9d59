//! osc-s3: signing and transfer engine for the osc CLI
//!
//! Hand-rolled Signature V4 request signing, a thin signed HTTP
//! transport, the XML wire types, and the chunked upload and download
//! orchestrators. This is the only crate that talks to the network.

pub mod client;
pub mod download;
pub mod pool;
pub mod sign;
pub mod sse;
pub mod transport;
pub mod upload;
pub mod xml;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ListOptions, ObjectMeta, S3Client};
pub use download::Downloader;
pub use sse::Sse;
pub use transport::{S3Request, S3Response, SignedTransport, Transport};
pub use upload::MultipartUploader;
