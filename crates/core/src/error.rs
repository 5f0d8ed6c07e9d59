//! Error types for osc-core
//!
//! Provides the unified error type shared by the whole workspace and the
//! mapping from errors to process exit codes.

use thiserror::Error;

/// Result type alias for osc operations
pub type Result<T> = std::result::Result<T, Error>;

/// How many bytes of a remote error body to keep in a displayed message
const BODY_SNIPPET_LEN: usize = 512;

/// Error types for osc operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile not found in the profile store
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Request could not be signed (missing credentials or date);
    /// fatal before any network call is attempted
    #[error("Signing error: {0}")]
    Signing(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection or TLS failure; a single attempt, never retried here
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success HTTP status
    #[error("Service error: HTTP {status}: {}", body_snippet(.body))]
    Protocol { status: u16, body: String },

    /// A 2xx response carried a body that could not be parsed
    #[error("Malformed response: {0}")]
    Xml(String),

    /// All parts were uploaded but the completion call failed; the
    /// multipart session still exists server-side
    #[error(
        "Completion failed with HTTP {status} ({}); all parts are uploaded, \
         retry completion or abort upload id {upload_id} manually",
        body_snippet(.body)
    )]
    CompleteFailed {
        upload_id: String,
        status: u16,
        body: String,
    },

    /// General error
    #[error("{0}")]
    General(String),
}

fn body_snippet(body: &str) -> &str {
    if body.len() <= BODY_SNIPPET_LEN {
        return body.trim_end();
    }
    // back off to the nearest char boundary
    let mut end = BODY_SNIPPET_LEN;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].trim_end()
}

impl Error {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::Signing(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::ProfileNotFound(_) => 5,                                   // NotFound
            Error::Transport(_) | Error::CompleteFailed { .. } => 3,          // NetworkError
            Error::Protocol { status, .. } => match status {
                401 | 403 => 4, // AuthError
                404 => 5,       // NotFound
                _ => 3,         // NetworkError
            },
            _ => 1, // GeneralError
        }
    }

    /// True when the remote service reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Protocol { status: 404, .. })
    }
}
