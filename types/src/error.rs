//! The error type shared by every resource.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::http::HttpStatus;

/// Boxed source for failures raised by collaborators this crate does not
/// depend on directly (the HTTP stack, cipher engines, key-value stores).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ResourceError {
    /// The body could not be decoded as a UTF-8 string.
    #[error("string decoding failed: {0}")]
    StringDecodingFailed(#[source] FromUtf8Error),
    /// The bytes are not a JSON representation of the requested type.
    #[error("JSON decoding failed: {0}")]
    JsonDecodingFailed(#[source] serde_json::Error),
    /// The content could not be encoded as JSON.
    #[error("JSON encoding failed: {0}")]
    JsonEncodingFailed(#[source] serde_json::Error),
    /// The URL of the request could not be constructed.
    #[error("URL is broken: {url}: {reason}")]
    UrlBroken { url: String, reason: String },
    /// A header name or value is not valid HTTP.
    #[error("invalid header {name}")]
    InvalidHeader { name: String },
    /// The request failed before a response arrived (host not found, connection reset, ...).
    #[error("request failed: {0}")]
    RequestFailed(#[source] BoxError),
    #[error("request timed out: {0}")]
    TimedOut(#[source] BoxError),
    /// TLS could not be established, including pinning rejections.
    #[error("secure connection failed: {0}")]
    SecureConnectionFailed(#[source] BoxError),
    /// The response status was outside 200..=299.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(HttpStatus),
    #[error("file not found: {path:?}")]
    FileNotFound { path: PathBuf },
    #[error("cannot read file {path:?}: {source}")]
    CannotReadFile { path: PathBuf, source: io::Error },
    #[error("cannot write file {path:?}: {source}")]
    CannotWriteFile { path: PathBuf, source: io::Error },
    /// A resource path escapes its root or is otherwise unusable.
    #[error("invalid resource path {path:?}: {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },
    /// The sandbox directory for the named location cannot be determined.
    #[error("sandbox location unavailable: {location}")]
    SandboxLocationUnavailable { location: &'static str },
    #[error("decryption failed: {0}")]
    DecryptionFailed(#[source] BoxError),
    #[error("encryption failed: {0}")]
    EncryptionFailed(#[source] BoxError),
    /// The key-value store rejected an operation.
    #[error("key-value store failed for key '{key}': {source}")]
    StoreFailed { key: String, source: BoxError },
}

impl ResourceError {
    /// Status of an `HttpStatus` failure, if that is what this is.
    #[must_use]
    pub fn http_status(&self) -> Option<HttpStatus> {
        match self {
            Self::HttpStatus(status) => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure came from the transport rather than from content.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_) | Self::TimedOut(_) | Self::SecureConnectionFailed(_)
        )
    }
}
