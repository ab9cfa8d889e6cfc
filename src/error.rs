//! Error types for emoji-dl
//!
//! Two families live here:
//! - [`Error`], the crate-wide error returned by fallible setup and I/O operations
//! - [`TransportError`], the per-request failure the fetch pipeline downgrades
//!   to "this candidate failed" and never propagates
//!
//! Batch processing never aborts on a single key. The worst outcome for one key
//! is a [`FailureReason`](crate::types::FailureReason) in the batch report.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for emoji-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for emoji-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "workers")
        key: Option<String>,
    },

    /// A codepoint token could not be normalized into a key
    #[error("malformed codepoint {token:?}: {reason}")]
    MalformedCodepoint {
        /// The raw token as it appeared in the input
        token: String,
        /// Why the token was rejected
        reason: String,
    },

    /// The download cache file exists but could not be parsed
    #[error("download cache {path} is corrupt: {reason}")]
    CacheCorrupt {
        /// Path of the cache file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Emoji registry text could not be obtained
    #[error("registry error: {0}")]
    Registry(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The batch was interrupted by a termination signal
    #[error("interrupted by signal")]
    Interrupted,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// A single request that did not produce a usable response
///
/// These never escape the fetch pipeline; they are logged and the next
/// candidate is tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// Connect or read timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// TCP/TLS connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other request-level failure (redirect limit, invalid URL, ...)
    #[error("request failed: {0}")]
    Request(String),

    /// The body could not be read to completion
    #[error("failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}
