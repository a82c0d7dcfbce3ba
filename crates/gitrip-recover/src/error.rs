//! Recovery error types.

use thiserror::Error;

/// Errors that can occur during repository recovery.
///
/// Only `NotVulnerable` and bootstrap-fetch failures abort a run; every
/// per-object failure is recorded in the summary instead of propagating.
#[derive(Debug, Error)]
pub enum RecoverError {
    /// The target does not expose a usable `.git` directory.
    #[error("no .git directory is available at this URL")]
    NotVulnerable,

    /// A relative path did not resolve to a valid URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The request could not be completed.
    #[error("failed to retrieve {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server returned 404 for the path.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The server returned a non-200, non-404 status.
    #[error("unexpected status code for url {url}: {status}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The exposed configuration file could not be parsed.
    #[error("invalid repository config: {0}")]
    Config(String),

    /// The external pack resolver failed.
    #[error("pack resolution failed: {0}")]
    PackResolver(String),

    /// An object error occurred.
    #[error("object error: {0}")]
    Object(#[from] gitrip_object::ObjectError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
