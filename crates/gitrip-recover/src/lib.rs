//! Recovery engine for gitrip.
//!
//! Given the base URL of a web server that exposes its `.git` directory,
//! this crate walks the reference/commit/tree graph over HTTP, mirrors
//! everything it can reach into a local `.git` directory, recovers packed
//! objects through an external pack resolver, and materializes the
//! working tree.

mod config;
mod error;
mod fetcher;
mod materialize;
mod packs;
mod retriever;
mod summary;

pub use config::{Branch, GithubToken, Remote, RepoConfig, User};
pub use error::RecoverError;
pub use fetcher::{FetchOutcome, Fetcher};
pub use packs::{GitUnpack, PackResolver};
pub use retriever::Retriever;
pub use summary::{Status, Summary};

/// Result type for recovery operations.
pub type Result<T> = std::result::Result<T, RecoverError>;
