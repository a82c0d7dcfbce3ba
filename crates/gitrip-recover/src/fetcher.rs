//! Deduplicated HTTP retrieval with a mirrored on-disk layout.

use crate::{RecoverError, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Per-request timeout. A failed fetch is terminal for that path; there
/// is no retry loop.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a fetch call.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The path was requested for the first time; here are its bytes.
    Retrieved(Bytes),
    /// The path was already requested earlier in this run. No network
    /// request was made and no side effects re-ran.
    AlreadyRequested,
}

/// HTTP fetcher for relative paths under an exposed `.git` directory.
///
/// Every successfully retrieved path is mirrored to the same relative
/// location under the local `.git` directory, except directory listings
/// (trailing `/`), whose content is returned for inspection but not
/// persisted. Each relative path is requested at most once per run.
pub struct Fetcher {
    base: Url,
    git_dir: PathBuf,
    client: reqwest::blocking::Client,
    requested: Mutex<HashSet<String>>,
}

impl Fetcher {
    /// Creates a fetcher for a base URL (the exposed `.git/` directory)
    /// mirroring into `git_dir`.
    ///
    /// Targets are arbitrary hosts, frequently with self-signed or
    /// expired certificates, so TLS verification is disabled. Proxy
    /// configuration is taken from the environment (reqwest default).
    pub fn new(base: Url, git_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("gitrip/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| RecoverError::Transport {
                url: base.to_string(),
                source: e,
            })?;
        Ok(Self {
            base,
            git_dir: git_dir.into(),
            client,
            requested: Mutex::new(HashSet::new()),
        })
    }

    /// Returns the local `.git` directory fetched files are mirrored to.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Returns the local mirror path a relative path is persisted at.
    pub fn local_path(&self, path: &str) -> PathBuf {
        self.git_dir.join(sanitize(path.trim()))
    }

    /// Fetches a relative path, mirroring the response to disk.
    ///
    /// The first call for a path performs the network request; later
    /// calls return [`FetchOutcome::AlreadyRequested`] without touching
    /// the network. The check-and-mark is atomic, so concurrent callers
    /// cannot both reach the network for the same path.
    pub fn fetch(&self, path: &str) -> Result<FetchOutcome> {
        let path = path.trim();
        if !self.requested.lock().insert(path.to_string()) {
            return Ok(FetchOutcome::AlreadyRequested);
        }

        let absolute = self.base.join(path)?;
        debug!(url = %absolute, "fetching");
        let response = self
            .client
            .get(absolute.clone())
            .send()
            .map_err(|e| RecoverError::Transport {
                url: absolute.to_string(),
                source: e,
            })?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(RecoverError::NotFound {
                    url: absolute.to_string(),
                })
            }
            status => {
                return Err(RecoverError::UnexpectedStatus {
                    url: absolute.to_string(),
                    status: status.as_u16(),
                })
            }
        }

        let content = response.bytes().map_err(|e| RecoverError::Transport {
            url: absolute.to_string(),
            source: e,
        })?;

        // Directory listings are inspected by the caller, never persisted
        // verbatim.
        if !path.ends_with('/') {
            let local = self.git_dir.join(sanitize(path));
            if let Some(parent) = local.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&local, &content)?;
        }

        Ok(FetchOutcome::Retrieved(content))
    }
}

/// Maps a fetched relative path to a safe relative filesystem path,
/// dropping empty, `.` and `..` components so listing-derived names
/// cannot escape the mirror directory.
fn sanitize(path: &str) -> PathBuf {
    path.split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_traversal() {
        assert_eq!(sanitize("refs/heads/master"), PathBuf::from("refs/heads/master"));
        assert_eq!(sanitize("../../etc/passwd"), PathBuf::from("etc/passwd"));
        assert_eq!(sanitize("/objects//ab/./cd"), PathBuf::from("objects/ab/cd"));
    }

    #[test]
    fn test_base_join_resolves_relative() {
        let base = Url::parse("http://victim.example/app/.git/").unwrap();
        let joined = base.join("objects/info/packs").unwrap();
        assert_eq!(
            joined.as_str(),
            "http://victim.example/app/.git/objects/info/packs"
        );
    }
}
