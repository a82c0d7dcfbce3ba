//! Discovery orchestration.
//!
//! The retriever drives a whole run: it confirms the target exposes a
//! usable `.git` directory, mirrors the reference files it can find,
//! walks the commit/tree/blob graph with an explicit worklist, recovers
//! packed objects, and finally materializes the working tree.

use crate::materialize::Materializer;
use crate::packs::{parse_pack_index, scan_listing, PackResolver};
use crate::{FetchOutcome, Fetcher, RecoverError, RepoConfig, Result, Status, Summary};
use bytes::Bytes;
use gitrip_object::{DiskStore, ObjectId, ObjectType};
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Well-known paths probed opportunistically after the bootstrap fetches.
/// Failures on any of these are logged, never fatal.
const PROBE_PATHS: &[&str] = &[
    "refs/heads/master",
    "refs/heads/main",
    "objects/info/packs",
    "description",
    "COMMIT_EDITMSG",
    "index",
    "packed-refs",
    "refs/stash",
    "logs/HEAD",
    "logs/refs/heads/master",
    "logs/refs/heads/main",
    "logs/refs/remotes/origin/HEAD",
    "info/refs",
    "info/exclude",
];

/// One recovery run against a single target.
///
/// All traversal state (the fetch-dedup record, the found/missing sets,
/// the worklist) lives inside this value, so concurrent runs never
/// interfere.
pub struct Retriever<R: PackResolver> {
    fetcher: Fetcher,
    store: DiskStore,
    output_dir: PathBuf,
    resolver: R,
    summary: Summary,
    worklist: VecDeque<ObjectId>,
    head_ref: String,
    head_commit: Option<ObjectId>,
    pack_info_available: bool,
}

impl<R: PackResolver> Retriever<R> {
    /// Creates a retriever for a target URL, writing into `output_dir`.
    ///
    /// The conventional `.git/` suffix is appended to the URL by
    /// reference resolution, once, at construction.
    pub fn new(target: url::Url, output_dir: PathBuf, resolver: R) -> Result<Self> {
        let base = target.join(".git/")?;
        let git_dir = output_dir.join(".git");
        let fetcher = Fetcher::new(base, &git_dir)?;
        Ok(Self {
            fetcher,
            store: DiskStore::new(git_dir),
            summary: Summary::new(output_dir.clone()),
            output_dir,
            resolver,
            worklist: VecDeque::new(),
            head_ref: String::new(),
            head_commit: None,
            pack_info_available: false,
        })
    }

    /// Runs the full recovery and returns its summary.
    ///
    /// Fails with [`RecoverError::NotVulnerable`] when the target does
    /// not serve a usable `HEAD`, and propagates failures of the other
    /// bootstrap fetch (`config`). Everything after bootstrap degrades
    /// the summary instead of failing.
    pub fn run(mut self) -> Result<Summary> {
        self.check_vulnerable()?;
        self.fetch_config()?;
        self.resolve_head_target();
        self.probe_well_known();
        self.walk();
        self.recover_packs();
        self.reconcile_missing();

        self.summary.pack_information_available = self.pack_info_available;
        self.summary.status =
            Status::classify(&self.summary.found_objects, &self.summary.missing_objects);

        self.materialize();
        Ok(self.summary)
    }

    /// Confirms the target exposes `.git` by fetching `HEAD`, which must
    /// be a symbolic reference line.
    fn check_vulnerable(&mut self) -> Result<()> {
        let content = match self.fetcher.fetch("HEAD") {
            Ok(FetchOutcome::Retrieved(content)) => content,
            Ok(FetchOutcome::AlreadyRequested) | Err(_) => {
                return Err(RecoverError::NotVulnerable)
            }
        };
        let text = String::from_utf8_lossy(&content);
        let Some(target) = text.strip_prefix("ref: ") else {
            return Err(RecoverError::NotVulnerable);
        };
        let target = target.trim();
        // A symbolic ref must name a path; an empty target would make
        // resolution fetch the `.git/` base itself.
        if target.is_empty() {
            return Err(RecoverError::NotVulnerable);
        }
        self.head_ref = target.to_string();
        debug!(head_ref = %self.head_ref, "target is vulnerable");
        Ok(())
    }

    /// Fetches and parses the repository configuration. Without it the
    /// repository name and remote/branch enumeration are unavailable, so
    /// failure here is fatal.
    fn fetch_config(&mut self) -> Result<()> {
        match self.fetcher.fetch("config")? {
            FetchOutcome::Retrieved(content) => {
                self.summary.config = RepoConfig::parse(&content);
                Ok(())
            }
            FetchOutcome::AlreadyRequested => {
                Err(RecoverError::Config("config already consumed".to_string()))
            }
        }
    }

    /// Resolves `HEAD`'s target reference to a commit identifier. The
    /// reference file is commonly absent when the ref is packed; that is
    /// tolerated and resolution continues via packed-refs probing.
    fn resolve_head_target(&mut self) {
        let head_ref = self.head_ref.clone();
        match self.fetcher.fetch(&head_ref) {
            Ok(FetchOutcome::Retrieved(content)) => {
                if let Some(id) = parse_ref_content(&content) {
                    self.head_commit = Some(id);
                    self.worklist.push_back(id);
                } else {
                    debug!(path = %head_ref, "reference does not contain an object id");
                }
            }
            Ok(FetchOutcome::AlreadyRequested) => {}
            Err(e) => {
                debug!(path = %head_ref, error = %e, "HEAD target absent, likely packed");
            }
        }
    }

    /// Probes the conventional well-known paths; whatever is retrieved is
    /// mirrored, and reference-bearing files seed the worklist.
    fn probe_well_known(&mut self) {
        for path in PROBE_PATHS.iter().copied() {
            match self.fetcher.fetch(path) {
                Ok(FetchOutcome::Retrieved(content)) => self.route_probe(path, &content),
                Ok(FetchOutcome::AlreadyRequested) => {}
                Err(e) => debug!(path, error = %e, "probe failed"),
            }
        }
    }

    fn route_probe(&mut self, path: &str, content: &Bytes) {
        // Branch heads and the stash hold a single object id.
        if path.starts_with("refs/") {
            if let Some(id) = parse_ref_content(content) {
                self.worklist.push_back(id);
            }
            return;
        }
        match path {
            "packed-refs" => {
                for (id, name) in parse_packed_refs(content) {
                    if name == self.head_ref && self.head_commit.is_none() {
                        self.head_commit = Some(id);
                    }
                    self.worklist.push_back(id);
                }
            }
            "info/refs" => {
                for (id, name) in parse_info_refs(content) {
                    if name == self.head_ref && self.head_commit.is_none() {
                        self.head_commit = Some(id);
                    }
                    self.worklist.push_back(id);
                }
            }
            "objects/info/packs" => self.handle_pack_index(content),
            _ => {}
        }
    }

    /// Drains the worklist, requesting each object at most once and
    /// expanding commits and trees into further identifiers.
    fn walk(&mut self) {
        while let Some(id) = self.worklist.pop_front() {
            match self.fetcher.fetch(&id.loose_path()) {
                Ok(FetchOutcome::Retrieved(_)) => {
                    self.summary.found_objects.insert(id);
                    self.expand(id);
                }
                // Reached through a second graph edge; the first request
                // already recorded the outcome.
                Ok(FetchOutcome::AlreadyRequested) => {}
                Err(e) => {
                    debug!(object = %id, error = %e, "object is missing and likely packed");
                    self.summary.missing_objects.insert(id);
                }
            }
        }
    }

    /// Classifies a retrieved object and queues its outgoing edges.
    /// Decode failures demote the object to missing; they never abort the
    /// run.
    fn expand(&mut self, id: ObjectId) {
        let object_type = match self.store.classify(&id) {
            Ok(object_type) => object_type,
            Err(e) => {
                debug!(object = %id, error = %e, "retrieved object failed to decode");
                self.summary.found_objects.remove(&id);
                self.summary.missing_objects.insert(id);
                return;
            }
        };

        let expansion = match object_type {
            ObjectType::Commit => self.store.read_commit(&id).map(|commit| {
                let mut ids: Vec<ObjectId> = commit.tree.into_iter().collect();
                ids.extend(commit.parents);
                ids
            }),
            ObjectType::Tree => self.store.read_tree(&id).map(|tree| tree.child_ids()),
            // Blobs and tags terminate the branch.
            ObjectType::Blob | ObjectType::Tag => {
                debug!(object = %id, kind = object_type.as_str(), "retrieved leaf object");
                return;
            }
        };

        match expansion {
            Ok(ids) => {
                debug!(object = %id, kind = object_type.as_str(), edges = ids.len(), "retrieved object");
                self.worklist.extend(ids);
            }
            Err(e) => {
                debug!(object = %id, error = %e, "retrieved object failed to decode");
                self.summary.found_objects.remove(&id);
                self.summary.missing_objects.insert(id);
            }
        }
    }

    /// Best-effort pack discovery: the `objects/pack/` directory listing
    /// and the `objects/info/packs` index. Absence of both is recorded as
    /// a capability flag, not a failure.
    fn recover_packs(&mut self) {
        match self.fetcher.fetch("objects/pack/") {
            Ok(FetchOutcome::Retrieved(content)) => {
                self.pack_info_available = true;
                for name in scan_listing(&content) {
                    self.download_pack(&format!("objects/pack/{name}"));
                }
            }
            Ok(FetchOutcome::AlreadyRequested) => {}
            Err(e) => debug!(error = %e, "pack directory listing unavailable"),
        }

        match self.fetcher.fetch("objects/info/packs") {
            Ok(FetchOutcome::Retrieved(content)) => self.handle_pack_index(&content),
            // Already consumed during probing; the flag is set there.
            Ok(FetchOutcome::AlreadyRequested) => {}
            Err(e) => debug!(error = %e, "pack index unavailable"),
        }

        if !self.pack_info_available {
            warn!("no archive index available - some objects may be missing");
        }
    }

    fn handle_pack_index(&mut self, content: &Bytes) {
        self.pack_info_available = true;
        for name in parse_pack_index(content) {
            self.download_pack(&format!("objects/pack/{name}"));
        }
    }

    /// Downloads one pack archive and hands it to the external resolver.
    fn download_pack(&mut self, path: &str) {
        match self.fetcher.fetch(path) {
            Ok(FetchOutcome::Retrieved(_)) => {}
            Ok(FetchOutcome::AlreadyRequested) => return,
            Err(e) => {
                debug!(path, error = %e, "failed to retrieve pack file");
                return;
            }
        }
        let pack_path = self.fetcher.local_path(path);
        match self.resolver.resolve(&pack_path, &self.output_dir) {
            Ok(ids) => {
                debug!(path, objects = ids.len(), "resolved pack archive");
                for id in ids {
                    if self.summary.missing_objects.remove(&id) {
                        self.summary.found_objects.insert(id);
                    }
                }
            }
            Err(e) => warn!(path, error = %e, "pack resolution failed"),
        }
    }

    /// Moves identifiers out of the missing set when pack resolution made
    /// them available on disk. Presence alone is not enough: the object
    /// must also decode, so a corrupt file cannot re-enter the found set.
    /// An identifier ends up in at most one of the two sets.
    fn reconcile_missing(&mut self) {
        let recovered: Vec<ObjectId> = self
            .summary
            .missing_objects
            .iter()
            .filter(|id| self.store.contains(id) && self.store.classify(id).is_ok())
            .copied()
            .collect();
        for id in recovered {
            self.summary.missing_objects.remove(&id);
            self.summary.found_objects.insert(id);
        }
    }

    /// Reconstructs the working tree from the resolved HEAD commit. Any
    /// failure here only downgrades the status, never raises an error.
    fn materialize(&mut self) {
        let Some(commit_id) = self.head_commit else {
            warn!("HEAD commit was never resolved; skipping working-tree reconstruction");
            self.summary.status.downgrade_to(Status::PartialSuccess);
            return;
        };
        let materializer = Materializer::new(&self.store, &self.output_dir);
        if let Err(e) = materializer.materialize(&commit_id) {
            warn!(commit = %commit_id, error = %e, "working-tree reconstruction failed");
            self.summary.status.downgrade_to(Status::PartialSuccess);
        }
    }
}

/// Parses the content of a loose reference file: a single object id.
/// Symbolic references and anything else yield `None`.
fn parse_ref_content(content: &[u8]) -> Option<ObjectId> {
    ObjectId::from_hex(String::from_utf8_lossy(content).trim()).ok()
}

/// Parses `packed-refs` lines: `<id> <refname>`, with `#` comment lines
/// and `^` peel lines skipped.
fn parse_packed_refs(content: &[u8]) -> Vec<(ObjectId, String)> {
    String::from_utf8_lossy(content)
        .lines()
        .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
        .filter_map(|line| {
            let (hex, name) = line.trim().split_once(' ')?;
            Some((ObjectId::from_hex(hex).ok()?, name.trim().to_string()))
        })
        .collect()
}

/// Parses dumb-HTTP `info/refs` lines: `<id>\t<refname>`.
fn parse_info_refs(content: &[u8]) -> Vec<(ObjectId, String)> {
    String::from_utf8_lossy(content)
        .lines()
        .filter_map(|line| {
            let (hex, name) = line.trim().split_once('\t')?;
            Some((ObjectId::from_hex(hex).ok()?, name.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "ce013625030ba8dba906f756967f9e9ca394464a";

    #[test]
    fn test_parse_ref_content() {
        let id = parse_ref_content(format!("{ID}\n").as_bytes()).unwrap();
        assert_eq!(id.to_hex(), ID);
        assert!(parse_ref_content(b"ref: refs/heads/main\n").is_none());
        assert!(parse_ref_content(b"").is_none());
    }

    #[test]
    fn test_parse_packed_refs() {
        let raw = format!(
            "# pack-refs with: peeled fully-peeled sorted\n{ID} refs/heads/main\n^{ID}\n"
        );
        let refs = parse_packed_refs(raw.as_bytes());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].0.to_hex(), ID);
        assert_eq!(refs[0].1, "refs/heads/main");
    }

    #[test]
    fn test_parse_info_refs() {
        let raw = format!("{ID}\trefs/heads/main\ngarbage line\n");
        let refs = parse_info_refs(raw.as_bytes());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].1, "refs/heads/main");
    }
}
