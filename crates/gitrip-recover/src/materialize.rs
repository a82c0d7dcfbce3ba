//! Working-tree reconstruction.

use crate::Result;
use gitrip_object::{DiskStore, ObjectError, ObjectId};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Rebuilds working-tree files from a resolved commit.
///
/// Subtrees and blobs that were never recovered are skipped; a partial
/// checkout is the expected outcome for repositories with unreachable
/// packed objects. Only filesystem failures surface as errors.
pub struct Materializer<'a> {
    store: &'a DiskStore,
    output_dir: &'a Path,
}

impl<'a> Materializer<'a> {
    /// Creates a materializer writing beneath `output_dir`.
    pub fn new(store: &'a DiskStore, output_dir: &'a Path) -> Self {
        Self { store, output_dir }
    }

    /// Writes the files of `commit_id`'s tree under the output directory.
    pub fn materialize(&self, commit_id: &ObjectId) -> Result<()> {
        let commit = self.store.read_commit(commit_id)?;
        let Some(tree_id) = commit.tree else {
            debug!(commit = %commit_id, "commit has no tree to materialize");
            return Ok(());
        };
        self.write_tree(self.output_dir, &tree_id)
    }

    fn write_tree(&self, dir: &Path, tree_id: &ObjectId) -> Result<()> {
        let tree = match self.store.read_tree(tree_id) {
            Ok(tree) => tree,
            Err(e) => {
                debug!(tree = %tree_id, error = %e, "skipping unresolved subtree");
                return Ok(());
            }
        };

        for entry in &tree.entries {
            let Some(name) = safe_name(&entry.name) else {
                debug!(tree = %tree_id, "skipping entry with unusable name");
                continue;
            };
            let path = dir.join(&name);

            if entry.is_dir() {
                fs::create_dir_all(&path)?;
                self.write_tree(&path, &entry.id)?;
                continue;
            }

            let blob = match self.store.read(&entry.id) {
                Ok(blob) => blob,
                Err(ObjectError::NotFound(_)) => {
                    debug!(blob = %entry.id, "skipping missing blob");
                    continue;
                }
                Err(e) => {
                    debug!(blob = %entry.id, error = %e, "skipping undecodable blob");
                    continue;
                }
            };

            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &blob.data)?;
        }

        Ok(())
    }
}

/// Decodes a tree entry name for local use, refusing names that could
/// escape the output directory.
fn safe_name(raw: &[u8]) -> Option<String> {
    let name = String::from_utf8_lossy(raw).into_owned();
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return None;
    }
    Some(name)
}
