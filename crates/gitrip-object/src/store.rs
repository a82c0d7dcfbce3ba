//! Read-only view over a recovered loose object directory.

use crate::{Commit, LooseObject, ObjectError, ObjectId, ObjectType, Result, Tree};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Content-addressed store over `<git_dir>/objects`.
///
/// The directory is populated externally (by mirrored HTTP fetches and by
/// pack unpacking); this type only reads. The repository being recovered
/// is untrusted, so every read re-hashes the object and rejects content
/// that does not match its identifier.
#[derive(Debug, Clone)]
pub struct DiskStore {
    git_dir: PathBuf,
}

impl DiskStore {
    /// Creates a store rooted at a `.git` directory.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    /// Returns the `.git` directory this store reads from.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.git_dir.join(id.loose_path())
    }

    /// Returns true if the object is present as a loose file.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).is_file()
    }

    /// Reads and decodes a loose object, verifying its identifier.
    pub fn read(&self, id: &ObjectId) -> Result<LooseObject> {
        let path = self.object_path(id);
        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ObjectError::NotFound(id.to_hex()));
            }
            Err(e) => return Err(e.into()),
        };
        let object = LooseObject::decode(&compressed)?;
        let actual = ObjectId::hash_object(object.object_type, &object.data);
        if actual != *id {
            warn!(expected = %id, actual = %actual, "object content does not match its identifier");
            return Err(ObjectError::Corruption(format!(
                "{} hashes to {}",
                id, actual
            )));
        }
        Ok(object)
    }

    /// Classifies an object without keeping its payload.
    pub fn classify(&self, id: &ObjectId) -> Result<ObjectType> {
        Ok(self.read(id)?.object_type)
    }

    /// Reads an object and parses it as a commit.
    pub fn read_commit(&self, id: &ObjectId) -> Result<Commit> {
        let object = self.read(id)?;
        if object.object_type != ObjectType::Commit {
            return Err(ObjectError::InvalidObject(format!(
                "{} is a {}, not a commit",
                id,
                object.object_type.as_str()
            )));
        }
        Commit::parse(&object.data)
    }

    /// Reads an object and parses it as a tree.
    pub fn read_tree(&self, id: &ObjectId) -> Result<Tree> {
        let object = self.read(id)?;
        if object.object_type != ObjectType::Tree {
            return Err(ObjectError::InvalidObject(format!(
                "{} is a {}, not a tree",
                id,
                object.object_type.as_str()
            )));
        }
        Tree::parse(&object.data)
    }

    /// Lists every loose object identifier currently on disk.
    ///
    /// Used to reconcile pack-resolver output: whatever was unpacked shows
    /// up here.
    pub fn list_loose(&self) -> Vec<ObjectId> {
        let mut ids = Vec::new();
        let objects_dir = self.git_dir.join("objects");
        let Ok(fanout) = fs::read_dir(&objects_dir) else {
            return ids;
        };
        for dir in fanout.flatten() {
            let prefix = dir.file_name();
            let Some(prefix) = prefix.to_str() else {
                continue;
            };
            if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
                continue;
            }
            let Ok(files) = fs::read_dir(dir.path()) else {
                continue;
            };
            for file in files.flatten() {
                if let Some(rest) = file.file_name().to_str() {
                    if let Ok(id) = ObjectId::from_hex(&format!("{prefix}{rest}")) {
                        ids.push(id);
                    }
                }
            }
        }
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_loose(git_dir: &Path, object_type: ObjectType, payload: &[u8]) -> ObjectId {
        let id = ObjectId::hash_object(object_type, payload);
        let mut raw = format!("{} {}\0", object_type.as_str(), payload.len()).into_bytes();
        raw.extend_from_slice(payload);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let compressed = encoder.finish().unwrap();
        let path = git_dir.join(id.loose_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, compressed).unwrap();
        id
    }

    #[test]
    fn test_read_and_classify() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let id = write_loose(dir.path(), ObjectType::Blob, b"content\n");

        assert!(store.contains(&id));
        assert_eq!(store.classify(&id).unwrap(), ObjectType::Blob);
        assert_eq!(store.read(&id).unwrap().data.as_ref(), b"content\n");
    }

    #[test]
    fn test_absent_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let id = ObjectId::from_bytes([0x11u8; 20]);
        assert!(!store.contains(&id));
        assert!(matches!(store.read(&id), Err(ObjectError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_object_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let id = write_loose(dir.path(), ObjectType::Blob, b"original");

        // Overwrite with a valid loose object that hashes differently.
        let other = write_loose(dir.path(), ObjectType::Blob, b"tampered");
        fs::copy(
            dir.path().join(other.loose_path()),
            dir.path().join(id.loose_path()),
        )
        .unwrap();

        assert!(matches!(store.read(&id), Err(ObjectError::Corruption(_))));
    }

    #[test]
    fn test_read_commit_rejects_other_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let id = write_loose(dir.path(), ObjectType::Blob, b"not a commit");
        assert!(store.read_commit(&id).is_err());
    }

    #[test]
    fn test_list_loose() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let a = write_loose(dir.path(), ObjectType::Blob, b"a");
        let b = write_loose(dir.path(), ObjectType::Blob, b"b");

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(store.list_loose(), expected);
    }
}
