//! Tree payload parsing.
//!
//! Tree payloads are binary: `<mode ascii> SP <name bytes> NUL <20-byte id>`
//! repeated. Entry names are arbitrary bytes and may contain spaces or
//! tabs, so the decoder works on the raw layout and never splits on
//! whitespace.

use crate::{ObjectError, ObjectId, Result};
use bytes::Bytes;

/// A single tree entry.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// The file mode, e.g. "100644" for a regular file or "40000" for a
    /// subdirectory.
    pub mode: String,
    /// The entry name, raw bytes as stored.
    pub name: Bytes,
    /// The referenced object.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Returns true if this entry points at a subdirectory.
    pub fn is_dir(&self) -> bool {
        self.mode == "40000" || self.mode == "040000"
    }
}

/// A decoded tree object.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    /// Entries in the order they appear in the payload.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Parses a tree payload (the loose object data, header stripped).
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut entries = Vec::new();
        let mut rest = payload;
        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|&b| b == b' ')
                .ok_or_else(|| ObjectError::InvalidObject("tree entry missing mode".into()))?;
            let mode = String::from_utf8_lossy(&rest[..space]).into_owned();
            rest = &rest[space + 1..];

            let null = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| ObjectError::InvalidObject("tree entry missing name".into()))?;
            let name = Bytes::from(rest[..null].to_vec());
            rest = &rest[null + 1..];

            if rest.len() < 20 {
                return Err(ObjectError::InvalidObject(
                    "tree entry truncated identifier".into(),
                ));
            }
            let mut raw = [0u8; 20];
            raw.copy_from_slice(&rest[..20]);
            rest = &rest[20..];

            entries.push(TreeEntry {
                mode,
                name,
                id: ObjectId::from_bytes(raw),
            });
        }
        Ok(Self { entries })
    }

    /// Returns the identifiers of all entries, in payload order.
    pub fn child_ids(&self) -> Vec<ObjectId> {
        self.entries.iter().map(|e| e.id).collect()
    }
}
