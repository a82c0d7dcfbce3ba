//! Commit payload parsing.

use crate::{ObjectId, Result};

/// The graph-relevant parts of a commit: its tree and parents.
///
/// Author, committer and message lines are skipped; traversal only needs
/// the outgoing edges.
#[derive(Debug, Clone, Default)]
pub struct Commit {
    /// The root tree of this commit, when the header carries one.
    pub tree: Option<ObjectId>,
    /// Parent commits, in declaration order.
    pub parents: Vec<ObjectId>,
}

impl Commit {
    /// Parses a commit payload (the loose object data, header stripped).
    ///
    /// A commit header is a sequence of `key value` lines terminated by a
    /// blank line; `tree` and `parent` lines carry object identifiers.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut commit = Commit::default();
        let text = String::from_utf8_lossy(payload);
        for line in text.lines() {
            if line.is_empty() {
                // End of header, start of message.
                break;
            }
            let mut words = line.splitn(2, ' ');
            let key = words.next().unwrap_or_default();
            let value = words.next().unwrap_or_default();
            match key {
                "tree" => commit.tree = Some(ObjectId::from_hex(value.trim())?),
                "parent" => commit.parents.push(ObjectId::from_hex(value.trim())?),
                _ => {}
            }
        }
        Ok(commit)
    }
}
