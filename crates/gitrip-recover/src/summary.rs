//! Run outcome aggregation.

use crate::RepoConfig;
use gitrip_object::ObjectId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Overall outcome of a recovery run.
///
/// Ordered worst-to-best so that post-run failures can only ever move the
/// status downward (see [`Status::downgrade_to`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Status {
    /// Pre-run default, never reported.
    Unknown,
    /// Nothing was retrieved.
    Failure,
    /// Some referenced objects could not be retrieved.
    PartialSuccess,
    /// Every referenced object was retrieved.
    Success,
}

impl Status {
    /// Classifies the found/missing partition.
    pub fn classify(found: &BTreeSet<ObjectId>, missing: &BTreeSet<ObjectId>) -> Self {
        if found.is_empty() {
            Status::Failure
        } else if !missing.is_empty() {
            Status::PartialSuccess
        } else {
            Status::Success
        }
    }

    /// Lowers the status to `floor` if it is currently better; never
    /// raises it.
    pub fn downgrade_to(&mut self, floor: Status) {
        if *self > floor {
            *self = floor;
        }
    }
}

/// Summary of one recovery run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Whether any pack listing or index was reachable.
    pub pack_information_available: bool,
    /// Objects retrieved, loose over HTTP or unpacked from an archive.
    pub found_objects: BTreeSet<ObjectId>,
    /// Objects referenced by the graph but never retrieved.
    pub missing_objects: BTreeSet<ObjectId>,
    /// Final status.
    pub status: Status,
    /// Directory the repository was reconstructed into.
    pub output_directory: PathBuf,
    /// Parsed repository configuration.
    pub config: RepoConfig,
}

impl Summary {
    /// Creates an empty summary for a run writing into `output_directory`.
    pub fn new(output_directory: PathBuf) -> Self {
        Self {
            pack_information_available: false,
            found_objects: BTreeSet::new(),
            missing_objects: BTreeSet::new(),
            status: Status::Unknown,
            output_directory,
            config: RepoConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(seeds: &[u8]) -> BTreeSet<ObjectId> {
        seeds
            .iter()
            .map(|&s| ObjectId::from_bytes([s; 20]))
            .collect()
    }

    #[test]
    fn test_status_law() {
        assert_eq!(Status::classify(&ids(&[]), &ids(&[])), Status::Failure);
        assert_eq!(Status::classify(&ids(&[]), &ids(&[1])), Status::Failure);
        assert_eq!(
            Status::classify(&ids(&[1]), &ids(&[2])),
            Status::PartialSuccess
        );
        assert_eq!(Status::classify(&ids(&[1]), &ids(&[])), Status::Success);
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let mut summary = Summary::new(PathBuf::from("/tmp/out"));
        summary.found_objects = ids(&[1]);
        summary.status = Status::Success;

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"status\":\"Success\""));
        assert!(json.contains(&ObjectId::from_bytes([1u8; 20]).to_hex()));
    }

    #[test]
    fn test_downgrade_only_lowers() {
        let mut status = Status::Success;
        status.downgrade_to(Status::PartialSuccess);
        assert_eq!(status, Status::PartialSuccess);

        let mut status = Status::Failure;
        status.downgrade_to(Status::PartialSuccess);
        assert_eq!(status, Status::Failure);
    }
}
