//! Pack archive discovery and resolution.
//!
//! Packed objects are invisible to loose-object traversal; this module
//! finds pack archives (directory listing and/or `objects/info/packs`)
//! and hands them to an external resolver that makes their objects
//! available as loose files.

use crate::{RecoverError, Result};
use gitrip_object::{DiskStore, ObjectId};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

/// Matches pack archive filenames wherever they appear in listing HTML,
/// e.g. `href="pack-5b89658fae4313c1e25d629bfa95f809c77ff949.pack"`.
static PACK_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(pack-[0-9a-f]{40}\.pack)").expect("Invalid regex"));

/// Extracts pack filenames from a `objects/pack/` directory listing.
pub fn scan_listing(listing: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(listing);
    let mut names: Vec<String> = PACK_NAME_REGEX
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Extracts pack filenames from an `objects/info/packs` index.
///
/// The index is a sequence of `P <filename>` lines.
pub fn parse_pack_index(index: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(index)
        .lines()
        .filter_map(|line| {
            let mut parts = line.trim().split(' ');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("P"), Some(name), None) => Some(name.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// External pack-format resolver.
///
/// The core engine never decodes delta compression itself: it hands a
/// downloaded archive to a resolver and gets back the identifiers now
/// available as loose objects. Any conforming implementation is
/// substitutable.
pub trait PackResolver {
    /// Unpacks `pack_path` into the repository at `output_dir` and
    /// returns the object identifiers now present in its object store.
    fn resolve(&self, pack_path: &Path, output_dir: &Path) -> Result<BTreeSet<ObjectId>>;
}

/// Default resolver shelling out to `git unpack-objects`.
///
/// `git unpack-objects` does not report what it extracted, so the id set
/// is taken from the loose object directory afterwards; over-reporting
/// ids that were already present is harmless, since callers only use the
/// set to reconcile what they were missing.
#[derive(Debug, Default)]
pub struct GitUnpack;

impl PackResolver for GitUnpack {
    fn resolve(&self, pack_path: &Path, output_dir: &Path) -> Result<BTreeSet<ObjectId>> {
        let pack = File::open(pack_path)?;
        let status = Command::new("git")
            .arg("unpack-objects")
            .arg("-q")
            .current_dir(output_dir)
            .stdin(Stdio::from(pack))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| RecoverError::PackResolver(format!("failed to run git: {e}")))?;
        if !status.success() {
            return Err(RecoverError::PackResolver(format!(
                "git unpack-objects exited with {status} for {}",
                pack_path.display()
            )));
        }

        let store = DiskStore::new(output_dir.join(".git"));
        Ok(store.list_loose().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_listing_finds_hrefs() {
        let listing = br#"<html><a href="pack-5b89658fae4313c1e25d629bfa95f809c77ff949.pack">x</a>
<a href='pack-5b89658fae4313c1e25d629bfa95f809c77ff949.idx'>y</a></html>"#;
        assert_eq!(
            scan_listing(listing),
            vec!["pack-5b89658fae4313c1e25d629bfa95f809c77ff949.pack".to_string()]
        );
    }

    #[test]
    fn test_scan_listing_dedupes() {
        let listing = b"pack-5b89658fae4313c1e25d629bfa95f809c77ff949.pack pack-5b89658fae4313c1e25d629bfa95f809c77ff949.pack";
        assert_eq!(scan_listing(listing).len(), 1);
    }

    #[test]
    fn test_scan_listing_rejects_bad_names() {
        assert!(scan_listing(b"pack-short.pack pack-ZZ89658fae4313c1e25d629bfa95f809c77ff949.pack").is_empty());
    }

    #[test]
    fn test_parse_pack_index() {
        let index = b"P pack-5b89658fae4313c1e25d629bfa95f809c77ff949.pack\n\nP second.pack\nX other\n";
        assert_eq!(
            parse_pack_index(index),
            vec![
                "pack-5b89658fae4313c1e25d629bfa95f809c77ff949.pack".to_string(),
                "second.pack".to_string(),
            ]
        );
    }
}
