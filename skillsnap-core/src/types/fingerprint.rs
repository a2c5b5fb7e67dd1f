//! File fingerprints and the persisted hash cache record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-file fingerprint: content hash plus the stat data used for the fast path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    /// SHA-256 of the file contents, lowercase hex.
    pub hash: String,
    /// Modification time, nanoseconds since the Unix epoch.
    pub mtime_ns: u64,
    /// Size in bytes.
    pub size: u64,
}

/// Fingerprints of one tree, keyed by forward-slash relative path.
///
/// The map key makes relative paths unique within a tree.
pub type FingerprintSet = BTreeMap<String, FileFingerprint>;

/// Hash cache file for one tree, stored as `<tree>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Format version; records with any other version are treated as absent.
    pub cache_version: String,
    /// When the fingerprints were last recomputed after a save.
    pub last_backup: DateTime<Utc>,
    /// Fingerprints of every file that was committed.
    pub files: FingerprintSet,
}

impl CacheRecord {
    /// Create a record stamped with the current time.
    pub fn new(cache_version: impl Into<String>, files: FingerprintSet) -> Self {
        Self {
            cache_version: cache_version.into(),
            last_backup: Utc::now(),
            files,
        }
    }
}

/// Hashes only, for comparing two fingerprint sets by content.
pub fn content_map(files: &FingerprintSet) -> BTreeMap<&str, &str> {
    files
        .iter()
        .map(|(path, fp)| (path.as_str(), fp.hash.as_str()))
        .collect()
}
