//! Per-tree version allocation.

use crate::helpers::backend::SnapshotBackend;
use crate::types::VersionTag;
use crate::SnapError;

/// Existing version numbers of `tree`, ascending.
///
/// Only tags matching `<tree>/v<digits>` exactly are counted.
pub fn versions(backend: &dyn SnapshotBackend, tree: &str) -> Result<Vec<u64>, SnapError> {
    let mut found: Vec<u64> = backend
        .list_tags(&VersionTag::pattern_for(tree))?
        .iter()
        .filter_map(|entry| VersionTag::parse_for(tree, &entry.name))
        .collect();
    found.sort_unstable();
    found.dedup();
    Ok(found)
}

/// Highest existing version of `tree`, if any.
pub fn latest_version(backend: &dyn SnapshotBackend, tree: &str) -> Result<Option<u64>, SnapError> {
    Ok(versions(backend, tree)?.last().copied())
}

/// Version the next snapshot of `tree` gets: highest existing plus one.
///
/// Deleted versions are never reused; gaps are kept.
pub fn next_version(backend: &dyn SnapshotBackend, tree: &str) -> Result<u64, SnapError> {
    Ok(latest_version(backend, tree)?.unwrap_or(0) + 1)
}
