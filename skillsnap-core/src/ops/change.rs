//! Change detection against the hash cache.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::helpers::cache::LoadedCache;
use crate::helpers::hash::get_file_hash;
use crate::helpers::ignore::{walk_tree, IgnoreRules};
use crate::ops::workspace::Workspace;
use crate::types::{content_map, CacheRecord, FileFingerprint, FingerprintSet};
use crate::SnapError;
use std::path::Path;

/// Whether the live tree `name` differs from its last snapshot.
///
/// A tree that was never snapshotted, or whose cache is absent or of another
/// format version, is always reported as changed. Otherwise cached hashes are
/// reused for files whose mtime and size are unchanged and the rest are
/// re-hashed. Read-only.
pub fn has_changes(ws: &Workspace, name: &str) -> Result<bool, SnapError> {
    ws.require_tree(name)?;

    if !ws.backend().has_tree(name) {
        log::debug!("{}: no prior snapshot", name);
        return Ok(true);
    }

    let Some(cached) = ws.cache().load(name) else {
        log::debug!("{}: no usable cache", name);
        return Ok(true);
    };

    let root = ws.layout().tree_dir(name);
    let live = fingerprint_tree(&root, &ws.config().ignore, Some(&cached))?;
    let changed = content_map(&live) != content_map(&cached.record.files);
    log::debug!("{}: {} files, changed={}", name, live.len(), changed);
    Ok(changed)
}

/// Fingerprint every file of a tree.
///
/// With `reuse`, a cached hash is taken over when the file's mtime and size
/// match the cached entry and the file is strictly older than the cache
/// file itself. Files touched in the same tick as the cache write are always
/// re-hashed.
pub fn fingerprint_tree(
    root: &Path,
    rules: &IgnoreRules,
    reuse: Option<&LoadedCache>,
) -> Result<FingerprintSet, SnapError> {
    let cutoff = reuse.and_then(|c| c.written_at).and_then(system_time_ns);
    let mut set = FingerprintSet::new();
    let mut rehashed = 0usize;

    for file in walk_tree(root, rules)? {
        let cached = match (reuse, cutoff) {
            (Some(cache), Some(cutoff)) => cache
                .record
                .files
                .get(&file.rel_path)
                .filter(|fp| fp.mtime_ns == file.mtime_ns && fp.size == file.size)
                .filter(|_| file.mtime_ns < cutoff),
            _ => None,
        };

        let hash = match cached {
            Some(fp) => fp.hash.clone(),
            None => {
                rehashed += 1;
                get_file_hash(&file.path)?
            }
        };

        set.insert(
            file.rel_path,
            FileFingerprint {
                hash,
                mtime_ns: file.mtime_ns,
                size: file.size,
            },
        );
    }

    log::debug!("fingerprinted {} ({} files, {} hashed)", root.display(), set.len(), rehashed);
    Ok(set)
}

/// Recompute the fingerprints of `name` from scratch and persist them.
pub fn update_cache_after_save(ws: &Workspace, name: &str) -> Result<CacheRecord, SnapError> {
    let root = ws.layout().tree_dir(name);
    let files = fingerprint_tree(&root, &ws.config().ignore, None)?;
    ws.cache().save(name, files)
}

/// Refresh the cache after a save; a failure only costs a rescan next time.
pub(crate) fn refresh_cache(ws: &Workspace, name: &str) {
    if let Err(e) = update_cache_after_save(ws, name) {
        log::warn!("failed to update hash cache for '{}': {}", name, e);
    }
}

fn system_time_ns(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_nanos() as u64)
}
