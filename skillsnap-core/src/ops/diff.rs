//! Compare a snapshot against the live tree.

use fs_err as fs;
use serde::Serialize;
use similar::TextDiff;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::helpers::ignore::{walk_tree, IgnoreRules};
use crate::ops::version::latest_version;
use crate::ops::workspace::{validate_name, Workspace};
use crate::types::VersionTag;
use crate::SnapError;

/// Lines of context around each change.
pub const CONTEXT_LINES: usize = 3;

/// One path that differs between snapshot and live tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiffEntry {
    /// Present live, absent in the snapshot.
    Added { path: String },
    /// Present in the snapshot, absent live.
    Removed { path: String },
    /// Present on both sides with different text.
    Modified { path: String, unified: String },
    /// Present on both sides with different bytes that could not be compared as text.
    Unreadable { path: String, error: String },
}

impl DiffEntry {
    pub fn path(&self) -> &str {
        match self {
            DiffEntry::Added { path }
            | DiffEntry::Removed { path }
            | DiffEntry::Modified { path, .. }
            | DiffEntry::Unreadable { path, .. } => path,
        }
    }

    /// Status word used in human output.
    pub fn label(&self) -> &'static str {
        match self {
            DiffEntry::Added { .. } => "Added",
            DiffEntry::Removed { .. } => "Removed",
            DiffEntry::Modified { .. } => "Modified",
            DiffEntry::Unreadable { .. } => "Unreadable",
        }
    }
}

/// Differences between a snapshot and the live tree, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// The snapshot compared against.
    pub tag: VersionTag,
    /// Differing paths; identical files are omitted.
    pub entries: Vec<DiffEntry>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Diff the live tree `name` against `version`, or against its latest
/// version when `version` is `None`.
///
/// Read-only; no lock is taken. The snapshot is materialized into a
/// temporary directory that is removed when the comparison ends.
pub fn diff(ws: &Workspace, name: &str, version: Option<&str>) -> Result<DiffReport, SnapError> {
    validate_name(name)?;
    ws.require_initialized()?;
    ws.require_tree(name)?;

    let backend = ws.backend();
    if let Err(e) = backend.fetch_tags() {
        log::warn!("could not fetch tags, using local tags: {}", e);
    }

    let tag = match version {
        Some(input) => {
            let tag = VersionTag::resolve(name, input)?;
            if !backend.tag_exists(&tag)? {
                return Err(SnapError::not_found(format!("Version {} not found", tag)));
            }
            tag
        }
        None => {
            let latest = latest_version(backend, name)?
                .ok_or_else(|| SnapError::not_found(format!("No snapshots found for {}", name)))?;
            VersionTag::new(name, latest)
        }
    };

    let scratch = tempfile::Builder::new().prefix("skillsnap-diff-").tempdir()?;
    let snapshot = scratch.path().join(name);
    backend.materialize(&tag, &snapshot)?;

    let entries = compare_trees(&snapshot, &ws.layout().tree_dir(name), &ws.config().ignore)?;
    log::debug!("diff {}: {} differing paths", tag, entries.len());
    Ok(DiffReport { tag, entries })
}

/// Classify every path of `snapshot` and `live` under the ignore rules.
pub fn compare_trees(
    snapshot: &Path,
    live: &Path,
    rules: &IgnoreRules,
) -> Result<Vec<DiffEntry>, SnapError> {
    let old = files_of(snapshot, rules)?;
    let new = files_of(live, rules)?;

    let mut paths: Vec<&String> = old.keys().chain(new.keys()).collect();
    paths.sort();
    paths.dedup();

    let mut entries = Vec::new();
    for rel in paths {
        let entry = match (old.get(rel), new.get(rel)) {
            (Some(_), None) => Some(DiffEntry::Removed { path: rel.clone() }),
            (None, Some(_)) => Some(DiffEntry::Added { path: rel.clone() }),
            (Some(a), Some(b)) => compare_file(rel, a, b),
            (None, None) => None,
        };
        entries.extend(entry);
    }
    Ok(entries)
}

fn files_of(root: &Path, rules: &IgnoreRules) -> Result<BTreeMap<String, PathBuf>, SnapError> {
    if !root.exists() {
        return Ok(BTreeMap::new());
    }
    Ok(walk_tree(root, rules)?
        .into_iter()
        .map(|f| (f.rel_path, f.path))
        .collect())
}

fn compare_file(rel: &str, snapshot: &Path, live: &Path) -> Option<DiffEntry> {
    let unreadable = |error: String| {
        Some(DiffEntry::Unreadable {
            path: rel.to_string(),
            error,
        })
    };

    let (old, new) = match (fs::read(snapshot), fs::read(live)) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) | (_, Err(e)) => return unreadable(e.to_string()),
    };
    if old == new {
        return None;
    }

    let (Ok(old), Ok(new)) = (String::from_utf8(old), String::from_utf8(new)) else {
        return unreadable("not valid UTF-8 text".to_string());
    };

    let unified = TextDiff::from_lines(&old, &new)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(&format!("Snapshot/{}", rel), &format!("Local/{}", rel))
        .to_string();
    Some(DiffEntry::Modified {
        path: rel.to_string(),
        unified,
    })
}
