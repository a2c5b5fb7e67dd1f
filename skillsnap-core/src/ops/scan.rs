//! Discover candidate trees in the skills directory.

use fs_err as fs;
use serde::Serialize;

use crate::helpers::copy::dir_size;
use crate::helpers::layout::{ARCHIVE_DIR, SKILL_MARKER};
use crate::ops::workspace::Workspace;
use crate::SnapError;

/// Why a discovered tree is not snapshotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The snapshot tool's own tree.
    SelfTree,
    /// Larger than the configured size cap.
    TooLarge,
}

/// One tree found by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    /// Tree name.
    pub name: String,
    /// Total size of all regular files, in bytes.
    pub size: u64,
    /// `None` for a candidate, otherwise why it is skipped.
    pub skipped: Option<SkipReason>,
}

impl ScanEntry {
    pub fn is_candidate(&self) -> bool {
        self.skipped.is_none()
    }
}

/// List the trees of the skills directory, sorted by name.
///
/// Hidden entries, the archive directory, symlinks, plain files and
/// directories without a `SKILL.md` are not trees and are left out. The
/// self tree and oversized trees are reported as skipped.
pub fn scan(ws: &Workspace) -> Result<Vec<ScanEntry>, SnapError> {
    let root = ws.layout().skills_dir();
    if !root.is_dir() {
        return Err(SnapError::not_found(format!(
            "skills directory not found: {}",
            root.display()
        )));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name == ARCHIVE_DIR {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_symlink() || !file_type.is_dir() {
            continue;
        }
        let path = entry.path();
        if !path.join(SKILL_MARKER).exists() {
            continue;
        }

        if ws.config().is_self(&name) {
            entries.push(ScanEntry {
                name,
                size: 0,
                skipped: Some(SkipReason::SelfTree),
            });
            continue;
        }

        let size = dir_size(&path);
        let skipped = (size > ws.config().max_tree_bytes).then_some(SkipReason::TooLarge);
        entries.push(ScanEntry { name, size, skipped });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("scanned {}: {} trees", root.display(), entries.len());
    Ok(entries)
}

/// Names of the trees eligible for snapshots, sorted.
pub fn discover_trees(ws: &Workspace) -> Result<Vec<String>, SnapError> {
    Ok(scan(ws)?
        .into_iter()
        .filter(ScanEntry::is_candidate)
        .map(|e| e.name)
        .collect())
}
