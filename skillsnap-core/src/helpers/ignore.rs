//! Ignore rules and filtered tree walking.
//!
//! A path is excluded when any of its components (directory or file name)
//! is in the ignored name set, or when the file name ends in an ignored
//! suffix. Rules apply at every depth below the tree root.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::SnapError;

/// Names excluded wherever they appear in a tree.
pub const IGNORED_NAMES: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    ".DS_Store",
    "__MACOSX",
    ".idea",
    ".vscode",
    ".pytest_cache",
    "Thumbs.db",
];

/// Compiled-artifact suffixes excluded from every tree.
pub const IGNORED_SUFFIXES: &[&str] = &[".pyc", ".pyo"];

/// Immutable set of ignore rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRules {
    names: BTreeSet<String>,
    suffixes: Vec<String>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            names: IGNORED_NAMES.iter().map(|s| s.to_string()).collect(),
            suffixes: IGNORED_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl IgnoreRules {
    /// Rules with extra names added to the set.
    pub fn with_names(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.names.extend(names);
        self
    }

    /// Whether a single path component is ignored by name.
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether a file name is ignored by name or suffix.
    pub fn is_ignored_file(&self, name: &str) -> bool {
        self.is_ignored_name(name) || self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    fn keeps(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_dir() {
            !self.is_ignored_name(&name)
        } else {
            !self.is_ignored_file(&name)
        }
    }
}

/// A regular file found by [`walk_tree`].
#[derive(Debug, Clone)]
pub struct TreeFile {
    /// Tree-root-relative path, forward-slash separated.
    pub rel_path: String,
    /// Tree-root-relative path as found on disk.
    pub rel: PathBuf,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch.
    pub mtime_ns: u64,
}

/// Enumerate the regular files under `root` that survive the ignore rules.
///
/// Symlinks are neither followed nor reported. Results are sorted by
/// relative path. A kept file or directory whose name is not valid UTF-8
/// is an `InvalidInput` error, so relative paths stay unique.
pub fn walk_tree(root: &Path, rules: &IgnoreRules) -> Result<Vec<TreeFile>, SnapError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| rules.keeps(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata()?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| SnapError::invalid_input(format!("{} is outside the tree", entry.path().display())))?;

        let rel_path = to_forward_slash(rel).ok_or_else(|| {
            SnapError::invalid_input(format!(
                "file name is not valid UTF-8: {}",
                entry.path().display()
            ))
        })?;

        files.push(TreeFile {
            rel_path,
            rel: rel.to_path_buf(),
            path: entry.path().to_path_buf(),
            size: metadata.len(),
            mtime_ns: mtime_ns(&metadata),
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

/// Join path components with `/` regardless of platform.
///
/// `None` if any component is not valid UTF-8.
pub fn to_forward_slash(path: &Path) -> Option<String> {
    let parts = path
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Modification time of a file in nanoseconds since the Unix epoch.
pub fn mtime_ns(metadata: &std::fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
