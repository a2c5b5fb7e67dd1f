//! Capture the file contents of a tree for comparison.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use skillsnap_core::helpers::hash::get_file_hash;
use skillsnap_core::helpers::ignore::walk_tree;
use skillsnap_core::{IgnoreRules, SnapError};

/// Hash and size of one captured file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCapture {
    pub hash: String,
    pub size: u64,
}

/// Files of a tree keyed by forward-slash relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeCapture {
    pub files: BTreeMap<String, FileCapture>,
}

impl TreeCapture {
    /// Capture `root` with the default ignore rules.
    pub fn capture(root: &Path) -> Result<Self, SnapError> {
        Self::capture_with(root, &IgnoreRules::default())
    }

    /// Capture `root`, skipping what `rules` ignore.
    ///
    /// A missing root captures as empty.
    pub fn capture_with(root: &Path, rules: &IgnoreRules) -> Result<Self, SnapError> {
        if !root.exists() {
            return Ok(Self::default());
        }
        let mut files = BTreeMap::new();
        for file in walk_tree(root, rules)? {
            files.insert(
                file.rel_path,
                FileCapture {
                    hash: get_file_hash(&file.path)?,
                    size: file.size,
                },
            );
        }
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether `rel_path` was captured.
    pub fn contains(&self, rel_path: &str) -> bool {
        self.files.contains_key(rel_path)
    }
}
