//! Directory layout of the skills directory and the snapshot repository.
//!
//! The snapshot repository contains:
//! - `<tree>/` - staged copy of each tree, committed and tagged
//! - `.snapshot_cache/<tree>.json` - hash cache, one file per tree (gitignored)
//! - `.snapshot.lock` - the repository lock
//! - `README.md`, `.gitignore`

use std::path::{Path, PathBuf};

use crate::EngineConfig;

/// Hash cache directory name inside the repository.
pub const CACHE_DIR: &str = ".snapshot_cache";

/// Lock file name inside the repository.
pub const LOCK_FILE: &str = ".snapshot.lock";

/// Marker file identifying a skill directory.
pub const SKILL_MARKER: &str = "SKILL.md";

/// Directory name under the skills directory that is never scanned.
pub const ARCHIVE_DIR: &str = "archive";

/// Layout helper resolving every path the engines touch.
#[derive(Debug, Clone)]
pub struct Layout {
    skills_dir: PathBuf,
    repo_dir: PathBuf,
}

impl Layout {
    /// Create a layout from explicit directories.
    pub fn new(skills_dir: impl Into<PathBuf>, repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: skills_dir.into(),
            repo_dir: repo_dir.into(),
        }
    }

    /// Create a layout from an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.skills_dir.clone(), config.repo_dir.clone())
    }

    /// Directory holding the live trees.
    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Root of the snapshot repository.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Live directory of a tree.
    pub fn tree_dir(&self, name: &str) -> PathBuf {
        self.skills_dir.join(name)
    }

    /// Staged copy of a tree inside the repository.
    pub fn staged_dir(&self, name: &str) -> PathBuf {
        self.repo_dir.join(name)
    }

    /// Hash cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.repo_dir.join(CACHE_DIR)
    }

    /// Hash cache file of a tree.
    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir().join(format!("{}.json", name))
    }

    /// Repository lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.repo_dir.join(LOCK_FILE)
    }

    /// Repository `.gitignore`.
    pub fn gitignore_path(&self) -> PathBuf {
        self.repo_dir.join(".gitignore")
    }

    /// Repository README.
    pub fn readme_path(&self) -> PathBuf {
        self.repo_dir.join("README.md")
    }

    /// Repository `.git` directory.
    pub fn git_dir(&self) -> PathBuf {
        self.repo_dir.join(".git")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = Layout::new("/home/u/.claude/skills", "/home/u/.claude/skill-snapshots");
        assert_eq!(layout.tree_dir("alpha"), PathBuf::from("/home/u/.claude/skills/alpha"));
        assert_eq!(
            layout.staged_dir("alpha"),
            PathBuf::from("/home/u/.claude/skill-snapshots/alpha")
        );
        assert_eq!(
            layout.cache_path("alpha"),
            PathBuf::from("/home/u/.claude/skill-snapshots/.snapshot_cache/alpha.json")
        );
        assert_eq!(
            layout.lock_path(),
            PathBuf::from("/home/u/.claude/skill-snapshots/.snapshot.lock")
        );
    }
}
