//! Snapshot backend abstraction.
//!
//! The engines never talk to git directly. They go through the narrow
//! `SnapshotBackend` interface: stage a tree, commit, detect staged changes,
//! create/list/delete tags, materialize a tag's tree, push and pull.
//! `GitBackend` implements it on a real repository; `MemoryBackend` keeps
//! everything in memory for tests.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::helpers::ignore::IgnoreRules;
use crate::types::{TagEntry, VersionTag};
use crate::SnapError;

/// Branch and working tree state of the backend repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoState {
    /// Current branch, if on one.
    pub branch: Option<String>,
    /// Whether HEAD is detached.
    pub is_detached: bool,
    /// Whether there are uncommitted changes to tracked files.
    pub is_dirty: bool,
    /// Whether untracked files are present.
    pub has_untracked: bool,
}

/// What `init_or_clone` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitAction {
    /// A repository already existed; it was only checked.
    Existing,
    /// A new repository was created with an initial commit.
    Created,
    /// The repository was cloned from the remote.
    Cloned,
}

/// Backend trait for snapshot storage.
///
/// Mutating calls are only made while the repository lock is held.
pub trait SnapshotBackend: Send + Sync {
    /// Whether the repository exists and is usable.
    fn is_initialized(&self) -> bool;

    /// Create the repository, or clone it when a remote is configured.
    fn init_or_clone(&self) -> Result<InitAction, SnapError>;

    /// Pull the branch and fetch tags from the remote. No-op without a remote.
    fn sync(&self) -> Result<(), SnapError>;

    /// Fetch tags only. No-op without a remote.
    fn fetch_tags(&self) -> Result<(), SnapError>;

    /// Whether a staged copy of `name` exists (it has been snapshotted before).
    fn has_tree(&self, name: &str) -> bool;

    /// Replace the staged copy of `name` wholesale with a filtered copy of
    /// `source`, and stage it.
    fn stage_tree(&self, name: &str, source: &Path, rules: &IgnoreRules) -> Result<(), SnapError>;

    /// Whether staged content differs from the last commit.
    fn has_staged_changes(&self) -> Result<bool, SnapError>;

    /// Commit staged changes.
    fn commit(&self, message: &str) -> Result<(), SnapError>;

    /// Create an annotated tag on the last commit.
    fn create_tag(&self, tag: &VersionTag, message: &str) -> Result<(), SnapError>;

    /// Whether `tag` exists locally.
    fn tag_exists(&self, tag: &VersionTag) -> Result<bool, SnapError>;

    /// List tags matching a `<tree>/v*` or `*/v*` pattern, newest first.
    ///
    /// Entries are not validated; callers parse the names.
    fn list_tags(&self, pattern: &str) -> Result<Vec<TagEntry>, SnapError>;

    /// Delete a local tag.
    fn delete_tag(&self, tag: &VersionTag) -> Result<(), SnapError>;

    /// Delete a tag on the remote. No-op without a remote.
    fn delete_remote_tag(&self, tag: &VersionTag) -> Result<(), SnapError>;

    /// Push the branch. No-op without a remote.
    fn push_branch(&self) -> Result<(), SnapError>;

    /// Push a tag. No-op without a remote.
    fn push_tag(&self, tag: &VersionTag) -> Result<(), SnapError>;

    /// Write the content of `tag.tree` as recorded at `tag` into `dest`.
    ///
    /// `dest` must not exist or be empty.
    fn materialize(&self, tag: &VersionTag, dest: &Path) -> Result<(), SnapError>;

    /// Current branch and cleanliness.
    fn repo_state(&self) -> Result<RepoState, SnapError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// Shared backends, so a caller can keep a handle on the backend a
/// workspace owns.
impl<B: SnapshotBackend + ?Sized> SnapshotBackend for Arc<B> {
    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn init_or_clone(&self) -> Result<InitAction, SnapError> {
        (**self).init_or_clone()
    }

    fn sync(&self) -> Result<(), SnapError> {
        (**self).sync()
    }

    fn fetch_tags(&self) -> Result<(), SnapError> {
        (**self).fetch_tags()
    }

    fn has_tree(&self, name: &str) -> bool {
        (**self).has_tree(name)
    }

    fn stage_tree(&self, name: &str, source: &Path, rules: &IgnoreRules) -> Result<(), SnapError> {
        (**self).stage_tree(name, source, rules)
    }

    fn has_staged_changes(&self) -> Result<bool, SnapError> {
        (**self).has_staged_changes()
    }

    fn commit(&self, message: &str) -> Result<(), SnapError> {
        (**self).commit(message)
    }

    fn create_tag(&self, tag: &VersionTag, message: &str) -> Result<(), SnapError> {
        (**self).create_tag(tag, message)
    }

    fn tag_exists(&self, tag: &VersionTag) -> Result<bool, SnapError> {
        (**self).tag_exists(tag)
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<TagEntry>, SnapError> {
        (**self).list_tags(pattern)
    }

    fn delete_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        (**self).delete_tag(tag)
    }

    fn delete_remote_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        (**self).delete_remote_tag(tag)
    }

    fn push_branch(&self) -> Result<(), SnapError> {
        (**self).push_branch()
    }

    fn push_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        (**self).push_tag(tag)
    }

    fn materialize(&self, tag: &VersionTag, dest: &Path) -> Result<(), SnapError> {
        (**self).materialize(tag, dest)
    }

    fn repo_state(&self) -> Result<RepoState, SnapError> {
        (**self).repo_state()
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Match a tag name against the `<prefix>*` glob patterns the engines use.
///
/// Only a single trailing-or-leading `*` segment is supported: `alpha/v*`
/// and `*/v*`.
pub fn tag_matches(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == name,
        Some(("", rest)) => match rest.split_once('*') {
            // `*/v*`: some non-empty prefix, then `rest` without the trailing star
            Some((middle, "")) => name
                .find(middle)
                .map(|i| i > 0)
                .unwrap_or(false),
            _ => name.ends_with(rest) && name.len() > rest.len(),
        },
        Some((prefix, "")) => name.starts_with(prefix),
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
    }
}
