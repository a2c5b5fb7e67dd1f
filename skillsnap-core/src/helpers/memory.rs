//! In-memory snapshot backend.
//!
//! Keeps staged trees, a linear commit history and tags in memory, so the
//! engines can be exercised without a git binary. Any operation can be made
//! to fail by name with [`MemoryBackend::fail_on`].

use fs_err as fs;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::helpers::backend::{tag_matches, InitAction, RepoState, SnapshotBackend};
use crate::helpers::ignore::{walk_tree, IgnoreRules};
use crate::types::{TagEntry, VersionTag};
use crate::SnapError;

/// Files of one tree: relative path to contents.
pub type TreeFiles = BTreeMap<String, Vec<u8>>;

type RepoContent = BTreeMap<String, TreeFiles>;

#[derive(Debug, Clone)]
struct MemTag {
    name: String,
    message: String,
    commit: usize,
}

#[derive(Debug, Default)]
struct MemoryState {
    initialized: bool,
    index: RepoContent,
    commits: Vec<(String, RepoContent)>,
    tags: Vec<MemTag>,
    remote_tags: BTreeSet<String>,
    failures: BTreeSet<String>,
    calls: Vec<String>,
}

impl MemoryState {
    fn head(&self) -> RepoContent {
        self.commits
            .last()
            .map(|(_, content)| content.clone())
            .unwrap_or_default()
    }
}

/// Snapshot backend held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Create an initialized, empty backend.
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state().initialized = true;
        backend
    }

    /// Create a backend that reports itself as not initialized.
    pub fn uninitialized() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every later call of `op` fail with a `Backend` error.
    pub fn fail_on(&self, op: &str) {
        self.state().failures.insert(op.to_string());
    }

    /// Stop failing `op`.
    pub fn clear_failure(&self, op: &str) {
        self.state().failures.remove(op);
    }

    /// Names of the operations called so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// How many times `op` has been called.
    pub fn call_count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| c.as_str() == op).count()
    }

    /// Number of commits made.
    pub fn commit_count(&self) -> usize {
        self.state().commits.len()
    }

    /// Message of the last commit.
    pub fn last_commit_message(&self) -> Option<String> {
        self.state().commits.last().map(|(m, _)| m.clone())
    }

    /// Local tag names in creation order.
    pub fn tag_names(&self) -> Vec<String> {
        self.state().tags.iter().map(|t| t.name.clone()).collect()
    }

    /// Tag names pushed to the simulated remote.
    pub fn remote_tags(&self) -> Vec<String> {
        self.state().remote_tags.iter().cloned().collect()
    }

    fn enter(&self, op: &str) -> Result<MutexGuard<'_, MemoryState>, SnapError> {
        let mut state = self.state();
        state.calls.push(op.to_string());
        if state.failures.contains(op) {
            return Err(SnapError::backend(format!("injected failure: {}", op)));
        }
        Ok(state)
    }
}

impl SnapshotBackend for MemoryBackend {
    fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    fn init_or_clone(&self) -> Result<InitAction, SnapError> {
        let mut state = self.enter("init_or_clone")?;
        if state.initialized {
            return Ok(InitAction::Existing);
        }
        state.initialized = true;
        Ok(InitAction::Created)
    }

    fn sync(&self) -> Result<(), SnapError> {
        self.enter("sync").map(|_| ())
    }

    fn fetch_tags(&self) -> Result<(), SnapError> {
        self.enter("fetch_tags").map(|_| ())
    }

    fn has_tree(&self, name: &str) -> bool {
        self.state().index.contains_key(name)
    }

    fn stage_tree(&self, name: &str, source: &Path, rules: &IgnoreRules) -> Result<(), SnapError> {
        let mut files = TreeFiles::new();
        for file in walk_tree(source, rules)? {
            files.insert(file.rel_path, fs::read(&file.path)?);
        }
        let mut state = self.enter("stage_tree")?;
        state.index.insert(name.to_string(), files);
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool, SnapError> {
        let state = self.enter("has_staged_changes")?;
        Ok(state.index != state.head())
    }

    fn commit(&self, message: &str) -> Result<(), SnapError> {
        let mut state = self.enter("commit")?;
        if state.index == state.head() {
            return Err(SnapError::backend("nothing to commit"));
        }
        let content = state.index.clone();
        state.commits.push((message.to_string(), content));
        Ok(())
    }

    fn create_tag(&self, tag: &VersionTag, message: &str) -> Result<(), SnapError> {
        let mut state = self.enter("create_tag")?;
        let name = tag.to_string();
        if state.tags.iter().any(|t| t.name == name) {
            return Err(SnapError::backend(format!("tag '{}' already exists", name)));
        }
        let Some(commit) = state.commits.len().checked_sub(1) else {
            return Err(SnapError::backend("no commit to tag"));
        };
        state.tags.push(MemTag {
            name,
            message: message.to_string(),
            commit,
        });
        Ok(())
    }

    fn tag_exists(&self, tag: &VersionTag) -> Result<bool, SnapError> {
        let state = self.enter("tag_exists")?;
        let name = tag.to_string();
        Ok(state.tags.iter().any(|t| t.name == name))
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<TagEntry>, SnapError> {
        let state = self.enter("list_tags")?;
        Ok(state
            .tags
            .iter()
            .rev()
            .filter(|t| tag_matches(pattern, &t.name))
            .map(|t| TagEntry {
                name: t.name.clone(),
                message: t.message.lines().next().unwrap_or_default().to_string(),
            })
            .collect())
    }

    fn delete_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        let mut state = self.enter("delete_tag")?;
        let name = tag.to_string();
        let before = state.tags.len();
        state.tags.retain(|t| t.name != name);
        if state.tags.len() == before {
            return Err(SnapError::backend(format!("tag '{}' not found", name)));
        }
        Ok(())
    }

    fn delete_remote_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        let mut state = self.enter("delete_remote_tag")?;
        state.remote_tags.remove(&tag.to_string());
        Ok(())
    }

    fn push_branch(&self) -> Result<(), SnapError> {
        self.enter("push_branch").map(|_| ())
    }

    fn push_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        let mut state = self.enter("push_tag")?;
        state.remote_tags.insert(tag.to_string());
        Ok(())
    }

    fn materialize(&self, tag: &VersionTag, dest: &Path) -> Result<(), SnapError> {
        let files = {
            let state = self.enter("materialize")?;
            let name = tag.to_string();
            let found = state
                .tags
                .iter()
                .find(|t| t.name == name)
                .ok_or_else(|| SnapError::not_found(format!("Version {} not found", tag)))?;
            state
                .commits
                .get(found.commit)
                .and_then(|(_, content)| content.get(&tag.tree))
                .cloned()
                .ok_or_else(|| {
                    SnapError::not_found(format!(
                        "content of '{}' not found in snapshot {}",
                        tag.tree, tag
                    ))
                })?
        };

        fs::create_dir_all(dest)?;
        for (rel, contents) in files {
            let path = dest.join(&rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
        }
        Ok(())
    }

    fn repo_state(&self) -> Result<RepoState, SnapError> {
        let state = self.enter("repo_state")?;
        Ok(RepoState {
            branch: Some(crate::DEFAULT_BRANCH.to_string()),
            is_detached: false,
            is_dirty: state.index != state.head(),
            has_untracked: false,
        })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree_with(temp: &TempDir, contents: &str) -> std::path::PathBuf {
        let dir = temp.path().join("alpha");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), contents).unwrap();
        dir
    }

    #[test]
    fn test_stage_commit_tag_materialize() {
        let temp = TempDir::new().unwrap();
        let src = tree_with(&temp, "v1");
        let backend = MemoryBackend::new();
        let tag = VersionTag::new("alpha", 1);

        assert!(!backend.has_tree("alpha"));
        backend.stage_tree("alpha", &src, &IgnoreRules::default()).unwrap();
        assert!(backend.has_tree("alpha"));
        assert!(backend.has_staged_changes().unwrap());
        backend.commit("[alpha] v1: first").unwrap();
        backend.create_tag(&tag, "first").unwrap();
        assert!(!backend.has_staged_changes().unwrap());

        let out = temp.path().join("out");
        backend.materialize(&tag, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("SKILL.md")).unwrap(), "v1");
    }

    #[test]
    fn test_restaging_identical_content_is_clean() {
        let temp = TempDir::new().unwrap();
        let src = tree_with(&temp, "same");
        let backend = MemoryBackend::new();
        backend.stage_tree("alpha", &src, &IgnoreRules::default()).unwrap();
        backend.commit("c1").unwrap();

        backend.stage_tree("alpha", &src, &IgnoreRules::default()).unwrap();
        assert!(!backend.has_staged_changes().unwrap());
        assert!(backend.commit("c2").is_err());
    }

    #[test]
    fn test_list_tags_newest_first() {
        let temp = TempDir::new().unwrap();
        let src = tree_with(&temp, "x");
        let backend = MemoryBackend::new();
        backend.stage_tree("alpha", &src, &IgnoreRules::default()).unwrap();
        backend.commit("c").unwrap();
        backend.create_tag(&VersionTag::new("alpha", 1), "one\nmore").unwrap();
        backend.create_tag(&VersionTag::new("alpha", 2), "two").unwrap();
        backend.create_tag(&VersionTag::new("beta", 1), "b").unwrap();

        let names: Vec<_> = backend
            .list_tags("alpha/v*")
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["alpha/v2", "alpha/v1"]);
        assert_eq!(backend.list_tags("*/v*").unwrap().len(), 3);
        assert_eq!(backend.list_tags("alpha/v*").unwrap()[1].message, "one");
    }

    #[test]
    fn test_injected_failure() {
        let backend = MemoryBackend::new();
        backend.fail_on("push_branch");
        let err = backend.push_branch().unwrap_err();
        assert!(err.is_backend());
        backend.clear_failure("push_branch");
        backend.push_branch().unwrap();
        assert_eq!(backend.call_count("push_branch"), 2);
    }

    #[test]
    fn test_materialize_unknown_tag() {
        let temp = TempDir::new().unwrap();
        let backend = MemoryBackend::new();
        let err = backend
            .materialize(&VersionTag::new("alpha", 9), &temp.path().join("o"))
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
