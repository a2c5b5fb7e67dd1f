//! Temporary workspaces for integration tests.

use fs_err as fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use skillsnap_core::{EngineConfig, MemoryBackend, SnapError, Workspace};

/// Temp skills directory and snapshot repository, cleaned up on drop.
pub struct TestWorkspace {
    _temp: TempDir,
    skills: PathBuf,
    repo: PathBuf,
    remote: Option<PathBuf>,
    memory: Option<Arc<MemoryBackend>>,
    ws: Workspace,
}

impl TestWorkspace {
    /// Workspace backed by an initialized [`MemoryBackend`].
    pub fn memory() -> Result<Self, TestWorkspaceError> {
        Self::memory_with(MemoryBackend::new(), |c| c)
    }

    /// Workspace backed by `backend`, with the config adjusted by `configure`.
    pub fn memory_with(
        backend: MemoryBackend,
        configure: impl FnOnce(EngineConfig) -> EngineConfig,
    ) -> Result<Self, TestWorkspaceError> {
        let (temp, skills, repo) = Self::dirs()?;
        let config = configure(EngineConfig::new(&skills, &repo));
        let backend = Arc::new(backend);
        let ws = Workspace::with_backend(config, Box::new(backend.clone()));
        Ok(Self {
            _temp: temp,
            skills,
            repo,
            remote: None,
            memory: Some(backend),
            ws,
        })
    }

    /// Workspace backed by a real git repository, not yet initialized.
    pub fn git() -> Result<Self, TestWorkspaceError> {
        let (temp, skills, repo) = Self::dirs()?;
        let ws = Workspace::open(EngineConfig::new(&skills, &repo));
        Ok(Self {
            _temp: temp,
            skills,
            repo,
            remote: None,
            memory: None,
            ws,
        })
    }

    /// Git workspace whose remote is a fresh bare repository.
    pub fn git_with_remote() -> Result<Self, TestWorkspaceError> {
        let (temp, skills, repo) = Self::dirs()?;
        let remote = temp.path().join("remote.git");
        git2::Repository::init_bare(&remote)?;

        let config = EngineConfig::new(&skills, &repo).with_remote(remote.to_string_lossy());
        let ws = Workspace::open(config);
        Ok(Self {
            _temp: temp,
            skills,
            repo,
            remote: Some(remote),
            memory: None,
            ws,
        })
    }

    fn dirs() -> Result<(TempDir, PathBuf, PathBuf), TestWorkspaceError> {
        let temp = TempDir::new()?;
        let skills = temp.path().join("skills");
        let repo = temp.path().join("repo");
        fs::create_dir_all(&skills)?;
        Ok((temp, skills, repo))
    }

    /// The engine workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.ws
    }

    /// The memory backend, for memory-backed workspaces.
    pub fn backend(&self) -> Option<&MemoryBackend> {
        self.memory.as_deref()
    }

    /// Skills directory.
    pub fn skills_dir(&self) -> &Path {
        &self.skills
    }

    /// Snapshot repository directory.
    pub fn repo_dir(&self) -> &Path {
        &self.repo
    }

    /// Bare remote repository, if any.
    pub fn remote_dir(&self) -> Option<&Path> {
        self.remote.as_deref()
    }

    /// Live directory of tree `name`.
    pub fn tree_dir(&self, name: &str) -> PathBuf {
        self.skills.join(name)
    }

    /// Create a tree with a `SKILL.md` holding `contents`.
    pub fn add_skill(&self, name: &str, contents: &str) -> Result<(), TestWorkspaceError> {
        self.write_file(name, "SKILL.md", contents.as_bytes())
    }

    /// Write a file into a tree, creating parent directories.
    pub fn write_file(&self, tree: &str, rel: &str, contents: &[u8]) -> Result<(), TestWorkspaceError> {
        let path = self.tree_dir(tree).join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Read a file of a tree as text.
    pub fn read_file(&self, tree: &str, rel: &str) -> Result<String, TestWorkspaceError> {
        Ok(fs::read_to_string(self.tree_dir(tree).join(rel))?)
    }

    /// Remove a file of a tree.
    pub fn remove_file(&self, tree: &str, rel: &str) -> Result<(), TestWorkspaceError> {
        fs::remove_file(self.tree_dir(tree).join(rel))?;
        Ok(())
    }

    /// Tag names present in the bare remote, sorted.
    pub fn remote_tag_names(&self) -> Result<Vec<String>, TestWorkspaceError> {
        let Some(remote) = &self.remote else {
            return Ok(Vec::new());
        };
        let repo = git2::Repository::open_bare(remote)?;
        let mut names: Vec<String> = repo.tag_names(None)?.iter().flatten().map(str::to_string).collect();
        names.sort();
        Ok(names)
    }
}

/// Whether a usable `git` binary is on the PATH.
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Error type for TestWorkspace operations.
#[derive(Debug)]
pub enum TestWorkspaceError {
    /// I/O error.
    Io(std::io::Error),
    /// Git error.
    Git(git2::Error),
    /// Engine error.
    Snap(SnapError),
}

impl std::fmt::Display for TestWorkspaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestWorkspaceError::Io(e) => write!(f, "I/O error: {}", e),
            TestWorkspaceError::Git(e) => write!(f, "Git error: {}", e),
            TestWorkspaceError::Snap(e) => write!(f, "skillsnap error: {}", e),
        }
    }
}

impl std::error::Error for TestWorkspaceError {}

impl From<std::io::Error> for TestWorkspaceError {
    fn from(e: std::io::Error) -> Self {
        TestWorkspaceError::Io(e)
    }
}

impl From<git2::Error> for TestWorkspaceError {
    fn from(e: git2::Error) -> Self {
        TestWorkspaceError::Git(e)
    }
}

impl From<SnapError> for TestWorkspaceError {
    fn from(e: SnapError) -> Self {
        TestWorkspaceError::Snap(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_workspace() {
        let tw = TestWorkspace::memory().unwrap();
        assert!(tw.skills_dir().is_dir());
        assert!(!tw.repo_dir().exists());
        assert!(tw.backend().is_some());
        assert!(tw.workspace().require_initialized().is_ok());
    }

    #[test]
    fn test_write_read_remove() {
        let tw = TestWorkspace::memory().unwrap();
        tw.write_file("alpha", "refs/deep/note.md", b"nested").unwrap();
        assert_eq!(tw.read_file("alpha", "refs/deep/note.md").unwrap(), "nested");

        tw.remove_file("alpha", "refs/deep/note.md").unwrap();
        assert!(tw.read_file("alpha", "refs/deep/note.md").is_err());
    }

    #[test]
    fn test_git_workspace_starts_uninitialized() {
        let tw = TestWorkspace::git_with_remote().unwrap();
        assert!(tw.workspace().require_initialized().is_err());
        assert!(tw.remote_dir().unwrap().join("HEAD").exists());
        assert!(tw.remote_tag_names().unwrap().is_empty());
    }
}
