//! Read-only repository inspection with libgit2 and CLI backends.
//!
//! Provides a `GitOps` trait with two implementations:
//! - `Git2Ops`: Uses the `git2` crate (libgit2) - default
//! - `GitCliOps`: Uses the system `git` CLI
//!
//! Set `SKILLSNAP_GIT_BACKEND=cli` to force the CLI backend.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::helpers::command::run_with_timeout;
use crate::{SnapError, COMMAND_TIMEOUT};

/// Environment variable selecting the inspection backend.
pub const ENV_GIT_BACKEND: &str = "SKILLSNAP_GIT_BACKEND";

// ============================================================================
// Types
// ============================================================================

/// Information about the repository HEAD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadInfo {
    /// Current commit OID (hex string), if any.
    pub oid: Option<String>,
    /// Current branch name, if on a branch.
    pub branch: Option<String>,
    /// Whether HEAD is detached (not on a branch).
    pub is_detached: bool,
}

/// Information about the working tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInfo {
    /// Whether there are uncommitted changes (staged or unstaged).
    pub is_dirty: bool,
    /// Whether there are untracked files.
    pub has_untracked: bool,
}

// ============================================================================
// GitOps Trait
// ============================================================================

/// Trait for read-only Git queries.
pub trait GitOps: Send + Sync {
    /// Get information about HEAD (commit OID, branch name, detached state).
    fn head_info(&self, repo_root: &Path) -> Result<HeadInfo, SnapError>;

    /// Get working tree status.
    fn status_info(&self, repo_root: &Path) -> Result<StatusInfo, SnapError>;

    /// Get a Git config value.
    fn config_value(&self, repo_root: &Path, key: &str) -> Result<Option<String>, SnapError>;

    /// Get the backend name for logging.
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// Git2Ops Implementation (libgit2)
// ============================================================================

/// Git queries using the `git2` crate.
#[derive(Debug, Clone, Default)]
pub struct Git2Ops;

impl Git2Ops {
    /// Create a new Git2Ops instance.
    pub fn new() -> Self {
        Self
    }

    fn open(repo_root: &Path) -> Result<git2::Repository, SnapError> {
        git2::Repository::open(repo_root)
            .map_err(|e| SnapError::backend(format!("failed to open repository: {}", e.message())))
    }
}

impl GitOps for Git2Ops {
    fn head_info(&self, repo_root: &Path) -> Result<HeadInfo, SnapError> {
        let repo = Self::open(repo_root)?;

        let head = match repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                // No commits yet
                let branch = repo
                    .find_reference("HEAD")
                    .ok()
                    .and_then(|r| r.symbolic_target().map(|t| t.trim_start_matches("refs/heads/").to_string()));
                return Ok(HeadInfo {
                    oid: None,
                    branch,
                    is_detached: false,
                });
            }
            Err(e) => {
                return Err(SnapError::backend(format!("failed to get HEAD: {}", e.message())));
            }
        };

        let oid = head.target().map(|o| o.to_string());
        let is_detached = repo.head_detached().unwrap_or(false);
        let branch = if is_detached {
            None
        } else {
            head.shorthand().map(|s| s.to_string())
        };

        Ok(HeadInfo {
            oid,
            branch,
            is_detached,
        })
    }

    fn status_info(&self, repo_root: &Path) -> Result<StatusInfo, SnapError> {
        let repo = Self::open(repo_root)?;

        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(false)
            .exclude_submodules(true);

        let statuses = repo
            .statuses(Some(&mut opts))
            .map_err(|e| SnapError::backend(format!("failed to get status: {}", e.message())))?;

        let mut info = StatusInfo::default();
        for entry in statuses.iter() {
            let status = entry.status();
            if status.contains(git2::Status::WT_NEW) {
                info.has_untracked = true;
            }
            if status.intersects(
                git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE
                    | git2::Status::WT_MODIFIED
                    | git2::Status::WT_DELETED
                    | git2::Status::WT_RENAMED
                    | git2::Status::WT_TYPECHANGE,
            ) {
                info.is_dirty = true;
            }
            if info.is_dirty && info.has_untracked {
                break;
            }
        }
        Ok(info)
    }

    fn config_value(&self, repo_root: &Path, key: &str) -> Result<Option<String>, SnapError> {
        let repo = Self::open(repo_root)?;
        let config = repo.config()?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(SnapError::backend(format!(
                "failed to read config value '{}': {}",
                key,
                e.message()
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "git2"
    }
}

// ============================================================================
// GitCliOps Implementation (system git CLI)
// ============================================================================

/// Git queries using the system `git` CLI.
#[derive(Debug, Clone)]
pub struct GitCliOps {
    timeout: Duration,
}

impl Default for GitCliOps {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCliOps {
    /// Create a new GitCliOps instance with the default timeout.
    pub fn new() -> Self {
        Self {
            timeout: COMMAND_TIMEOUT,
        }
    }

    /// Run a git command and return trimmed stdout.
    fn run_git(&self, repo_root: &Path, args: &[&str]) -> Result<String, SnapError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(repo_root).args(args);
        let output = run_with_timeout(&mut cmd, self.timeout)?;
        if !output.success() {
            return Err(SnapError::backend(format!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Run a git command, returning None if it fails or prints nothing.
    fn run_git_optional(&self, repo_root: &Path, args: &[&str]) -> Option<String> {
        self.run_git(repo_root, args).ok().filter(|s| !s.is_empty())
    }
}

impl GitOps for GitCliOps {
    fn head_info(&self, repo_root: &Path) -> Result<HeadInfo, SnapError> {
        let oid = self.run_git_optional(repo_root, &["rev-parse", "--verify", "--quiet", "HEAD"]);
        let branch = self.run_git_optional(repo_root, &["symbolic-ref", "--short", "--quiet", "HEAD"]);
        let is_detached = oid.is_some() && branch.is_none();

        Ok(HeadInfo {
            oid,
            branch,
            is_detached,
        })
    }

    fn status_info(&self, repo_root: &Path) -> Result<StatusInfo, SnapError> {
        let output = self.run_git(repo_root, &["status", "--porcelain"])?;

        let mut info = StatusInfo::default();
        for line in output.lines() {
            if line.starts_with("??") {
                info.has_untracked = true;
            } else if !line.is_empty() {
                info.is_dirty = true;
            }
        }
        Ok(info)
    }

    fn config_value(&self, repo_root: &Path, key: &str) -> Result<Option<String>, SnapError> {
        Ok(self.run_git_optional(repo_root, &["config", "--get", key]))
    }

    fn backend_name(&self) -> &'static str {
        "cli"
    }
}

// ============================================================================
// Backend Selection
// ============================================================================

/// Select the inspection backend from `SKILLSNAP_GIT_BACKEND`.
pub fn select_git_backend() -> Box<dyn GitOps> {
    select_from(std::env::var(ENV_GIT_BACKEND).ok().as_deref())
}

fn select_from(value: Option<&str>) -> Box<dyn GitOps> {
    match value {
        Some("cli") => Box::new(GitCliOps::new()),
        _ => Box::new(Git2Ops::new()),
    }
}
