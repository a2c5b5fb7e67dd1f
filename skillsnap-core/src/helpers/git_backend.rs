//! Git-backed snapshot storage.
//!
//! Mutating and network operations shell out to the system `git` with a
//! hard timeout. Materializing a tag reads objects through `git2`, so the
//! working tree and HEAD are never moved.

use fs_err as fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::helpers::backend::{InitAction, RepoState, SnapshotBackend};
use crate::helpers::command::{run_with_timeout, CommandOutput};
use crate::helpers::copy::{copy_filtered, remove_dir_if_exists};
use crate::helpers::git_ops::{select_git_backend, GitOps};
use crate::helpers::ignore::IgnoreRules;
use crate::helpers::layout::{CACHE_DIR, LOCK_FILE};
use crate::types::{TagEntry, VersionTag};
use crate::{EngineConfig, SnapError};

/// Remote name used for every push and pull.
pub const REMOTE: &str = "origin";

/// Oldest git version known to work; older ones only produce a warning.
pub const MIN_GIT_VERSION: (u32, u32) = (2, 28);

const README: &str = "# Skill Snapshots\n\nVersioned backups of skill directories.\nManaged by skillsnap.\n";

/// Snapshot backend on a git repository.
pub struct GitBackend {
    repo_dir: PathBuf,
    branch: String,
    remote_url: Option<String>,
    timeout: Duration,
    author_name: String,
    author_email: String,
    inspect: Box<dyn GitOps>,
}

impl std::fmt::Debug for GitBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitBackend")
            .field("repo_dir", &self.repo_dir)
            .field("branch", &self.branch)
            .field("remote_url", &self.remote_url)
            .field("inspect", &self.inspect.backend_name())
            .finish()
    }
}

impl GitBackend {
    /// Create a backend for the repository named in `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            repo_dir: config.repo_dir.clone(),
            branch: config.branch.clone(),
            remote_url: config.remote_url.clone(),
            timeout: config.command_timeout,
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
            inspect: select_git_backend(),
        }
    }

    /// Repository root.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn command(&self, dir: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(dir).args(args);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    /// Run git in the repository and return the raw output.
    fn git(&self, args: &[&str]) -> Result<CommandOutput, SnapError> {
        let mut cmd = self.command(&self.repo_dir, args);
        log::debug!("git {}", args.join(" "));
        run_with_timeout(&mut cmd, self.timeout)
    }

    /// Run git in the repository; a non-zero exit is a `Backend` error.
    fn git_checked(&self, args: &[&str]) -> Result<String, SnapError> {
        let output = self.git(args)?;
        if !output.success() {
            return Err(SnapError::backend(format!(
                "git {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    fn has_remote(&self) -> bool {
        git2::Repository::open(&self.repo_dir)
            .and_then(|repo| repo.find_remote(REMOTE).map(|_| ()))
            .is_ok()
    }

    fn has_commits(&self) -> bool {
        git2::Repository::open(&self.repo_dir)
            .and_then(|repo| repo.head().map(|_| ()))
            .is_ok()
    }

    /// Warn when the installed git is older than [`MIN_GIT_VERSION`].
    fn check_git_version(&self) -> Result<(), SnapError> {
        let mut cmd = Command::new("git");
        cmd.arg("--version");
        let output = run_with_timeout(&mut cmd, self.timeout)?;
        if let Some(version) = parse_git_version(&output.stdout) {
            if version < MIN_GIT_VERSION {
                log::warn!(
                    "git {}.{} detected, {}.{}+ recommended",
                    version.0,
                    version.1,
                    MIN_GIT_VERSION.0,
                    MIN_GIT_VERSION.1
                );
            }
        }
        Ok(())
    }

    /// Configure a repository-local identity when git has none.
    fn ensure_identity(&self) -> Result<(), SnapError> {
        for (key, fallback) in [
            ("user.name", self.author_name.as_str()),
            ("user.email", self.author_email.as_str()),
        ] {
            let current = self.inspect.config_value(&self.repo_dir, key).unwrap_or(None);
            if current.map(|v| v.trim().is_empty()).unwrap_or(true) {
                log::info!("setting {} = {} for the snapshot repository", key, fallback);
                self.git_checked(&["config", key, fallback])?;
            }
        }
        Ok(())
    }

    /// Put HEAD back on the snapshot branch if it is detached or elsewhere.
    fn ensure_branch(&self) -> Result<(), SnapError> {
        let head = self.inspect.head_info(&self.repo_dir)?;
        if head.oid.is_none() {
            return Ok(());
        }
        match head.branch.as_deref() {
            Some(branch) if branch == self.branch => Ok(()),
            Some(other) => {
                log::warn!("repository on branch '{}', switching to '{}'", other, self.branch);
                self.git_checked(&["checkout", "--quiet", &self.branch]).map(|_| ())
            }
            None => {
                log::warn!("repository in detached HEAD state, recovering '{}'", self.branch);
                self.git_checked(&["checkout", "--quiet", &self.branch]).map(|_| ())
            }
        }
    }

    fn create_fresh(&self) -> Result<(), SnapError> {
        fs::create_dir_all(&self.repo_dir)?;
        self.git_checked(&["init", "--quiet"])?;
        self.ensure_identity()?;
        fs::write(self.repo_dir.join("README.md"), README)?;
        self.git_checked(&["add", "README.md"])?;
        self.git_checked(&["commit", "--quiet", "-m", "Initial commit"])?;
        self.git_checked(&["branch", "-M", &self.branch])?;

        if let Some(url) = &self.remote_url {
            self.git_checked(&["remote", "add", REMOTE, url])?;
            self.git_checked(&["push", "--quiet", "-u", REMOTE, &self.branch])?;
        }
        Ok(())
    }

    fn clone_from(&self, url: &str) -> Result<(), SnapError> {
        prepare_clone_target(&self.repo_dir)?;
        let parent = self
            .repo_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent)?;

        let repo_arg = self.repo_dir.to_string_lossy().into_owned();
        let mut cmd = self.command(&parent, &["clone", "--quiet", url, &repo_arg]);
        let output = run_with_timeout(&mut cmd, self.timeout)?;
        if !output.success() {
            return Err(SnapError::backend(format!(
                "git clone {} failed: {}",
                url,
                output.stderr.trim()
            )));
        }
        self.ensure_identity()?;

        if !self.has_commits() {
            // Empty remote: seed it the same way a fresh repository is seeded.
            fs::write(self.repo_dir.join("README.md"), README)?;
            self.git_checked(&["add", "README.md"])?;
            self.git_checked(&["commit", "--quiet", "-m", "Initial commit"])?;
            self.git_checked(&["branch", "-M", &self.branch])?;
            self.git_checked(&["push", "--quiet", "-u", REMOTE, &self.branch])?;
        }
        Ok(())
    }
}

impl SnapshotBackend for GitBackend {
    fn is_initialized(&self) -> bool {
        self.repo_dir.join(".git").exists()
    }

    fn init_or_clone(&self) -> Result<InitAction, SnapError> {
        self.check_git_version()?;

        if self.is_initialized() {
            self.ensure_identity()?;
            self.ensure_branch()?;
            return Ok(InitAction::Existing);
        }

        match &self.remote_url {
            Some(url) => {
                self.clone_from(url)?;
                Ok(InitAction::Cloned)
            }
            None => {
                self.create_fresh()?;
                Ok(InitAction::Created)
            }
        }
    }

    fn sync(&self) -> Result<(), SnapError> {
        self.ensure_branch()?;
        if !self.has_remote() {
            return Ok(());
        }
        let pull = self.git(&["pull", "--quiet", REMOTE, &self.branch])?;
        if !pull.success() {
            return Err(SnapError::unavailable(format!(
                "could not sync with remote: {}",
                pull.stderr.trim()
            )));
        }
        self.fetch_tags()
    }

    fn fetch_tags(&self) -> Result<(), SnapError> {
        if !self.has_remote() {
            return Ok(());
        }
        let fetch = self.git(&["fetch", "--tags", "--quiet", REMOTE])?;
        if !fetch.success() {
            return Err(SnapError::unavailable(format!(
                "could not fetch tags: {}",
                fetch.stderr.trim()
            )));
        }
        Ok(())
    }

    fn has_tree(&self, name: &str) -> bool {
        self.repo_dir.join(name).is_dir()
    }

    fn stage_tree(&self, name: &str, source: &Path, rules: &IgnoreRules) -> Result<(), SnapError> {
        let target = self.repo_dir.join(name);
        remove_dir_if_exists(&target)?;
        let copied = copy_filtered(source, &target, rules)?;
        log::debug!("staged {} files for '{}'", copied, name);
        self.git_checked(&["add", "-A", "--", name])?;
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool, SnapError> {
        let output = self.git(&["diff", "--cached", "--quiet"])?;
        match output.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(SnapError::backend(format!(
                "git diff --cached failed: {}",
                output.stderr.trim()
            ))),
        }
    }

    fn commit(&self, message: &str) -> Result<(), SnapError> {
        self.ensure_identity()?;
        self.git_checked(&["commit", "--quiet", "-m", message])?;
        Ok(())
    }

    fn create_tag(&self, tag: &VersionTag, message: &str) -> Result<(), SnapError> {
        let name = tag.to_string();
        self.git_checked(&["tag", "-a", &name, "-m", message])?;
        Ok(())
    }

    fn tag_exists(&self, tag: &VersionTag) -> Result<bool, SnapError> {
        let reference = format!("refs/tags/{}", tag);
        let output = self.git(&["rev-parse", "--verify", "--quiet", &reference])?;
        Ok(output.success())
    }

    fn list_tags(&self, pattern: &str) -> Result<Vec<TagEntry>, SnapError> {
        let stdout = self.git_checked(&["tag", "-l", "-n1", "--sort=-creatordate", pattern])?;
        Ok(parse_tag_listing(&stdout))
    }

    fn delete_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        let name = tag.to_string();
        self.git_checked(&["tag", "-d", &name])?;
        Ok(())
    }

    fn delete_remote_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        if !self.has_remote() {
            return Ok(());
        }
        let reference = format!("refs/tags/{}", tag);
        self.git_checked(&["push", "--quiet", REMOTE, "--delete", &reference])?;
        Ok(())
    }

    fn push_branch(&self) -> Result<(), SnapError> {
        if !self.has_remote() {
            return Ok(());
        }
        self.git_checked(&["push", "--quiet", REMOTE, &self.branch])?;
        Ok(())
    }

    fn push_tag(&self, tag: &VersionTag) -> Result<(), SnapError> {
        if !self.has_remote() {
            return Ok(());
        }
        let reference = format!("refs/tags/{}", tag);
        self.git_checked(&["push", "--quiet", REMOTE, &reference])?;
        Ok(())
    }

    fn materialize(&self, tag: &VersionTag, dest: &Path) -> Result<(), SnapError> {
        let repo = git2::Repository::open(&self.repo_dir)?;
        let reference = format!("refs/tags/{}", tag);
        let object = repo
            .revparse_single(&reference)
            .map_err(|_| SnapError::not_found(format!("Version {} not found", tag)))?;
        let commit = object.peel_to_commit()?;
        let root = commit.tree()?;
        let entry = root.get_path(Path::new(&tag.tree)).map_err(|_| {
            SnapError::not_found(format!("content of '{}' not found in snapshot {}", tag.tree, tag))
        })?;
        let subtree = repo.find_tree(entry.id()).map_err(|_| {
            SnapError::corrupt(format!("'{}' in snapshot {} is not a directory", tag.tree, tag))
        })?;

        write_tree(&repo, &subtree, dest)
    }

    fn repo_state(&self) -> Result<RepoState, SnapError> {
        let head = self.inspect.head_info(&self.repo_dir)?;
        let status = self.inspect.status_info(&self.repo_dir)?;
        Ok(RepoState {
            branch: head.branch,
            is_detached: head.is_detached,
            is_dirty: status.is_dirty,
            has_untracked: status.has_untracked,
        })
    }

    fn backend_name(&self) -> &'static str {
        "git"
    }
}

/// Recursively write a git tree into `dest`.
fn write_tree(repo: &git2::Repository, tree: &git2::Tree<'_>, dest: &Path) -> Result<(), SnapError> {
    fs::create_dir_all(dest)?;
    for entry in tree.iter() {
        let Some(name) = entry.name() else {
            log::warn!("skipping non-UTF-8 entry in snapshot");
            continue;
        };
        if name == "." || name == ".." || name.contains('/') {
            return Err(SnapError::corrupt(format!("invalid entry name '{}' in snapshot", name)));
        }
        let path = dest.join(name);
        match entry.kind() {
            Some(git2::ObjectType::Tree) => {
                let sub = repo.find_tree(entry.id())?;
                write_tree(repo, &sub, &path)?;
            }
            Some(git2::ObjectType::Blob) if entry.filemode() != 0o120000 => {
                let blob = repo.find_blob(entry.id())?;
                fs::write(&path, blob.content())?;
                if entry.filemode() == 0o100755 {
                    set_executable(&path)?;
                }
            }
            _ => log::debug!("skipping {} in snapshot", name),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), SnapError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), SnapError> {
    Ok(())
}

/// Parse `git tag -l -n1` output: `<name>  <first message line>`.
pub fn parse_tag_listing(stdout: &str) -> Vec<TagEntry> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            let line = line.trim();
            match line.split_once(char::is_whitespace) {
                Some((name, message)) => TagEntry {
                    name: name.to_string(),
                    message: message.trim().to_string(),
                },
                None => TagEntry {
                    name: line.to_string(),
                    message: String::new(),
                },
            }
        })
        .collect()
}

/// Parse `git version 2.39.0...` into `(2, 39)`.
pub fn parse_git_version(stdout: &str) -> Option<(u32, u32)> {
    let rest = stdout.trim().strip_prefix("git version ")?;
    let mut parts = rest.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts
        .next()?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .ok()?;
    Some((major, minor))
}

/// Clear `dir` for `git clone`. Only the engine's own cache directory and
/// lock file may be present; anything else is refused.
fn prepare_clone_target(dir: &Path) -> Result<(), SnapError> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        if name != CACHE_DIR && name != LOCK_FILE {
            return Err(SnapError::invalid_input(format!(
                "{} exists and is not a git repository; refusing to clone over it",
                dir.display()
            )));
        }
    }
    fs::remove_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_listing() {
        let out = "alpha/v2        Second snapshot\nalpha/v1        Snapshot at 2024-01-01 10:00\nbeta/v1\n";
        let tags = parse_tag_listing(out);
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].name, "alpha/v2");
        assert_eq!(tags[0].message, "Second snapshot");
        assert_eq!(tags[1].message, "Snapshot at 2024-01-01 10:00");
        assert_eq!(tags[2].message, "");
    }

    #[test]
    fn test_parse_git_version() {
        assert_eq!(parse_git_version("git version 2.39.0.windows.2\n"), Some((2, 39)));
        assert_eq!(parse_git_version("git version 2.27.1"), Some((2, 27)));
        assert_eq!(parse_git_version("not git"), None);
        assert!(parse_git_version("git version 2.27.1").unwrap() < MIN_GIT_VERSION);
    }

    #[test]
    fn test_clone_target_with_only_engine_files_is_cleared() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("repo");
        fs::create_dir_all(dir.join(CACHE_DIR)).unwrap();
        fs::write(dir.join(CACHE_DIR).join("alpha.json"), "{}").unwrap();
        fs::write(dir.join(LOCK_FILE), "1\n2024-01-01T00:00:00").unwrap();

        prepare_clone_target(&dir).unwrap();
        assert!(!dir.exists());
        prepare_clone_target(&dir).unwrap();
    }

    #[test]
    fn test_clone_target_with_user_files_is_refused() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("repo");
        fs::create_dir_all(dir.join(CACHE_DIR)).unwrap();
        fs::write(dir.join("notes.md"), "mine").unwrap();

        let err = prepare_clone_target(&dir).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(dir.join("notes.md").exists());
    }
}
