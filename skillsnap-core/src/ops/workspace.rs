//! The context every operation runs against.
//!
//! A `Workspace` bundles the resolved configuration, the on-disk layout, the
//! hash cache, the repository lock and the snapshot backend. Operations take
//! `&Workspace` and never construct any of these themselves.

use std::fmt;

use crate::helpers::backend::SnapshotBackend;
use crate::helpers::cache::HashCache;
use crate::helpers::git_backend::GitBackend;
use crate::helpers::layout::Layout;
use crate::helpers::lock::RepoLock;
use crate::{EngineConfig, SnapError};

/// Configuration, layout and backend for one skills directory.
pub struct Workspace {
    config: EngineConfig,
    layout: Layout,
    cache: HashCache,
    lock: RepoLock,
    backend: Box<dyn SnapshotBackend>,
}

impl Workspace {
    /// Open a workspace backed by the git repository at `config.repo_dir`.
    pub fn open(config: EngineConfig) -> Self {
        let backend = GitBackend::new(&config);
        Self::with_backend(config, Box::new(backend))
    }

    /// Open a workspace with an explicit backend.
    pub fn with_backend(config: EngineConfig, backend: Box<dyn SnapshotBackend>) -> Self {
        let layout = Layout::from_config(&config);
        let cache = HashCache::new(layout.cache_dir(), config.cache_version.clone());
        let lock = RepoLock::new(layout.lock_path(), config.lock_stale_after);
        log::debug!(
            "workspace: skills={} repo={} backend={}",
            layout.skills_dir().display(),
            layout.repo_dir().display(),
            backend.backend_name()
        );
        Self {
            config,
            layout,
            cache,
            lock,
            backend,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn cache(&self) -> &HashCache {
        &self.cache
    }

    pub fn lock(&self) -> &RepoLock {
        &self.lock
    }

    pub fn backend(&self) -> &dyn SnapshotBackend {
        self.backend.as_ref()
    }

    /// Fail with `NotInitialized` unless the backend repository exists.
    pub fn require_initialized(&self) -> Result<(), SnapError> {
        if self.backend.is_initialized() {
            Ok(())
        } else {
            Err(SnapError::not_initialized(self.layout.repo_dir()))
        }
    }

    /// Fail with `NotFound` unless the live tree `name` exists.
    pub fn require_tree(&self, name: &str) -> Result<(), SnapError> {
        let path = self.layout.tree_dir(name);
        if path.is_dir() {
            Ok(())
        } else {
            Err(SnapError::not_found(format!(
                "Skill '{}' not found at {}",
                name,
                path.display()
            )))
        }
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("skills_dir", &self.layout.skills_dir())
            .field("repo_dir", &self.layout.repo_dir())
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

/// Check a tree name is a single plain, non-hidden path component.
///
/// Hidden names would collide with `.git` and the cache inside the
/// repository.
pub fn validate_name(name: &str) -> Result<(), SnapError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        Err(SnapError::invalid_input(format!("invalid skill name '{}'", name)))
    } else {
        Ok(())
    }
}

/// Guard for every operation that writes a tree or its history.
///
/// Rejects malformed names and the snapshot tool's own tree before any
/// lock is taken or backend call is made.
pub fn ensure_mutable(config: &EngineConfig, name: &str) -> Result<(), SnapError> {
    validate_name(name)?;
    if config.is_self(name) {
        return Err(SnapError::forbidden(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::memory::MemoryBackend;
    use tempfile::TempDir;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("alpha").is_ok());
        assert!(validate_name("my-skill_2").is_ok());
        for bad in ["", ".", "..", ".git", "a/b", "a\\b"] {
            assert!(validate_name(bad).unwrap_err().is_invalid_input(), "{bad}");
        }
    }

    #[test]
    fn test_ensure_mutable_rejects_self() {
        let config = EngineConfig::new("/s", "/r");
        let err = ensure_mutable(&config, crate::SELF_NAME).unwrap_err();
        assert!(err.is_forbidden());
        assert!(ensure_mutable(&config, "alpha").is_ok());
    }

    #[test]
    fn test_require_checks() {
        let temp = TempDir::new().unwrap();
        let config = EngineConfig::new(temp.path().join("skills"), temp.path().join("repo"));
        let ws = Workspace::with_backend(config, Box::new(MemoryBackend::uninitialized()));

        assert!(ws.require_initialized().unwrap_err().is_not_initialized());
        assert!(ws.require_tree("alpha").unwrap_err().is_not_found());

        std::fs::create_dir_all(temp.path().join("skills/alpha")).unwrap();
        ws.require_tree("alpha").unwrap();
    }
}
