//! Overall status: repository, cache and pending changes.

use serde::Serialize;
use std::path::PathBuf;

use crate::helpers::backend::RepoState;
use crate::ops::change::has_changes;
use crate::ops::scan::discover_trees;
use crate::ops::workspace::Workspace;
use crate::SnapError;

/// Repository section of [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    pub path: PathBuf,
    pub initialized: bool,
    /// Branch and cleanliness; `None` when not initialized or unreadable.
    pub state: Option<RepoState>,
    /// Whether another invocation holds the lock.
    pub locked: bool,
}

/// Cache section of [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub path: PathBuf,
    pub exists: bool,
    pub cached_trees: usize,
    pub version: String,
}

/// Change-detection section of [`StatusReport`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStatus {
    pub total: usize,
    /// Trees with changes since their last snapshot, sorted.
    pub changed: Vec<String>,
    pub unchanged: usize,
}

/// Result of [`status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub repo: RepoStatus,
    pub cache: CacheStatus,
    /// `None` when the skills directory does not exist.
    pub trees: Option<TreeStatus>,
}

/// Collect repository, cache and change status. Read-only.
pub fn status(ws: &Workspace) -> Result<StatusReport, SnapError> {
    let backend = ws.backend();
    let initialized = backend.is_initialized();
    let state = if initialized {
        match backend.repo_state() {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("could not read repository state: {}", e);
                None
            }
        }
    } else {
        None
    };

    let repo = RepoStatus {
        path: ws.layout().repo_dir().to_path_buf(),
        initialized,
        state,
        locked: ws.lock().is_held(),
    };

    let cache_dir = ws.cache().dir();
    let cache = CacheStatus {
        path: cache_dir.to_path_buf(),
        exists: cache_dir.exists(),
        cached_trees: ws.cache().cached_trees()?.len(),
        version: ws.cache().version().to_string(),
    };

    let trees = if ws.layout().skills_dir().is_dir() {
        let mut report = TreeStatus::default();
        for name in discover_trees(ws)? {
            report.total += 1;
            match has_changes(ws, &name) {
                Ok(false) => report.unchanged += 1,
                Ok(true) => report.changed.push(name),
                Err(e) => {
                    log::warn!("could not check '{}': {}", name, e);
                    report.changed.push(name);
                }
            }
        }
        Some(report)
    } else {
        None
    };

    Ok(StatusReport { repo, cache, trees })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::memory::MemoryBackend;
    use crate::ops::fixture::Fixture;
    use crate::ops::save::{save, SaveOptions};

    #[test]
    fn test_status_reports_changes() {
        let fx = Fixture::new();
        fx.add_tree("beta", "b");
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();

        let report = status(&fx.ws).unwrap();
        assert!(report.repo.initialized);
        assert_eq!(report.repo.state.as_ref().unwrap().branch.as_deref(), Some("main"));
        assert!(!report.repo.locked);
        assert_eq!(report.cache.cached_trees, 1);
        assert_eq!(report.cache.version, crate::CACHE_VERSION);

        let trees = report.trees.unwrap();
        assert_eq!(trees.total, 2);
        assert_eq!(trees.changed, vec!["beta"]);
        assert_eq!(trees.unchanged, 1);
    }

    #[test]
    fn test_status_uninitialized() {
        let fx = Fixture::with_backend(MemoryBackend::uninitialized());
        let report = status(&fx.ws).unwrap();
        assert!(!report.repo.initialized);
        assert!(report.repo.state.is_none());
        assert!(!report.cache.exists);
        assert_eq!(report.trees.unwrap().changed, vec!["alpha"]);
    }

    #[test]
    fn test_status_without_skills_dir() {
        let fx = Fixture::new();
        let ws = fx.reconfigure(|c| c.with_skills_dir(fx.temp.path().join("missing")));
        assert!(status(&ws).unwrap().trees.is_none());
    }
}
