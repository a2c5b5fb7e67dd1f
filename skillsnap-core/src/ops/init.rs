//! Initialize the snapshot repository.

use fs_err as fs;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::helpers::backend::InitAction;
use crate::helpers::layout::{CACHE_DIR, LOCK_FILE};
use crate::ops::workspace::Workspace;
use crate::SnapError;

const GITIGNORE_HEADER: &str = "# Skill snapshot cache (auto-generated)";

/// Result of [`init`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitResult {
    /// What the backend did.
    pub action: InitAction,
    /// Repository root.
    pub repo_dir: PathBuf,
    /// Configured remote, if any.
    pub remote_url: Option<String>,
    /// Whether `.gitignore` was created or extended.
    pub gitignore_updated: bool,
}

/// Create or clone the repository and keep engine files out of version control.
///
/// Safe to run again on an initialized repository. No lock is taken, as a
/// clone needs an empty target directory.
pub fn init(ws: &Workspace) -> Result<InitResult, SnapError> {
    let action = ws.backend().init_or_clone()?;
    log::info!("repository {}: {:?}", ws.layout().repo_dir().display(), action);

    let gitignore_updated = if ws.layout().repo_dir().is_dir() {
        match ensure_gitignore(&ws.layout().gitignore_path()) {
            Ok(updated) => updated,
            Err(e) => {
                log::warn!("failed to update .gitignore: {}", e);
                false
            }
        }
    } else {
        false
    };

    Ok(InitResult {
        action,
        repo_dir: ws.layout().repo_dir().to_path_buf(),
        remote_url: ws.config().remote_url.clone(),
        gitignore_updated,
    })
}

/// Make sure `.gitignore` lists the cache directory and the lock file.
///
/// Returns whether the file was written.
pub fn ensure_gitignore(path: &Path) -> Result<bool, SnapError> {
    let existing = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let wanted = [format!("{}/", CACHE_DIR), LOCK_FILE.to_string()];
    let missing: Vec<&String> = wanted
        .iter()
        .filter(|entry| !existing.lines().any(|line| line.trim() == entry.as_str()))
        .collect();
    if missing.is_empty() {
        return Ok(false);
    }

    let mut contents = existing;
    if !contents.is_empty() {
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        contents.push('\n');
    }
    contents.push_str(GITIGNORE_HEADER);
    contents.push('\n');
    for entry in missing {
        contents.push_str(entry);
        contents.push('\n');
    }
    fs::write(path, contents)?;
    Ok(true)
}
