//! Restore a tree from a snapshot with backup, swap and rollback.
//!
//! The live tree is moved aside before the snapshot is copied in. If the copy
//! fails, the partial result is removed and the original moved back, so the
//! destination always holds either the original or the complete snapshot.

use fs_err as fs;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::helpers::copy::{copy_dir_all, remove_dir_if_exists};
use crate::ops::workspace::{ensure_mutable, Workspace};
use crate::types::VersionTag;
use crate::SnapError;

/// Copies a materialized snapshot into the destination.
pub type CopyFn = dyn Fn(&Path, &Path) -> Result<usize, SnapError>;

/// Result of a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreResult {
    /// The restored version.
    pub tag: VersionTag,
    /// Destination directory.
    pub path: PathBuf,
    /// Files written.
    pub files: usize,
    /// Whether a live tree was replaced.
    pub replaced: bool,
}

/// Outcome of [`swap_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReport {
    pub files: usize,
    pub replaced: bool,
}

/// Restore `name` to `version` (`N`, `vN` or `<name>/vN`).
///
/// # Errors
///
/// * `Forbidden` - `name` is the reserved self-name
/// * `InvalidInput` - malformed version, or a tag of another tree
/// * `Conflict` - another operation holds the lock
/// * `NotFound` - the version does not exist
pub fn restore(ws: &Workspace, name: &str, version: &str) -> Result<RestoreResult, SnapError> {
    restore_with(ws, name, version, &copy_dir_all)
}

/// [`restore`] with an explicit copy step.
pub fn restore_with(
    ws: &Workspace,
    name: &str,
    version: &str,
    copy: &CopyFn,
) -> Result<RestoreResult, SnapError> {
    ensure_mutable(ws.config(), name)?;
    let tag = VersionTag::resolve(name, version)?;

    let guard = ws.lock().acquire()?;
    let result = restore_locked(ws, tag, copy);
    guard.release();
    result
}

fn restore_locked(ws: &Workspace, tag: VersionTag, copy: &CopyFn) -> Result<RestoreResult, SnapError> {
    ws.require_initialized()?;
    let backend = ws.backend();
    backend.sync()?;

    if !backend.tag_exists(&tag)? {
        return Err(SnapError::not_found(format!("Version {} not found", tag)));
    }

    let scratch = tempfile::Builder::new().prefix("skillsnap-restore-").tempdir()?;
    let source = scratch.path().join(&tag.tree);
    backend.materialize(&tag, &source)?;

    let dest = ws.layout().tree_dir(&tag.tree);
    log::info!("restoring {} to {}", tag, dest.display());
    let swap = swap_tree(&source, &dest, copy)?;

    Ok(RestoreResult {
        tag,
        path: dest,
        files: swap.files,
        replaced: swap.replaced,
    })
}

/// Move `dest` aside, copy `source` into its place, and roll back on failure.
///
/// On success the backup is deleted; failing to delete it is only logged.
/// On copy failure the partial destination is removed, the backup is moved
/// back and the copy error is returned.
pub fn swap_tree(source: &Path, dest: &Path, copy: &CopyFn) -> Result<SwapReport, SnapError> {
    let backup = if dest.exists() {
        let backup = backup_path(dest)?;
        fs::rename(dest, &backup)?;
        log::debug!("moved {} aside to {}", dest.display(), backup.display());
        Some(backup)
    } else {
        None
    };

    match copy(source, dest) {
        Ok(files) => {
            if let Some(backup) = &backup {
                if let Err(e) = fs::remove_dir_all(backup) {
                    log::warn!("failed to remove backup {}: {}", backup.display(), e);
                }
            }
            Ok(SwapReport {
                files,
                replaced: backup.is_some(),
            })
        }
        Err(e) => {
            log::warn!("restore of {} failed ({}), reverting", dest.display(), e);
            rollback(dest, backup.as_deref())?;
            Err(e)
        }
    }
}

fn rollback(dest: &Path, backup: Option<&Path>) -> Result<(), SnapError> {
    remove_dir_if_exists(dest)?;
    if let Some(backup) = backup {
        fs::rename(backup, dest)?;
        log::info!("reverted {} to its previous content", dest.display());
    }
    Ok(())
}

/// `<dest>.bak.<unix-seconds>`, with `-N` appended if that is taken.
fn backup_path(dest: &Path) -> Result<PathBuf, SnapError> {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SnapError::invalid_input(format!("cannot back up {}", dest.display())))?;
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let base = format!("{}.bak.{}", name, secs);
    let mut candidate = dest.with_file_name(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = dest.with_file_name(format!("{}-{}", base, n));
        n += 1;
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::fixture::Fixture;
    use crate::ops::save::{save, SaveOptions};

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_restore_previous_version() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        fx.write("alpha", "SKILL.md", "v2 edited");
        fx.write("alpha", "notes.md", "new");
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();

        let result = restore(&fx.ws, "alpha", "v1").unwrap();
        assert_eq!(result.tag, VersionTag::new("alpha", 1));
        assert!(result.replaced);
        assert_eq!(result.files, 1);
        assert_eq!(fx.read("alpha", "SKILL.md"), "v1");
        assert!(!fx.tree("alpha").join("notes.md").exists());

        // No backup left behind.
        assert_eq!(entries(fx.ws.layout().skills_dir()), vec!["alpha"]);
        assert!(!fx.ws.lock().is_held());
    }

    #[test]
    fn test_restore_accepts_all_version_forms() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        for input in ["1", "v1", "alpha/v1"] {
            assert_eq!(restore(&fx.ws, "alpha", input).unwrap().tag.version, 1);
        }
        assert!(restore(&fx.ws, "alpha", "beta/v1").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_restore_recreates_missing_tree() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        fs::remove_dir_all(fx.tree("alpha")).unwrap();

        let result = restore(&fx.ws, "alpha", "1").unwrap();
        assert!(!result.replaced);
        assert_eq!(fx.read("alpha", "SKILL.md"), "v1");
    }

    #[test]
    fn test_unknown_version_is_not_found() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        let err = restore(&fx.ws, "alpha", "v7").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(fx.read("alpha", "SKILL.md"), "v1");
    }

    #[test]
    fn test_self_restore_forbidden() {
        let fx = Fixture::new();
        let err = restore(&fx.ws, crate::SELF_NAME, "v1").unwrap_err();
        assert!(err.is_forbidden());
        assert!(fx.backend.calls().is_empty());
    }

    #[test]
    fn test_failed_copy_rolls_back() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        fx.write("alpha", "SKILL.md", "live edit");
        fx.write("alpha", "sub/extra.txt", "keep me");

        let failing = |src: &Path, dest: &Path| -> Result<usize, SnapError> {
            copy_dir_all(src, dest)?;
            Err(SnapError::backend("disk full"))
        };
        let err = restore_with(&fx.ws, "alpha", "v1", &failing).unwrap_err();
        assert!(err.is_backend());

        assert_eq!(fx.read("alpha", "SKILL.md"), "live edit");
        assert_eq!(fx.read("alpha", "sub/extra.txt"), "keep me");
        assert_eq!(entries(fx.ws.layout().skills_dir()), vec!["alpha"]);
        assert!(!fx.ws.lock().is_held());
    }

    #[test]
    fn test_lock_release_failure_keeps_restore_result() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        fx.write("alpha", "SKILL.md", "live edit");

        let lock_path = fx.ws.lock().path().to_path_buf();
        let jam_lock = move |src: &Path, dest: &Path| -> Result<usize, SnapError> {
            fs::remove_file(&lock_path)?;
            fs::create_dir(&lock_path)?;
            fs::write(lock_path.join("busy"), "x")?;
            copy_dir_all(src, dest)
        };
        let result = restore_with(&fx.ws, "alpha", "v1", &jam_lock).unwrap();
        assert_eq!(result.tag, VersionTag::new("alpha", 1));
        assert_eq!(fx.read("alpha", "SKILL.md"), "v1");
    }

    #[test]
    fn test_backup_path_is_unique() {
        let fx = Fixture::new();
        let dest = fx.tree("alpha");
        let first = backup_path(&dest).unwrap();
        fs::create_dir_all(&first).unwrap();
        let second = backup_path(&dest).unwrap();
        assert_ne!(first, second);
        assert!(second
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("alpha.bak."));
    }
}
