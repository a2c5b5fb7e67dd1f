//! Directory copy utilities.

use fs_err as fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::helpers::ignore::{walk_tree, IgnoreRules};
use crate::SnapError;

/// Copy the files of `source` that survive `rules` into `dest`.
///
/// `dest` is created if missing; existing files at the same relative paths
/// are overwritten. Returns the number of files copied. Nothing is copied
/// if any kept name is not valid UTF-8.
pub fn copy_filtered(source: &Path, dest: &Path, rules: &IgnoreRules) -> Result<usize, SnapError> {
    fs::create_dir_all(dest)?;
    let files = walk_tree(source, rules)?;
    for file in &files {
        let target = dest.join(&file.rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&file.path, &target)?;
    }
    Ok(files.len())
}

/// Copy every regular file and directory of `source` into `dest`, unfiltered.
///
/// Symlinks are skipped. Returns the number of files copied.
pub fn copy_dir_all(source: &Path, dest: &Path) -> Result<usize, SnapError> {
    fs::create_dir_all(dest)?;
    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(false).min_depth(1) {
        let entry = entry?;
        let rel = match entry.path().strip_prefix(source) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Total size in bytes of the regular files under `root`, ignore rules not applied.
///
/// Unreadable entries are skipped.
pub fn dir_size(root: &Path) -> u64 {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: &Path) -> Result<(), SnapError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
