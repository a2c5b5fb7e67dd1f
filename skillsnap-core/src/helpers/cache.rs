//! Persisted hash cache.
//!
//! One JSON file per tree under `.snapshot_cache/`. A file that is missing,
//! unreadable, malformed or written by another format version is treated as
//! absent; it is never migrated.

use fs_err as fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::types::{CacheRecord, FingerprintSet};
use crate::SnapError;

/// A cache record together with the time its file was last written.
#[derive(Debug, Clone)]
pub struct LoadedCache {
    /// The parsed record.
    pub record: CacheRecord,
    /// Modification time of the cache file, if the platform reports one.
    pub written_at: Option<SystemTime>,
}

/// Hash cache store rooted at a directory.
#[derive(Debug, Clone)]
pub struct HashCache {
    dir: PathBuf,
    version: String,
}

impl HashCache {
    /// Create a store in `dir` accepting only records of `version`.
    pub fn new(dir: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            version: version.into(),
        }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Format version written and accepted.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Cache file of a tree.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Load the record for `name`, or `None` when it is absent or unusable.
    pub fn load(&self, name: &str) -> Option<LoadedCache> {
        let path = self.path(name);
        if !path.exists() {
            return None;
        }

        match self.read(&path) {
            Ok(loaded) if loaded.record.cache_version == self.version => Some(loaded),
            Ok(loaded) => {
                log::debug!(
                    "ignoring cache for '{}': version {} != {}",
                    name,
                    loaded.record.cache_version,
                    self.version
                );
                None
            }
            Err(e) => {
                let corrupt = SnapError::corrupt(format!("{}: {}", path.display(), e));
                log::warn!("ignoring unusable hash cache: {}", corrupt);
                None
            }
        }
    }

    fn read(&self, path: &Path) -> Result<LoadedCache, SnapError> {
        let contents = fs::read_to_string(path)?;
        let record: CacheRecord = serde_json::from_str(&contents)?;
        let written_at = fs::metadata(path).ok().and_then(|m| m.modified().ok());
        Ok(LoadedCache { record, written_at })
    }

    /// Overwrite the record for `name` with `files`.
    ///
    /// Written to a temporary sibling first and renamed into place.
    pub fn save(&self, name: &str, files: FingerprintSet) -> Result<CacheRecord, SnapError> {
        fs::create_dir_all(&self.dir)?;
        let record = CacheRecord::new(self.version.clone(), files);
        let json = serde_json::to_string_pretty(&record)?;

        let path = self.path(name);
        let tmp = self.dir.join(format!(".{}.json.tmp", name));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        log::debug!("wrote hash cache {} ({} files)", path.display(), record.files.len());
        Ok(record)
    }

    /// Delete the record for `name`. Returns whether a file was removed.
    pub fn remove(&self, name: &str) -> Result<bool, SnapError> {
        let path = self.path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the whole cache directory. Returns the number of records removed.
    pub fn clear(&self) -> Result<usize, SnapError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let count = self.cached_trees()?.len();
        fs::remove_dir_all(&self.dir)?;
        Ok(count)
    }

    /// Names of the trees with a cache file, sorted.
    pub fn cached_trees(&self) -> Result<Vec<String>, SnapError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
