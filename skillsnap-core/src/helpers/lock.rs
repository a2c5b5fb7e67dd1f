//! Repository lock.
//!
//! Advisory, single-machine mutual exclusion between invocations. The lock
//! is a small text file holding `<pid>\n<rfc3339 timestamp>`; its presence
//! and mtime age are the whole protocol. Acquisition never waits.

use fs_err as fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::SnapError;

/// Holder information read back from a lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    /// Process id of the holder, if parseable.
    pub pid: Option<u32>,
    /// Acquisition timestamp as written.
    pub acquired_at: Option<String>,
}

/// Filesystem lock for one repository root.
#[derive(Debug, Clone)]
pub struct RepoLock {
    path: PathBuf,
    stale_after: Duration,
}

impl RepoLock {
    /// Create a lock at `path` that is reclaimable after `stale_after`.
    pub fn new(path: impl Into<PathBuf>, stale_after: Duration) -> Self {
        Self {
            path: path.into(),
            stale_after,
        }
    }

    /// Path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to take the lock without blocking.
    ///
    /// Returns `Ok(false)` when a live lock exists. A lock older than the
    /// staleness threshold is deleted and replaced.
    pub fn try_acquire(&self) -> Result<bool, SnapError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.age() {
            Some(age) if age > self.stale_after => {
                log::warn!(
                    "reclaiming stale lock {} ({}s old)",
                    self.path.display(),
                    age.as_secs()
                );
                match std::fs::remove_file(&self.path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Some(_) => return Ok(false),
            None if self.path.exists() => return Ok(false),
            None => {}
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        write!(
            file,
            "{}\n{}",
            std::process::id(),
            chrono::Local::now().to_rfc3339()
        )?;
        log::debug!("acquired lock {}", self.path.display());
        Ok(true)
    }

    /// Take the lock or fail with a `Conflict` error.
    ///
    /// The returned guard releases the lock when dropped.
    pub fn acquire(&self) -> Result<LockGuard, SnapError> {
        if self.try_acquire()? {
            Ok(LockGuard { lock: self.clone() })
        } else {
            Err(SnapError::lock_held())
        }
    }

    /// Remove the lock file. Succeeds if it is already gone.
    pub fn release(&self) -> Result<(), SnapError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("released lock {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a lock file is present (stale or not).
    pub fn is_held(&self) -> bool {
        self.path.exists()
    }

    /// Read the holder record, if the file exists.
    pub fn holder(&self) -> Option<LockInfo> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let mut lines = contents.lines();
        let pid = lines.next().and_then(|l| l.trim().parse().ok());
        let acquired_at = lines.next().map(|l| l.trim().to_string());
        Some(LockInfo { pid, acquired_at })
    }

    /// Age of the lock file by mtime. A future mtime counts as zero.
    fn age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO),
        )
    }
}

/// Releases the lock when dropped.
#[derive(Debug)]
pub struct LockGuard {
    lock: RepoLock,
}

impl LockGuard {
    /// Release now, logging a failure instead of returning it.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release() {
            log::warn!("failed to release lock {}: {}", self.lock.path().display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn age_lock(path: &Path, secs: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs))
            .unwrap();
    }

    fn lock_in(temp: &TempDir) -> RepoLock {
        RepoLock::new(temp.path().join(".snapshot.lock"), Duration::from_secs(600))
    }

    #[test]
    fn test_acquire_and_release() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);

        assert!(lock.try_acquire().unwrap());
        assert!(!lock.try_acquire().unwrap());

        let info = lock.holder().unwrap();
        assert_eq!(info.pid, Some(std::process::id()));
        assert!(info.acquired_at.is_some());

        lock.release().unwrap();
        lock.release().unwrap();
        assert!(lock.try_acquire().unwrap());
    }

    #[test]
    fn test_stale_lock_is_reclaimed() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);
        fs::write(lock.path(), "99999\n2020-01-01T00:00:00").unwrap();
        age_lock(lock.path(), 700);

        assert!(lock.try_acquire().unwrap());
        assert_eq!(lock.holder().unwrap().pid, Some(std::process::id()));
    }

    #[test]
    fn test_fresh_lock_blocks() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);
        fs::write(lock.path(), "99999\n2020-01-01T00:00:00").unwrap();
        age_lock(lock.path(), 60);

        assert!(!lock.try_acquire().unwrap());
        assert_eq!(lock.holder().unwrap().pid, Some(99999));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);
        {
            let _guard = lock.acquire().unwrap();
            assert!(lock.is_held());
            let err = lock.acquire().unwrap_err();
            assert!(err.is_conflict());
        }
        assert!(!lock.is_held());
    }

    #[test]
    fn test_guard_explicit_release() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);
        let guard = lock.acquire().unwrap();
        guard.release();
        assert!(!lock.is_held());
    }

    #[test]
    fn test_guard_release_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let lock = lock_in(&temp);
        let guard = lock.acquire().unwrap();
        fs::remove_file(lock.path()).unwrap();
        fs::create_dir(lock.path()).unwrap();
        fs::write(lock.path().join("busy"), "x").unwrap();

        guard.release();
        assert!(lock.is_held());
    }
}
