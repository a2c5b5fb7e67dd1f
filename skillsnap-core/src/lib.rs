//! skillsnap core library
//!
//! Versions named directory trees ("skills") as `<tree>/v<N>` tags in a git
//! repository, skipping unchanged trees through a persisted hash cache.
//!
//! # Architecture
//!
//! - `types`: configuration, version tags, fingerprints, errors, outcomes
//! - `ops`: save, backup-all, restore, delete, diff, list, scan, status, init
//! - `helpers`: hashing, ignore rules, hash cache, lock, snapshot backends
//!
//! Every operation runs against a [`Workspace`], which owns the resolved
//! [`EngineConfig`] and a [`SnapshotBackend`]. Mutating operations hold the
//! repository lock for their whole duration and fail fast if it is taken.

pub mod types;
pub mod ops;
pub mod helpers;

// Re-export commonly used types at crate root
pub use types::{
    BatchFailure,
    BatchReport,
    CacheRecord,
    EngineConfig,
    ErrorKind,
    FileFingerprint,
    FingerprintSet,
    NoSnapshotReason,
    SaveOutcome,
    SnapConfig,
    SnapError,
    TagEntry,
    VersionTag,
};
pub use types::{
    CACHE_VERSION, COMMAND_TIMEOUT, DEFAULT_BRANCH, ENV_REMOTE, ENV_REPO_DIR, ENV_SKILLS_DIR,
    LOCK_STALE_AFTER, MAX_TREE_BYTES, SELF_NAME,
};

// Re-export operations at crate root
pub use ops::{Workspace, SaveOptions, save, backup_all, BackupEvent};
pub use ops::{restore, restore_with, RestoreResult, delete, DeleteResult};
pub use ops::{diff, DiffEntry, DiffReport, list, SnapshotEntry, scan, ScanEntry, SkipReason};
pub use ops::{status, StatusReport, init, InitResult, rebuild_cache, clear_cache, ClearResult};
pub use ops::{has_changes, next_version};

// Re-export backend types
pub use helpers::backend::{InitAction, RepoState, SnapshotBackend};
pub use helpers::git_backend::GitBackend;
pub use helpers::memory::MemoryBackend;
pub use helpers::ignore::IgnoreRules;
